use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ControllerError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing joint sensor")]
    MissingSensor,
    #[error("missing command interface adapter")]
    MissingAdapter,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

/// Goal intake rejections; returned synchronously, no goal is created.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GoalError {
    #[error("goal position is not finite")]
    NonFinitePosition,
    #[error("goal max effort is not finite")]
    NonFiniteEffort,
    #[error("controller is not engaged")]
    NotEngaged,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
