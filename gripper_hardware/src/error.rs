use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("joint state read failed: {0}")]
    StateRead(String),
    #[error("joint command write failed: {0}")]
    CommandWrite(String),
    #[error("joint state not available")]
    NotReady,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
