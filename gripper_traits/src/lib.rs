pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One joint state sample: position and velocity, in joint units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointReading {
    pub position: f64,
    pub velocity: f64,
}

/// Read side of the controlled joint: position and velocity state.
pub trait JointSensor {
    fn read(&mut self) -> Result<JointReading, Box<dyn std::error::Error + Send + Sync>>;
}

/// Write side of the controlled joint: a single command value.
///
/// The meaning of the value (desired position or effort) depends on which
/// interface adapter drives it; see `gripper_core::adapter`.
pub trait JointCommand {
    fn write(&mut self, value: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: JointSensor + ?Sized> JointSensor for Box<T> {
    fn read(&mut self) -> Result<JointReading, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}

impl<T: JointCommand + ?Sized> JointCommand for Box<T> {
    fn write(&mut self, value: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write(value)
    }
}

/// Terminal status of a goal. No transitions occur after reaching one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Succeeded,
    Canceled,
    Aborted,
}

/// Terminal notification for one goal, handed to the transport once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalOutcome {
    /// Correlation token issued at intake.
    pub id: u64,
    pub status: TerminalStatus,
    /// Joint position when the goal terminated.
    pub position: f64,
    /// Effort applied when the goal terminated.
    pub effort: f64,
    /// True when the mechanism stopped moving before reaching tolerance.
    pub stalled: bool,
}

/// Transport egress: receives exactly one `GoalOutcome` per accepted goal.
pub trait ResultSink {
    fn notify(&mut self, outcome: GoalOutcome);
}
