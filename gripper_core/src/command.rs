//! Command types published from the intake into the control cycle.

use crate::goal::GoalHandle;
use std::sync::Arc;

/// Latest desired target; overwritten wholesale on each new goal or
/// hold-position request. No history is retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub position: f64,
    pub max_effort: f64,
}

impl Command {
    /// Hold-in-place command at the given position.
    pub fn hold(position: f64, max_effort: f64) -> Self {
        Self {
            position,
            max_effort,
        }
    }
}

/// One slot publication: a command and, when a goal drives it, the goal's
/// handle. Publishing both as one value means the control cycle can never
/// observe a new goal with an old command or vice versa.
#[derive(Clone)]
pub struct CommandRequest {
    pub command: Command,
    pub goal: Option<Arc<GoalHandle>>,
}

impl CommandRequest {
    /// A goal-less hold request (initial state, post-cancel state).
    pub fn hold(position: f64, max_effort: f64) -> Self {
        Self {
            command: Command::hold(position, max_effort),
            goal: None,
        }
    }
}
