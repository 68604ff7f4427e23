//! Goal identity, status lifecycle, and the pre-allocated result cell.
//!
//! A goal's status moves `Active -> {Succeeded, Canceled, Aborted}` exactly
//! once, via compare-exchange, so the control cycle and the intake can race
//! on termination without ever producing two terminal transitions. Result
//! fields are plain atomics mutated in place; nothing on the goal is
//! allocated after intake accepts the request.

use gripper_traits::{GoalOutcome, TerminalStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

/// Opaque correlation token issued at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GoalId(pub u64);

impl std::fmt::Display for GoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "goal#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GoalStatus {
    Active = 0,
    Succeeded = 1,
    Canceled = 2,
    Aborted = 3,
}

/// Interim status word: the terminal race has been won but the result cell
/// is still being filled. Observers treat it as `Active`; a terminal status
/// is only published after the results are in place.
const FINISHING: u8 = 4;

impl GoalStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Succeeded,
            2 => Self::Canceled,
            3 => Self::Aborted,
            _ => Self::Active,
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(self) -> bool {
        self != Self::Active
    }

    pub fn terminal(self) -> Option<TerminalStatus> {
        match self {
            Self::Active => None,
            Self::Succeeded => Some(TerminalStatus::Succeeded),
            Self::Canceled => Some(TerminalStatus::Canceled),
            Self::Aborted => Some(TerminalStatus::Aborted),
        }
    }
}

/// Shared handle for one accepted goal.
///
/// The intake retains a clone until the terminal notification has been
/// dispatched; the control cycle holds a clone only while the goal is
/// active. Status and result fields are the only mutable state.
pub struct GoalHandle {
    id: GoalId,
    status: AtomicU8,
    // Result cell, reused in place; f64 fields stored as bit patterns.
    result_position: AtomicU64,
    result_effort: AtomicU64,
    result_stalled: AtomicBool,
    // Set once the outcome has been handed to the transport.
    dispatched: AtomicBool,
}

impl GoalHandle {
    pub(crate) fn new(id: GoalId) -> Arc<Self> {
        Arc::new(Self {
            id,
            status: AtomicU8::new(GoalStatus::Active as u8),
            result_position: AtomicU64::new(0.0_f64.to_bits()),
            result_effort: AtomicU64::new(0.0_f64.to_bits()),
            result_stalled: AtomicBool::new(false),
            dispatched: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> GoalId {
        self.id
    }

    pub fn status(&self) -> GoalStatus {
        GoalStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.status() == GoalStatus::Active
    }

    /// Terminal transition: win the status race first, then fill the result
    /// cell. Returns true only for the winning caller; duplicate
    /// classifications lose the compare-exchange and change nothing, result
    /// fields included. Never blocks or allocates; safe from the control
    /// cycle.
    pub(crate) fn finish(
        &self,
        status: GoalStatus,
        position: f64,
        effort: f64,
        stalled: bool,
    ) -> bool {
        debug_assert!(status.is_terminal());
        // Two-step transition Active -> FINISHING -> terminal: a loser exits
        // here without ever touching the result cell, and a terminal status
        // is never observable before the results it publishes.
        if self
            .status
            .compare_exchange(
                GoalStatus::Active as u8,
                FINISHING,
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_err()
        {
            return false;
        }
        self.result_position
            .store(position.to_bits(), Ordering::Relaxed);
        self.result_effort.store(effort.to_bits(), Ordering::Relaxed);
        self.result_stalled.store(stalled, Ordering::Relaxed);
        // Release publishes the result stores above.
        self.status.store(status as u8, Ordering::Release);
        true
    }

    /// Consume the terminal outcome for dispatch, at most once per goal.
    ///
    /// Returns `None` while the goal is active or once already dispatched.
    pub fn take_outcome(&self) -> Option<GoalOutcome> {
        let status = self.status().terminal()?;
        if self.dispatched.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(GoalOutcome {
            id: self.id.0,
            status,
            position: f64::from_bits(self.result_position.load(Ordering::Relaxed)),
            effort: f64::from_bits(self.result_effort.load(Ordering::Relaxed)),
            stalled: self.result_stalled.load(Ordering::Relaxed),
        })
    }
}

impl std::fmt::Debug for GoalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoalHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}
