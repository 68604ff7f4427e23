#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Control core for a single-DOF gripper command executor (hardware-agnostic).
//!
//! A goal (target position, max effort) arrives on a non-real-time thread,
//! is published into a fixed-rate real-time control cycle without locks, and
//! terminates as succeeded, canceled, or aborted; the outcome flows back out
//! without the real-time thread ever blocking on it.
//!
//! ## Architecture
//!
//! - **Command slot**: wait-free single-writer/single-reader triple buffer
//!   (`rt_slot` module) carrying the latest command plus its goal handle
//! - **Goal lifecycle**: atomic status with a compare-exchange terminal
//!   transition and a pre-allocated result cell (`goal` module)
//! - **Completion**: success evaluation and stall detection (`completion`)
//! - **Cycle driver**: per-tick orchestrator (`GripperController`)
//! - **Intake**: goal submission, preemption, cancellation, and terminal
//!   notification dispatch on the non-RT side (`GoalIntake`)
//! - **Adapters**: position pass-through or PID-to-effort mapping between
//!   the desired state and the joint command interface (`adapter`)
//!
//! ## Real-time discipline
//!
//! Nothing on the cycle path blocks, allocates, or propagates errors.
//! Hardware faults are logged and the cycle continues on last-known state.

pub mod adapter;
pub mod builder;
pub mod command;
pub mod completion;
pub mod config;
pub mod controller;
pub mod error;
pub mod goal;
pub mod hw_error;
pub mod intake;
pub mod mocks;
pub mod rt_slot;
pub mod runner;

pub use adapter::{EffortInterface, HwIfaceAdapter, InterfaceAdapter, PidGains, PositionInterface};
pub use builder::{GripperBuilder, GripperParts, Missing, Set};
pub use command::{Command, CommandRequest};
pub use completion::StallDetector;
pub use config::{ControlSettings, StallSettings};
pub use controller::{Feedback, GripperController};
pub use error::{BuildError, ControllerError, GoalError};
pub use goal::{GoalHandle, GoalId, GoalStatus};
pub use intake::{CancelOutcome, GoalIntake};
pub use runner::ControlLoop;
