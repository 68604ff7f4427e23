//! Type-state builder wiring the controller, the intake, and the channels
//! between them. A `GripperBuilder` cannot `build()` until both the sensor
//! and the command interface have been provided.

use crate::adapter::{InterfaceAdapter, PidGains};
use crate::command::CommandRequest;
use crate::config::{ControlSettings, StallSettings};
use crate::controller::{Feedback, GripperController};
use crate::error::{BuildError, Result};
use crate::goal::GoalHandle;
use crate::intake::GoalIntake;
use crate::rt_slot::rt_slot;
use gripper_config::InterfaceKind;
use gripper_traits::clock::Clock;
use gripper_traits::{GoalOutcome, JointCommand, JointSensor, MonotonicClock, ResultSink};
use std::marker::PhantomData;
use std::sync::Arc;

pub struct Missing;
pub struct Set;

/// Capacity of the terminal-notification queue. The intake's retained-handle
/// sweep covers overflow, so this only needs to cover a normal burst.
const DONE_QUEUE_CAP: usize = 16;

type BoxedSensor = Box<dyn JointSensor + Send>;
type BoxedCommand = Box<dyn JointCommand + Send>;

/// Everything `build()` produces: the real-time half and the non-real-time
/// half, plus the clock both sides were seeded from.
pub struct GripperParts {
    pub controller: GripperController<BoxedSensor, BoxedCommand, InterfaceAdapter>,
    pub intake: GoalIntake,
    pub clock: Box<dyn Clock + Send + Sync>,
    pub settings: ControlSettings,
}

// Controller, intake, and clock are trait-object plumbing with no useful
// Debug form of their own.
impl std::fmt::Debug for GripperParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GripperParts")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Builder for the gripper control pair. All fields are validated on
/// `build()`.
pub struct GripperBuilder<S, C> {
    sensor: Option<BoxedSensor>,
    command: Option<BoxedCommand>,
    sink: Option<Box<dyn ResultSink + Send>>,
    control: Option<ControlSettings>,
    stall: Option<StallSettings>,
    gains: Option<PidGains>,
    interface: Option<InterfaceKind>,
    // Optional clock for tests (accept Box here)
    clock: Option<Box<dyn Clock + Send + Sync>>,
    // Type-state markers
    _s: PhantomData<S>,
    _c: PhantomData<C>,
}

impl Default for GripperBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            command: None,
            sink: None,
            control: None,
            stall: None,
            gains: None,
            interface: None,
            clock: None,
            _s: PhantomData,
            _c: PhantomData,
        }
    }
}

impl GripperBuilder<Missing, Missing> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S, C> GripperBuilder<S, C> {
    pub fn with_control(mut self, control: ControlSettings) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_stall(mut self, stall: StallSettings) -> Self {
        self.stall = Some(stall);
        self
    }

    pub fn with_gains(mut self, gains: PidGains) -> Self {
        self.gains = Some(gains);
        self
    }

    pub fn with_interface(mut self, interface: InterfaceKind) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Pull control, stall, gains, and interface settings from a parsed
    /// config in one call.
    pub fn with_config(mut self, cfg: &gripper_config::Config) -> Self {
        self.control = Some(ControlSettings::from(cfg));
        self.stall = Some(StallSettings::from(cfg));
        self.gains = Some(PidGains::from(&cfg.gains));
        self.interface = Some(cfg.joint.interface);
        self
    }

    pub fn with_sink(mut self, sink: impl ResultSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fallible build available in any type-state; returns detailed
    /// BuildError for missing pieces.
    pub fn try_build(self) -> Result<GripperParts> {
        let GripperBuilder {
            sensor,
            command,
            sink,
            control,
            stall,
            gains,
            interface,
            clock,
            _s: _,
            _c: _,
        } = self;

        let mut sensor = sensor.ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let command = command.ok_or_else(|| eyre::Report::new(BuildError::MissingAdapter))?;

        let control = control.unwrap_or_default();
        let stall = stall.unwrap_or_default();
        if !(control.goal_tolerance.is_finite() && control.goal_tolerance > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "goal tolerance must be finite and positive",
            )));
        }
        if control.update_rate_hz == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "update rate must be non-zero",
            )));
        }
        if stall.timeout_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "stall timeout must be non-zero",
            )));
        }

        let adapter = match interface.unwrap_or_default() {
            InterfaceKind::Position => InterfaceAdapter::position(),
            InterfaceKind::Effort => InterfaceAdapter::effort(gains.unwrap_or_default()),
        };
        let sink = sink.unwrap_or_else(|| Box::new(LogSink));
        let clock: Box<dyn Clock + Send + Sync> = match clock {
            Some(b) => b,
            None => Box::new(MonotonicClock::new()),
        };

        // The joint must be readable before anything runs; the initial
        // reading seeds the hold target on both sides.
        let initial = sensor
            .read()
            .map_err(|e| eyre::eyre!("initial joint read failed: {e}"))?;

        let (req_w, req_r) = rt_slot(CommandRequest::hold(
            initial.position,
            control.default_max_effort,
        ));
        let (fb_w, fb_r) = rt_slot(Feedback {
            position: initial.position,
            velocity: initial.velocity,
            ..Feedback::default()
        });
        let (done_tx, done_rx) = crossbeam_channel::bounded::<Arc<GoalHandle>>(DONE_QUEUE_CAP);

        let controller = GripperController::new(
            sensor,
            command,
            adapter,
            req_r,
            fb_w,
            done_tx,
            control,
            stall,
            initial,
            0,
        );
        let intake = GoalIntake::new(req_w, fb_r, done_rx, sink, control, initial.position);

        Ok(GripperParts {
            controller,
            intake,
            clock,
            settings: control,
        })
    }
}

impl<C> GripperBuilder<Missing, C> {
    pub fn with_sensor(self, sensor: impl JointSensor + Send + 'static) -> GripperBuilder<Set, C> {
        GripperBuilder {
            sensor: Some(Box::new(sensor)),
            command: self.command,
            sink: self.sink,
            control: self.control,
            stall: self.stall,
            gains: self.gains,
            interface: self.interface,
            clock: self.clock,
            _s: PhantomData,
            _c: PhantomData,
        }
    }
}

impl<S> GripperBuilder<S, Missing> {
    pub fn with_command(
        self,
        command: impl JointCommand + Send + 'static,
    ) -> GripperBuilder<S, Set> {
        GripperBuilder {
            sensor: self.sensor,
            command: Some(Box::new(command)),
            sink: self.sink,
            control: self.control,
            stall: self.stall,
            gains: self.gains,
            interface: self.interface,
            clock: self.clock,
            _s: PhantomData,
            _c: PhantomData,
        }
    }
}

impl GripperBuilder<Set, Set> {
    /// Infallible-typestate build: both halves of the joint are present.
    pub fn build(self) -> Result<GripperParts> {
        self.try_build()
    }
}

/// Default sink when no transport is attached: outcomes go to the log.
struct LogSink;

impl ResultSink for LogSink {
    fn notify(&mut self, outcome: GoalOutcome) {
        tracing::info!(
            id = outcome.id,
            status = ?outcome.status,
            position = outcome.position,
            stalled = outcome.stalled,
            "goal outcome (no sink attached)"
        );
    }
}
