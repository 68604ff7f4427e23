//! Grip execution: config mapping, sim joint assembly, goal submission, and
//! outcome collection.

use crate::cli::RtLock;
use crate::rt::setup_rt_once;
use eyre::WrapErr;
use gripper_core::{ControlLoop, GripperBuilder};
use gripper_hardware::SimJoint;
use gripper_traits::{GoalOutcome, ResultSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sink that parks the single outcome for the foreground thread.
#[derive(Default, Clone)]
struct OutcomeCell(Arc<Mutex<Option<GoalOutcome>>>);

impl OutcomeCell {
    fn take(&self) -> Option<GoalOutcome> {
        self.0.lock().ok().and_then(|mut o| o.take())
    }
}

impl ResultSink for OutcomeCell {
    fn notify(&mut self, outcome: GoalOutcome) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(outcome);
        }
    }
}

pub struct GripParams {
    pub position: f64,
    pub max_effort: Option<f64>,
    pub timeout_ms: Option<u64>,
    pub start: f64,
    pub obstruction: Option<f64>,
    pub rt: bool,
    pub rt_prio: Option<i32>,
    pub rt_lock: Option<RtLock>,
    pub rt_cpu: Option<usize>,
}

/// Run one goal to termination on a simulated joint. Ctrl-C (via the
/// shutdown flag) cancels the goal; the jaw holds and the canceled outcome
/// is still reported.
pub fn run_grip(
    cfg: &gripper_config::Config,
    params: &GripParams,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<GoalOutcome> {
    let mode = params.rt_lock.unwrap_or(RtLock::os_default());
    setup_rt_once(params.rt, params.rt_prio, mode, params.rt_cpu);

    let update_rate = cfg.control.update_rate_hz;
    // Jaw slews at 0.1 units/s of simulated time, one step per cycle.
    let joint = SimJoint::new(params.start, 0.1, 1.0 / f64::from(update_rate.max(1)));
    if let Some(at) = params.obstruction {
        joint.handle().set_obstruction(Some(at));
    }
    let (sensor, command) = joint.split();

    let cell = OutcomeCell::default();
    let parts = GripperBuilder::new()
        .with_sensor(sensor)
        .with_command(command)
        .with_sink(cell.clone())
        .with_config(cfg)
        .build()
        .wrap_err("failed to assemble gripper controller")?;

    let settings = parts.settings;
    let mut intake = parts.intake;
    let control_loop = ControlLoop::spawn(
        parts.controller,
        Duration::from_millis(settings.cycle_period_ms()),
        parts.clock,
    );

    let goal = intake.submit(params.position, params.max_effort)?;
    tracing::info!(
        goal = %goal.id(),
        position = params.position,
        joint = %cfg.joint.name,
        "goal submitted"
    );

    let started = Instant::now();
    let deadline = params.timeout_ms.map(Duration::from_millis);
    let monitor = Duration::from_millis(settings.monitor_period_ms());
    let mut cancel_sent = false;
    let outcome = loop {
        intake.dispatch_pending();
        if let Some(out) = cell.take() {
            break out;
        }
        let timed_out = deadline.is_some_and(|d| started.elapsed() >= d);
        if (shutdown.load(Ordering::Relaxed) || timed_out) && !cancel_sent {
            tracing::warn!(goal = %goal.id(), timed_out, "canceling goal");
            let _ = intake.cancel(goal.id());
            cancel_sent = true;
        }
        std::thread::sleep(monitor);
    };

    control_loop.request_stop();
    drop(control_loop);
    Ok(outcome)
}

/// Health check: config already parsed; verify the sim joint round-trips a
/// read and a write.
pub fn self_check(cfg: &gripper_config::Config) -> eyre::Result<()> {
    use gripper_traits::{JointCommand, JointSensor};
    let joint = SimJoint::new(0.04, 0.1, 0.01);
    let (mut sensor, mut command) = joint.split();
    let reading = sensor
        .read()
        .map_err(|e| eyre::eyre!("sim joint read failed: {e}"))?;
    command
        .write(reading.position)
        .map_err(|e| eyre::eyre!("sim joint write failed: {e}"))?;
    tracing::info!(joint = %cfg.joint.name, position = reading.position, "self-check ok");
    Ok(())
}
