//! Hardware-interface adapters.
//!
//! The control cycle computes a desired position and an effort ceiling; the
//! adapter maps that pair onto whatever command the joint actually accepts.
//! Position-mode hardware takes the position verbatim. Effort-mode hardware
//! runs a PID on position error and clamps the output to the ceiling.

use gripper_traits::JointReading;

/// Maps a (desired position, effort ceiling) pair to the raw command value
/// written to the joint for this cycle.
pub trait HwIfaceAdapter: Send {
    /// `dt_s` is the elapsed time since the previous cycle, in seconds.
    fn compute(&mut self, desired_position: f64, max_effort: f64, reading: JointReading, dt_s: f64)
    -> f64;

    /// Clear any accumulated state when a new goal is installed.
    fn reset(&mut self);
}

/// Pass-through adapter for position-interface joints. The commanded value
/// is the desired position itself; the effort ceiling is reported back as
/// the applied effort.
#[derive(Debug, Default)]
pub struct PositionInterface;

impl HwIfaceAdapter for PositionInterface {
    fn compute(
        &mut self,
        desired_position: f64,
        _max_effort: f64,
        _reading: JointReading,
        _dt_s: f64,
    ) -> f64 {
        desired_position
    }

    fn reset(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    /// Absolute bound on the integral term's contribution; 0 disables it.
    pub i_clamp: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            p: 10.0,
            i: 0.0,
            d: 0.0,
            i_clamp: 0.0,
        }
    }
}

/// PID adapter for effort-interface joints. Output is clamped to
/// `[-|max_effort|, |max_effort|]`, so a zero ceiling commands zero effort.
#[derive(Debug)]
pub struct EffortInterface {
    gains: PidGains,
    integral: f64,
    prev_error: Option<f64>,
}

impl EffortInterface {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            prev_error: None,
        }
    }
}

impl HwIfaceAdapter for EffortInterface {
    fn compute(
        &mut self,
        desired_position: f64,
        max_effort: f64,
        reading: JointReading,
        dt_s: f64,
    ) -> f64 {
        let error = desired_position - reading.position;

        self.integral += error * dt_s;
        let i_clamp = self.gains.i_clamp.abs();
        if i_clamp > 0.0 {
            self.integral = self.integral.clamp(-i_clamp, i_clamp);
        }

        let derivative = match self.prev_error {
            Some(prev) if dt_s > 0.0 => (error - prev) / dt_s,
            _ => 0.0,
        };
        self.prev_error = Some(error);

        let raw =
            self.gains.p * error + self.gains.i * self.integral + self.gains.d * derivative;
        let ceiling = max_effort.abs();
        raw.clamp(-ceiling, ceiling)
    }

    fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}

/// Adapter selected at build time from the configured interface kind.
#[derive(Debug)]
pub enum InterfaceAdapter {
    Position(PositionInterface),
    Effort(EffortInterface),
}

impl InterfaceAdapter {
    pub fn position() -> Self {
        Self::Position(PositionInterface)
    }

    pub fn effort(gains: PidGains) -> Self {
        Self::Effort(EffortInterface::new(gains))
    }
}

impl HwIfaceAdapter for InterfaceAdapter {
    fn compute(
        &mut self,
        desired_position: f64,
        max_effort: f64,
        reading: JointReading,
        dt_s: f64,
    ) -> f64 {
        match self {
            Self::Position(a) => a.compute(desired_position, max_effort, reading, dt_s),
            Self::Effort(a) => a.compute(desired_position, max_effort, reading, dt_s),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Position(a) => a.reset(),
            Self::Effort(a) => a.reset(),
        }
    }
}
