//! Runtime settings consumed by the controller, derived from the parsed
//! config schema with signs already normalized.

use crate::adapter::PidGains;

#[derive(Debug, Clone, Copy)]
pub struct ControlSettings {
    /// Strict absolute tolerance for goal success.
    pub goal_tolerance: f64,
    /// Effort ceiling applied when a goal does not carry one.
    pub default_max_effort: f64,
    /// Control cycle rate in Hz.
    pub update_rate_hz: u32,
    /// Terminal-notification dispatch cadence in Hz.
    pub action_monitor_rate_hz: u32,
}

impl ControlSettings {
    pub fn cycle_period_ms(&self) -> u64 {
        u64::from((1000 / self.update_rate_hz.max(1)).max(1))
    }

    pub fn cycle_period_s(&self) -> f64 {
        1.0 / f64::from(self.update_rate_hz.max(1))
    }

    pub fn monitor_period_ms(&self) -> u64 {
        u64::from((1000 / self.action_monitor_rate_hz.max(1)).max(1))
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            goal_tolerance: 0.01,
            default_max_effort: 0.0,
            update_rate_hz: 100,
            action_monitor_rate_hz: 20,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StallSettings {
    pub velocity_threshold: f64,
    pub timeout_ms: u64,
}

impl Default for StallSettings {
    fn default() -> Self {
        Self {
            velocity_threshold: 0.001,
            timeout_ms: 1000,
        }
    }
}

impl From<&gripper_config::Config> for ControlSettings {
    fn from(cfg: &gripper_config::Config) -> Self {
        Self {
            goal_tolerance: cfg.goal_tolerance_abs(),
            default_max_effort: cfg.default_max_effort_abs(),
            update_rate_hz: cfg.control.update_rate_hz,
            action_monitor_rate_hz: cfg.control.action_monitor_rate_hz,
        }
    }
}

impl From<&gripper_config::Config> for StallSettings {
    fn from(cfg: &gripper_config::Config) -> Self {
        Self {
            velocity_threshold: cfg.stall.velocity_threshold.abs(),
            timeout_ms: cfg.stall.timeout_ms,
        }
    }
}

impl From<&gripper_config::GainsCfg> for PidGains {
    fn from(g: &gripper_config::GainsCfg) -> Self {
        Self {
            p: g.p,
            i: g.i,
            d: g.d,
            i_clamp: g.i_clamp,
        }
    }
}
