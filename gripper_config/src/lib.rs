#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the gripper command controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Parameter names and defaults follow the controller's declared
//!   parameter set (goal tolerance, stall thresholds, default effort,
//!   update and monitor rates).
use serde::Deserialize;
use std::path::Path;

/// Which hardware command interface the controller drives.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    /// Desired position is forwarded to the joint as-is.
    #[default]
    Position,
    /// Position error is mapped to a clamped effort through a PID.
    Effort,
}

#[derive(Debug, Deserialize)]
pub struct JointCfg {
    /// Controlled joint name (required, non-empty).
    pub name: String,
    /// Command interface kind: "position" or "effort".
    #[serde(default)]
    pub interface: InterfaceKind,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlCfg {
    /// Goal reached when |position error| < goal_tolerance (strict).
    pub goal_tolerance: f64,
    /// Effort used when a goal does not supply one. Taken as absolute value.
    pub default_max_effort: f64,
    /// Control cycle rate in Hz.
    pub update_rate_hz: u32,
    /// Dispatch cadence for terminal notifications, in Hz.
    pub action_monitor_rate_hz: u32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            goal_tolerance: 0.01,
            default_max_effort: 0.0,
            update_rate_hz: 100,
            action_monitor_rate_hz: 20,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StallCfg {
    /// The mechanism counts as moving while |velocity| > this threshold.
    pub velocity_threshold: f64,
    /// Stationary for longer than this, away from the goal, means stalled.
    pub timeout_ms: u64,
}

impl Default for StallCfg {
    fn default() -> Self {
        Self {
            velocity_threshold: 0.001,
            timeout_ms: 1000,
        }
    }
}

/// PID gains for the effort interface. Ignored for the position interface.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct GainsCfg {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    /// Symmetric clamp on the integral term; 0 disables the clamp.
    pub i_clamp: f64,
}

impl Default for GainsCfg {
    fn default() -> Self {
        Self {
            p: 0.0,
            i: 0.0,
            d: 0.0,
            i_clamp: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub joint: JointCfg,
    #[serde(default)]
    pub control: ControlCfg,
    #[serde(default)]
    pub stall: StallCfg,
    #[serde(default)]
    pub gains: GainsCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()
        .map_err(|e| eyre::eyre!("invalid config {:?}: {}", path, e))?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Joint
        if self.joint.name.is_empty() {
            eyre::bail!("joint.name must not be empty");
        }

        // Control
        if !self.control.goal_tolerance.is_finite() || self.control.goal_tolerance == 0.0 {
            eyre::bail!("control.goal_tolerance must be finite and non-zero");
        }
        if !self.control.default_max_effort.is_finite() {
            eyre::bail!("control.default_max_effort must be finite");
        }
        if self.control.update_rate_hz == 0 {
            eyre::bail!("control.update_rate_hz must be > 0");
        }
        if self.control.update_rate_hz > 10_000 {
            eyre::bail!("control.update_rate_hz is unreasonably large (>10kHz)");
        }
        if self.control.action_monitor_rate_hz == 0 {
            eyre::bail!("control.action_monitor_rate_hz must be > 0");
        }

        // Stall
        if !self.stall.velocity_threshold.is_finite() || self.stall.velocity_threshold < 0.0 {
            eyre::bail!("stall.velocity_threshold must be finite and >= 0");
        }
        if self.stall.timeout_ms == 0 {
            eyre::bail!("stall.timeout_ms must be >= 1");
        }
        if self.stall.timeout_ms > 5 * 60 * 1000 {
            eyre::bail!("stall.timeout_ms is unreasonably large (>5min)");
        }

        // Gains
        for (name, v) in [
            ("gains.p", self.gains.p),
            ("gains.i", self.gains.i),
            ("gains.d", self.gains.d),
            ("gains.i_clamp", self.gains.i_clamp),
        ] {
            if !v.is_finite() {
                eyre::bail!("{name} must be finite");
            }
        }
        if self.gains.i_clamp < 0.0 {
            eyre::bail!("gains.i_clamp must be >= 0");
        }

        Ok(())
    }

    /// Tolerance with sign stripped, as the controller consumes it.
    pub fn goal_tolerance_abs(&self) -> f64 {
        self.control.goal_tolerance.abs()
    }

    /// Default effort with sign stripped, as the controller consumes it.
    pub fn default_max_effort_abs(&self) -> f64 {
        self.control.default_max_effort.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let cfg = load_toml("[joint]\nname = \"gripper_joint\"\n").expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg.joint.interface, InterfaceKind::Position);
        assert_eq!(cfg.control.goal_tolerance, 0.01);
        assert_eq!(cfg.control.update_rate_hz, 100);
        assert_eq!(cfg.stall.timeout_ms, 1000);
        assert_eq!(cfg.stall.velocity_threshold, 0.001);
    }

    #[test]
    fn negative_tolerance_is_normalized_via_abs() {
        let cfg = load_toml(
            "[joint]\nname = \"g\"\n[control]\ngoal_tolerance = -0.02\n",
        )
        .expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg.goal_tolerance_abs(), 0.02);
    }

    #[test]
    fn load_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gripper.toml");
        std::fs::write(
            &path,
            "[joint]\nname = \"left_finger\"\ninterface = \"effort\"\n\
             [gains]\np = 25.0\n",
        )
        .expect("write config");
        let cfg = load_file(&path).expect("load");
        assert_eq!(cfg.joint.interface, InterfaceKind::Effort);
        assert_eq!(cfg.gains.p, 25.0);
    }

    #[test]
    fn load_file_reports_missing_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("read config"));
    }

    #[rstest::rstest]
    #[case("[joint]\nname = \"\"\n", "joint.name")]
    #[case("[joint]\nname = \"g\"\n[control]\ngoal_tolerance = 0.0\n", "goal_tolerance")]
    #[case("[joint]\nname = \"g\"\n[control]\nupdate_rate_hz = 0\n", "update_rate_hz")]
    #[case("[joint]\nname = \"g\"\n[stall]\ntimeout_ms = 0\n", "timeout_ms")]
    #[case("[joint]\nname = \"g\"\n[gains]\ni_clamp = -1.0\n", "i_clamp")]
    fn validate_rejects(#[case] text: &str, #[case] needle: &str) {
        let cfg = load_toml(text).expect("parse");
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains(needle), "{err}");
    }
}
