//! Goal completion predicates: tolerance check and stall detection.
//!
//! Success is evaluated before stall every cycle, so a reading that both
//! lands inside tolerance and has been stationary past the stall timeout
//! classifies as a plain success.

use crate::config::StallSettings;

/// Strict absolute-error tolerance check. The boundary itself does not
/// succeed: `|observed - target| < tolerance`.
pub fn within_tolerance(observed: f64, target: f64, tolerance: f64) -> bool {
    (observed - target).abs() < tolerance
}

/// Tracks how long the joint has been below the stall velocity threshold.
///
/// Time is carried as milliseconds since an external epoch so the detector
/// itself never touches a clock; the control cycle feeds it timestamps.
#[derive(Debug)]
pub struct StallDetector {
    settings: StallSettings,
    last_movement_ms: u64,
}

impl StallDetector {
    pub fn new(settings: StallSettings, now_ms: u64) -> Self {
        Self {
            settings,
            last_movement_ms: now_ms,
        }
    }

    /// Restart the stall window, e.g. when a new goal is installed.
    pub fn reset(&mut self, now_ms: u64) {
        self.last_movement_ms = now_ms;
    }

    /// Feed one velocity observation; returns true when the joint has been
    /// below the velocity threshold for longer than the stall timeout.
    pub fn observe(&mut self, velocity: f64, now_ms: u64) -> bool {
        if velocity.abs() > self.settings.velocity_threshold {
            self.last_movement_ms = now_ms;
            return false;
        }
        now_ms.saturating_sub(self.last_movement_ms) > self.settings.timeout_ms
    }
}
