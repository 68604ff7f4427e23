//! Maps `Box<dyn Error>` from trait boundaries to typed `ControllerError`.
//!
//! The traits in `gripper_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error enum,
//! with an optional feature-gated path for `gripper_hardware::HwError`
//! downcasting.

use crate::error::ControllerError;

/// Map a trait-boundary error to a typed `ControllerError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to a generic hardware error.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ControllerError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<gripper_hardware::error::HwError>() {
            return ControllerError::HardwareFault(hw.to_string());
        }
    }

    ControllerError::Hardware(e.to_string())
}
