//! Human-readable error descriptions and structured JSON error formatting.

use gripper_core::{BuildError, GoalError};

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No joint sensor was provided to the controller.\nLikely causes: The joint failed to initialize or was not wired into the builder.\nHow to fix: Ensure the joint is created successfully and passed via with_sensor(...).".to_string()
            }
            BuildError::MissingAdapter => {
                "What happened: No command interface was provided to the controller.\nLikely causes: The joint's command half was not wired into the builder.\nHow to fix: Pass the command half via with_command(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GoalError>() {
        return match ge {
            GoalError::NonFinitePosition => {
                "What happened: The goal was rejected before execution.\nLikely causes: Target position is NaN or infinite.\nHow to fix: Pass a finite value for --position.".to_string()
            }
            GoalError::NonFiniteEffort => {
                "What happened: The goal was rejected before execution.\nLikely causes: Max effort is NaN or infinite.\nHow to fix: Pass a finite value for --max-effort.".to_string()
            }
            GoalError::NotEngaged => {
                "What happened: The controller is not engaged.\nLikely causes: The controller was shut down or never activated.\nHow to fix: Restart the controller, then resubmit the goal.".to_string()
            }
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") || lower.contains("parse config") {
        return format!(
            "What happened: The config file could not be loaded.\nLikely causes: Wrong --config path or malformed TOML.\nHow to fix: Check the path and the file contents. Original: {msg}"
        );
    }

    if lower.contains("invalid config") {
        return format!(
            "What happened: The config file has an out-of-range value.\nHow to fix: Edit the named parameter, then rerun. Original: {msg}"
        );
    }

    if lower.contains("initial joint read") {
        return "What happened: The joint could not be read at startup.\nLikely causes: Hardware not powered, not connected, or faulted.\nHow to fix: Check the joint hardware, then rerun.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: build/config problems 2, goal rejections 3, other 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if err.downcast_ref::<GoalError>().is_some() {
        return 3;
    }
    // Config load/validation errors surface as plain messages.
    if err.to_string().to_ascii_lowercase().contains("config") {
        return 2;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if let Some(be) = err.downcast_ref::<BuildError>() {
        match be {
            BuildError::MissingSensor => "MissingSensor",
            BuildError::MissingAdapter => "MissingAdapter",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        }
    } else if let Some(ge) = err.downcast_ref::<GoalError>() {
        match ge {
            GoalError::NonFinitePosition => "NonFinitePosition",
            GoalError::NonFiniteEffort => "NonFiniteEffort",
            GoalError::NotEngaged => "NotEngaged",
        }
    } else {
        "Error"
    };

    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
