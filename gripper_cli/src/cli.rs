//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "gripper", version, about = "Gripper command executor CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/gripper.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub fn os_default() -> Self {
        #[cfg(target_os = "linux")]
        {
            return RtLock::Current;
        }
        #[allow(unreachable_code)]
        RtLock::None
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the jaw to a target position and wait for the outcome
    Grip {
        /// Target jaw position in joint units
        #[arg(long)]
        position: f64,
        /// Maximum effort to apply; falls back to control.default_max_effort
        #[arg(long, value_name = "EFFORT")]
        max_effort: Option<f64>,
        /// Give up and cancel the goal after this many milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
        /// Simulated jaw start position
        #[arg(long, value_name = "POS", default_value_t = 0.08)]
        start: f64,
        /// Place a simulated object blocking closure below this position
        #[arg(long, value_name = "POS")]
        obstruction: Option<f64>,
        /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on supported OSes.\n\nLinux: Attempts SCHED_FIFO priority, pins to one CPU, and locks process memory to reduce page faults and control-cycle jitter. May require elevated privileges or raised memlock ulimits."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO on Linux (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Select memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE")]
        rt_lock: Option<RtLock>,
        /// CPU index to pin the process to when --rt is enabled (Linux only)
        #[arg(long, value_name = "CPU")]
        rt_cpu: Option<usize>,
    },
    /// Open the jaw fully (grip toward the open position)
    Release {
        /// Fully-open jaw position
        #[arg(long, value_name = "POS", default_value_t = 0.08)]
        open: f64,
        /// Simulated jaw start position
        #[arg(long, value_name = "POS", default_value_t = 0.0)]
        start: f64,
        /// Give up and cancel the goal after this many milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },
    /// Quick health check (config parses, sim joint readable)
    SelfCheck,
}
