//! Gripper CLI: drive the simulated jaw to a target, open it, or self-check.
//!
//! Exit codes: 0 success (including a stalled grasp), 2 build/config error,
//! 3 goal rejected, 5 goal canceled, 6 goal aborted, 1 anything else.

mod cli;
mod error_fmt;
mod grip;
mod rt;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use eyre::WrapErr;
use gripper_traits::TerminalStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

fn init_logging(args: &Cli, cfg: &gripper_config::Config) -> eyre::Result<()> {
    let level = cfg
        .logging
        .level
        .clone()
        .unwrap_or_else(|| args.log_level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = &cfg.logging.file {
        let path = std::path::Path::new(path);
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gripper.log".to_string());
        let appender = match cfg.logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, file),
            Some("hourly") => tracing_appender::rolling::hourly(dir, file),
            _ => tracing_appender::rolling::never(dir, file),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        // File output is always JSON lines; console formatting is separate.
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(writer)
            .try_init()
            .map_err(|e| eyre::eyre!("tracing init: {e}"))?;
    } else if args.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| eyre::eyre!("tracing init: {e}"))?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| eyre::eyre!("tracing init: {e}"))?;
    }
    Ok(())
}

fn print_outcome(json: bool, outcome: &gripper_traits::GoalOutcome) {
    let status = match outcome.status {
        TerminalStatus::Succeeded => "succeeded",
        TerminalStatus::Canceled => "canceled",
        TerminalStatus::Aborted => "aborted",
    };
    if json {
        let obj = serde_json::json!({
            "goal": outcome.id,
            "status": status,
            "position": outcome.position,
            "effort": outcome.effort,
            "stalled": outcome.stalled,
        });
        println!("{obj}");
    } else if outcome.stalled {
        println!(
            "{status} (stalled: object grasped) at position {:.4}",
            outcome.position
        );
    } else {
        println!("{status} at position {:.4}", outcome.position);
    }
}

fn outcome_exit_code(outcome: &gripper_traits::GoalOutcome) -> i32 {
    match outcome.status {
        TerminalStatus::Succeeded => 0,
        TerminalStatus::Canceled => 5,
        TerminalStatus::Aborted => 6,
    }
}

fn run(args: &Cli, cfg: &gripper_config::Config) -> eyre::Result<i32> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })
        .wrap_err("failed to install Ctrl-C handler")?;
    }

    match &args.cmd {
        Commands::Grip {
            position,
            max_effort,
            timeout_ms,
            start,
            obstruction,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
        } => {
            let params = grip::GripParams {
                position: *position,
                max_effort: *max_effort,
                timeout_ms: *timeout_ms,
                start: *start,
                obstruction: *obstruction,
                rt: *rt,
                rt_prio: *rt_prio,
                rt_lock: *rt_lock,
                rt_cpu: *rt_cpu,
            };
            let outcome = grip::run_grip(cfg, &params, shutdown)?;
            print_outcome(args.json, &outcome);
            Ok(outcome_exit_code(&outcome))
        }
        Commands::Release {
            open,
            start,
            timeout_ms,
        } => {
            let params = grip::GripParams {
                position: *open,
                max_effort: None,
                timeout_ms: *timeout_ms,
                start: *start,
                obstruction: None,
                rt: false,
                rt_prio: None,
                rt_lock: None,
                rt_cpu: None,
            };
            let outcome = grip::run_grip(cfg, &params, shutdown)?;
            print_outcome(args.json, &outcome);
            Ok(outcome_exit_code(&outcome))
        }
        Commands::SelfCheck => {
            grip::self_check(cfg)?;
            if args.json {
                println!("{}", serde_json::json!({ "status": "ok" }));
            } else {
                println!("self-check ok");
            }
            Ok(0)
        }
    }
}

fn main() {
    // Panic reports only; runtime errors go through error_fmt.
    let _ = color_eyre::install();
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);

    let result = gripper_config::load_file(&args.config)
        .and_then(|cfg| {
            init_logging(&args, &cfg)?;
            Ok(cfg)
        })
        .and_then(|cfg| run(&args, &cfg));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            std::process::exit(exit_code_for_error(&err));
        }
    }
}
