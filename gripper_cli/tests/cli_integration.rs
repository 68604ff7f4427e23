//! End-to-end CLI tests against the simulated joint.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("gripper.toml");
    let toml = r#"
        [joint]
        name = "sim_jaw"
        interface = "position"

        [control]
        goal_tolerance = 0.01
        default_max_effort = 20.0
        update_rate_hz = 100
        action_monitor_rate_hz = 50

        [stall]
        velocity_threshold = 0.001
        timeout_ms = 500
    "#;
    std::fs::write(&path, toml).expect("write config");
    path
}

fn gripper() -> Command {
    Command::cargo_bin("gripper_cli").expect("binary")
}

#[test]
fn grip_reaches_the_target_and_reports_success() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = write_config(&dir);
    gripper()
        .args(["--config"])
        .arg(&cfg)
        .args(["grip", "--position", "0.0", "--start", "0.02"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("succeeded"));
}

#[test]
fn grip_json_output_is_machine_readable() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = write_config(&dir);
    let out = gripper()
        .args(["--config"])
        .arg(&cfg)
        .args(["--json", "grip", "--position", "0.0", "--start", "0.02"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let line = String::from_utf8(out).expect("utf8");
    let v: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(v["status"], "succeeded");
    assert_eq!(v["stalled"], false);
    assert!(v["position"].as_f64().expect("number").abs() < 0.01);
}

#[test]
fn obstructed_grip_succeeds_with_stalled_set() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = write_config(&dir);
    let out = gripper()
        .args(["--config"])
        .arg(&cfg)
        .args([
            "--json",
            "grip",
            "--position",
            "0.0",
            "--start",
            "0.03",
            "--obstruction",
            "0.02",
        ])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value =
        serde_json::from_str(String::from_utf8(out).expect("utf8").trim()).expect("json");
    assert_eq!(v["status"], "succeeded");
    assert_eq!(v["stalled"], true);
}

#[test]
fn timed_out_grip_is_canceled_and_exits_5() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = write_config(&dir);
    gripper()
        .args(["--config"])
        .arg(&cfg)
        .args([
            "grip",
            "--position",
            "0.0",
            "--start",
            "0.08",
            "--timeout-ms",
            "100",
        ])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(5)
        .stdout(predicate::str::contains("canceled"));
}

#[test]
fn non_finite_target_is_rejected_with_exit_3() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = write_config(&dir);
    gripper()
        .args(["--config"])
        .arg(&cfg)
        .args(["--json", "grip", "--position", "NaN"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("NonFinitePosition"));
}

#[test]
fn non_finite_effort_is_rejected_with_exit_3() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = write_config(&dir);
    gripper()
        .args(["--config"])
        .arg(&cfg)
        .args(["--json", "grip", "--position", "0.0", "--max-effort", "inf"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("NonFiniteEffort"));
}

#[test]
fn release_opens_the_jaw() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = write_config(&dir);
    gripper()
        .args(["--config"])
        .arg(&cfg)
        .args(["release", "--open", "0.02", "--start", "0.0"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("succeeded"));
}

#[test]
fn missing_config_file_fails_with_a_hint() {
    gripper()
        .args(["--config", "/nonexistent/gripper.toml", "self-check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

#[test]
fn self_check_reports_ok() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = write_config(&dir);
    gripper()
        .args(["--config"])
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn invalid_config_values_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        "[joint]\nname = \"sim_jaw\"\n[control]\nupdate_rate_hz = 0\n",
    )
    .expect("write config");
    gripper()
        .args(["--config"])
        .arg(&path)
        .arg("self-check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("update_rate_hz"));
}
