//! Integration tests: CLI smoke tests and scripted interactive sessions.

mod common;

use serde_json::Value;

const ADD_T1: &str = "1\n1\nT1\nC\n0\n100\n2\n1\n";

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"], "");
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: mreg [OPTIONS] [COMMAND]"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_command_prints_version() {
    let result = common::run_cli_case("version_command_prints_version", &["version"], "");
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stdout.starts_with("mreg "),
        "missing version output; log: {}",
        result.log_path.display()
    );
}

#[test]
fn exit_command_returns_success() {
    let result = common::run_cli_case("exit_command_returns_success", &[], "0\n");
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("Main Menu:"));
    assert!(result.stdout.contains("0. Exit\nEnter option: "));
}

#[test]
fn closed_stdin_ends_session_cleanly() {
    let result = common::run_cli_case("closed_stdin_ends_session_cleanly", &["-q"], "5\n");
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("No device selected."));
}

#[test]
fn temperature_measurement_scenario() {
    let input = format!("{ADD_T1}2\n1\n3\n6\n50\n5\n0\n");
    let result = common::run_cli_case("temperature_measurement_scenario", &["-q"], &input);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let out = &result.stdout;
    assert!(out.contains("Start of measurement"));
    assert!(out.contains("Enter current temperature (0 - 100): "));
    assert!(
        out.contains("Current Temperature: 50 C"),
        "log: {}",
        result.log_path.display()
    );
    assert!(out.contains("Name: T1\nUnit: C\nMin Value: 0\nMax Value: 100\nMaterial: Metal\n"));
}

#[test]
fn advanced_device_inactive_measurement() {
    let input = "1\n2\nA1\nC\n0\n100\n1\n1\n0.5\n6\n0\n";
    let result = common::run_cli_case("advanced_device_inactive_measurement", &["-q"], input);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("Device is not ACTIVE!!!"));
    assert!(result.stdout.contains("Calibration Offset: 0.5"));
    assert!(!result.stdout.contains("Applying calibration offset"));
}

#[test]
fn strict_range_config_rejects_inverted_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[session]\nstrict_range = true\n").unwrap();

    let input = "1\n1\nT1\nC\n10\n5\n50\n1\n1\n5\n0\n";
    let result = common::run_cli_case(
        "strict_range_config_rejects_inverted_bounds",
        &["-q", "--config", config_path.to_str().unwrap()],
        input,
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result
            .stdout
            .contains("Max value must not be less than min value.")
    );
    assert!(result.stdout.contains("Max Value: 50"));
}

#[test]
fn missing_explicit_config_fails_with_user_error() {
    let result = common::run_cli_case(
        "missing_explicit_config_fails_with_user_error",
        &["--config", "/nonexistent/mreg/config.toml"],
        "0\n",
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("MREG-1002"));
}

#[test]
fn activity_log_written_to_requested_path() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("activity.jsonl");
    let input = format!("{ADD_T1}3\n0\n");

    let result = common::run_cli_case(
        "activity_log_written_to_requested_path",
        &["-q", "--log", log_path.to_str().unwrap()],
        &input,
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let contents = std::fs::read_to_string(&log_path).unwrap();
    let events: Vec<Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.first().unwrap()["event"], "session_start");
    assert!(events.iter().any(|e| e["event"] == "device_added"
        && e["device_name"] == "T1"
        && e["device_kind"] == "temperature"));
    assert_eq!(events.last().unwrap()["event"], "session_stop");
}

#[test]
fn config_show_json_reports_defaults() {
    let result = common::run_cli_case(
        "config_show_json_reports_defaults",
        &["config", "show", "--json"],
        "",
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload: Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(payload["command"], "config show");
    assert_eq!(payload["config"]["session"]["strict_range"], false);
    assert_eq!(payload["config"]["logging"]["level"], "info");
}
