//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_with_stdin(data_dir, args, "")
}

fn run_cli_with_stdin(data_dir: &Path, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_quarterfocus"))
        .args(args)
        .env("QUARTERFOCUS_DATA_DIR", data_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait for CLI");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_info_encode() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        dir.path(),
        &[
            "info", "encode", "--note", "call first", "--done", "book room", "--subtask",
            "send invites",
        ],
    );
    assert_eq!(code, 0, "Info encode failed");
    assert_eq!(
        stdout.trim_end(),
        "call first\n- [x] book room\n- [ ] send invites"
    );
}

#[test]
fn test_info_decode_argument() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["info", "decode", "note\n- [x] a\n- b"]);
    assert_eq!(code, 0, "Info decode failed");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["notes"], serde_json::json!(["note"]));
    assert_eq!(parsed["subtasks"][0]["text"], "a");
    assert_eq!(parsed["subtasks"][0]["completed"], true);
    assert_eq!(parsed["subtasks"][1]["text"], "b");
    assert_eq!(parsed["subtasks"][1]["completed"], false);
}

#[test]
fn test_info_decode_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli_with_stdin(dir.path(), &["info", "decode"], "- [ ] only\n");
    assert_eq!(code, 0, "Info decode from stdin failed");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["notes"], serde_json::json!([]));
    assert_eq!(parsed["subtasks"][0]["text"], "only");
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.focus_minutes", "40"]);
    assert_eq!(code, 0, "Config set failed");

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "timer.focus_minutes"]);
    assert_eq!(code, 0, "Config get failed");
    assert_eq!(stdout.trim(), "40");
}

#[test]
fn test_config_set_rejects_zero_length() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "timer.focus_minutes", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));
}

#[test]
fn test_config_get_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "ui.dark_mode"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_list() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0, "Config list failed");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["timer"]["focus_minutes"], 25);
    assert_eq!(parsed["timer"]["short_break_minutes"], 5);
}

#[test]
fn test_timer_status_uses_saved_preferences() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["config", "set", "timer.focus_minutes", "30"]);

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0, "Timer status failed");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["preferences"]["focus_minutes"], 30);
    assert_eq!(parsed["snapshot"]["remaining_secs"], 30 * 60);
    assert_eq!(parsed["snapshot"]["running"], false);
}

#[test]
fn test_timer_run_quits_on_q() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli_with_stdin(dir.path(), &["timer", "run", "--focus", "1"], "q\n");
    assert_eq!(code, 0, "Timer run failed");
    assert!(stdout.contains("\"type\":\"StateSnapshot\""));
}

#[test]
fn test_stats_today_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["stats", "today", "--short"]);
    assert_eq!(code, 0, "Stats today failed");
    assert!(stdout.contains("0 pomodoros"));
}
