#![allow(unused)]
//! Binary-level harness: argument handling and process exit statuses.
//!
//! # What this covers
//!
//! - **Usage errors** exit with 2; `--version` exits with 0.
//! - **Terminal codes** become the exit status (missing document → 1).
//! - **Run then read** through the real binary.
//! - **Duplicate instances** exit with 7; run mode records the event, read
//!   mode leaves the mailbox untouched.
//!
//! # What this does NOT cover
//!
//! - Long-running loops (every run here uses `--cycles 1`)
//!
//! # Running
//!
//! ```sh
//! cargo test --test cli_harness
//! ```

mod common;
use common::*;

use std::fs;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use rstest::rstest;

/// The binary, isolated from the user's settings and pid files.
fn logmon(sandbox: &Sandbox) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_logmon"));
    cmd.current_dir(sandbox.root())
        .env("XDG_CONFIG_HOME", sandbox.root())
        .env("LOGMON__GUARD__DIR", sandbox.root())
        .env_remove("RUST_LOG");
    cmd
}

fn status(output: &Output) -> i32 {
    output.status.code().expect("exited normally")
}

fn run_args(sandbox: &Sandbox, config: &str) -> Vec<String> {
    vec![
        "run".into(),
        "--config".into(),
        config.into(),
        "--output".into(),
        sandbox.mailbox().display().to_string(),
        "--offsets".into(),
        sandbox.offsets().display().to_string(),
        "--cycles".into(),
        "1".into(),
        "--interval".into(),
        "0".into(),
    ]
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

#[rstest]
#[case::no_subcommand(&[])]
#[case::unknown_subcommand(&["watch"])]
#[case::unknown_flag(&["run", "--config", "m.yml", "--bogus"])]
#[case::missing_config(&["read"])]
#[case::non_numeric_cycles(&["run", "--config", "m.yml", "--cycles", "many"])]
fn usage_errors_exit_two(#[case] args: &[&str]) {
    let sandbox = Sandbox::new();
    let output = logmon(&sandbox).args(args).output().unwrap();
    assert_eq!(status(&output), 2);
}

#[test]
fn version_flag_succeeds() {
    let sandbox = Sandbox::new();
    let output = logmon(&sandbox).arg("--version").output().unwrap();
    assert_eq!(status(&output), 0);
    assert!(String::from_utf8_lossy(&output.stdout).contains("logmon"));
}

// ---------------------------------------------------------------------------
// Terminal codes
// ---------------------------------------------------------------------------

#[test]
fn missing_document_exits_with_missing_file() {
    let sandbox = Sandbox::new();
    let config = sandbox.path("absent.yml").display().to_string();

    let output = logmon(&sandbox).args(run_args(&sandbox, &config)).output().unwrap();

    assert_eq!(status(&output), 1);
    assert_all_rc(&sandbox.records(), 1);
}

#[test]
fn malformed_settings_exit_with_malformed_document() {
    let sandbox = Sandbox::new();
    let settings = sandbox.write_document("settings.toml", "[run\ninterval_secs = ");
    let config = sandbox.path("m.yml").display().to_string();

    let output = logmon(&sandbox)
        .arg("--settings")
        .arg(&settings)
        .args(run_args(&sandbox, &config))
        .output()
        .unwrap();

    assert_eq!(status(&output), 4);
}

#[test]
fn run_then_read_round_trip() {
    let sandbox = Sandbox::new();
    sandbox.write_lines("app.log", CORPUS_APP);
    let config = sandbox.write_document(
        "monitors.yml",
        &monitor_document(&[SpecBuilder::new("app", sandbox.log_pattern("app.log"))
            .deduplicate(true)
            .pattern("substring", "ERROR")]),
    );
    let format = sandbox.write_document(
        "format.yml",
        &read_format_document("|", &["rc", "logicalname", "message", "actualnumberofhits"]),
    );

    let run = logmon(&sandbox)
        .args(run_args(&sandbox, &config.display().to_string()))
        .output()
        .unwrap();
    assert_eq!(status(&run), 0, "{}", String::from_utf8_lossy(&run.stderr));

    let read = logmon(&sandbox)
        .arg("read")
        .arg("--config")
        .arg(&format)
        .arg("--output")
        .arg(sandbox.mailbox())
        .output()
        .unwrap();
    assert_eq!(status(&read), 0, "{}", String::from_utf8_lossy(&read.stderr));
    assert_eq!(String::from_utf8_lossy(&read.stdout), "0|app|ERROR|2\n");
    assert_unread!(sandbox.records(), 0);
}

// ---------------------------------------------------------------------------
// Single instance
// ---------------------------------------------------------------------------

#[cfg(target_os = "linux")]
#[test]
fn duplicate_run_is_recorded_and_exits_seven() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path("logmon-run.pid"), format!("{}\n", std::process::id())).unwrap();
    let config = sandbox.path("m.yml").display().to_string();

    let output = logmon(&sandbox).args(run_args(&sandbox, &config)).output().unwrap();

    assert_eq!(status(&output), 7);
    assert_all_rc(&sandbox.records(), 7);
}

#[cfg(target_os = "linux")]
#[test]
fn duplicate_read_exits_seven_without_touching_mailbox() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path("logmon-read.pid"), format!("{}\n", std::process::id())).unwrap();
    let format = sandbox.write_document("format.yml", &read_format_document("|", &["rc"]));

    let output = logmon(&sandbox)
        .arg("read")
        .arg("--config")
        .arg(&format)
        .arg("--output")
        .arg(sandbox.mailbox())
        .output()
        .unwrap();

    assert_eq!(status(&output), 7);
    assert!(!sandbox.mailbox().exists());
}
