//! Integration tests for the CLI binary.
//!
//! Exercises argument handling and the checks that run before any remote
//! service is contacted.
//!
//! This test is registered as a [[test]] in the sa-key-rotator-cli crate
//! so that CARGO_BIN_EXE_sa-key-rotator is available.

use std::process::{Command, Output};

fn rotator_binary() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sa-key-rotator"));
    command.env_remove("LOG_LEVEL");
    command
}

fn rotate(extra: &[&str]) -> Output {
    rotator_binary()
        .args([
            "rotate",
            "--service-account",
            "svc@proj.iam.gserviceaccount.com",
            "--bucket",
            "keys",
        ])
        .args(extra)
        .output()
        .expect("failed to execute sa-key-rotator rotate")
}

#[test]
fn cli_responds_to_help() {
    let output = rotator_binary()
        .arg("--help")
        .output()
        .expect("failed to execute sa-key-rotator --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rotate"), "got: {stdout}");
    assert!(stdout.contains("server"), "got: {stdout}");
}

#[test]
fn rotate_help_lists_flags() {
    let output = rotator_binary()
        .args(["rotate", "--help"])
        .output()
        .expect("failed to execute sa-key-rotator rotate --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--name",
        "--service-account",
        "--bucket",
        "--days",
        "--window",
        "--force-create",
        "--force-delete",
    ] {
        assert!(stdout.contains(flag), "missing {flag} in: {stdout}");
    }
    assert!(stdout.contains("[default: 90]"));
    assert!(stdout.contains("[default: 15]"));
    assert!(stdout.contains("[default: sa-key-rotator]"));
}

#[test]
fn cli_responds_to_version() {
    let output = rotator_binary()
        .arg("--version")
        .output()
        .expect("failed to execute sa-key-rotator --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "got: {stdout}");
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = rotator_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute sa-key-rotator");
    assert!(!output.status.success());
}

#[test]
fn rotate_requires_service_account_and_bucket() {
    let output = rotator_binary()
        .args(["rotate", "--bucket", "keys"])
        .output()
        .expect("failed to execute sa-key-rotator");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--service-account"));

    let output = rotator_binary()
        .args(["rotate", "--service-account", "svc@proj.iam.gserviceaccount.com"])
        .output()
        .expect("failed to execute sa-key-rotator");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--bucket"));
}

#[test]
fn rotate_rejects_short_lifetime() {
    let output = rotate(&["--days", "1", "--window", "1"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error: invalid configuration: days cannot be smaller than 2"),
        "got: {stderr}"
    );
}

#[test]
fn rotate_rejects_empty_window() {
    let output = rotate(&["--window", "0"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("window cannot be smaller than 1"), "got: {stderr}");
}

#[test]
fn rotate_rejects_window_not_smaller_than_days() {
    let output = rotate(&["--days", "10", "--window", "10"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("window should be smaller than days"), "got: {stderr}");
}

#[test]
fn rotate_rejects_non_numeric_days() {
    let output = rotate(&["--days", "ninety"]);
    assert!(!output.status.success());
}
