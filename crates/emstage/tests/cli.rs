//! Smoke tests for the `emstage` binary surface.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin for tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_flags() {
    Command::cargo_bin("emstage")
        .expect("Failed to find emstage binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--out-dir"))
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn test_version() {
    Command::cargo_bin("emstage")
        .expect("Failed to find emstage binary")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_flag_fails() {
    Command::cargo_bin("emstage")
        .expect("Failed to find emstage binary")
        .arg("--no-such-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn test_invalid_port_fails() {
    Command::cargo_bin("emstage")
        .expect("Failed to find emstage binary")
        .args(["--port", "99999"])
        .assert()
        .failure();
}
