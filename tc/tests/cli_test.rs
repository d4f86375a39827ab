//! CLI smoke tests for the `tc` binary

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_flags() {
    let mut cmd = Command::cargo_bin("tc").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--base-url"))
        .stdout(predicate::str::contains("--no-push"))
        .stdout(predicate::str::contains("--log-level"));
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("tc").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tc"));
}

#[test]
fn test_unknown_flag_is_rejected() {
    let mut cmd = Command::cargo_bin("tc").unwrap();
    cmd.arg("--definitely-not-a-flag").assert().failure();
}
