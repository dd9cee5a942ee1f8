//! CLI argument handling.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_modes_and_flags() {
    let mut cmd = Command::cargo_bin("quill").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("coding agent harness"))
        .stdout(predicate::str::contains("--prompt"))
        .stdout(predicate::str::contains("--agent"))
        .stdout(predicate::str::contains("--mcp-config"))
        .stdout(predicate::str::contains("--no-auto-approve"));
}

#[test]
fn version_flag_works() {
    let mut cmd = Command::cargo_bin("quill").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_flag_is_rejected() {
    let mut cmd = Command::cargo_bin("quill").unwrap();
    cmd.arg("--definitely-not-a-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn nonexistent_directory_fails_at_startup() {
    let mut cmd = Command::cargo_bin("quill").unwrap();
    cmd.env("OPENAI_API_KEY", "sk-test")
        .args(["-d", "/definitely/not/a/real/dir", "-p", "hello"])
        .assert()
        .failure();
}
