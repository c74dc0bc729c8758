//! CLI end-to-end tests

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[allow(deprecated)]
fn liveforged_cmd() -> Command {
    Command::cargo_bin("liveforged").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    liveforged_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    liveforged_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("liveforged"));
}

#[test]
fn test_cli_serve_help() {
    liveforged_cmd()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--variant"));
}

#[test]
fn test_cli_serve_rejects_unknown_variant() {
    liveforged_cmd()
        .args(["serve", "--variant", "dash"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown muxer variant"));
}

#[test]
fn test_cli_validate_defaults() {
    liveforged_cmd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Variant: low_latency"))
        .stdout(predicate::str::contains("api_key"));
}

#[test]
fn test_cli_validate_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("liveforged.json");
    fs::write(
        &path,
        r#"{"muxer": {"variant": "mpeg_ts"}, "ingest": {"api_key": "k"}}"#,
    )
    .unwrap();

    liveforged_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Variant: mpeg_ts"))
        .stdout(predicate::str::contains("Configuration is valid."));
}

#[test]
fn test_cli_validate_malformed_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    liveforged_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config parse error"));
}
