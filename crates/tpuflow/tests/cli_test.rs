#![allow(deprecated)] // cargo_bin is deprecated in newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// `tpu` isolated from the operator's home and gcloud
fn tpu(home: &TempDir) -> Command {
    tpu_with_config(home, &home.path().join("missing.json"))
}

fn tpu_with_config(home: &TempDir, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tpu").unwrap();
    cmd.env("HOME", home.path())
        .env("PATH", home.path())
        .env("NO_COLOR", "1")
        .env_remove("TPUFLOW_CONFIG")
        .env_remove("TPUFLOW_STATE_DIR")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config)
        .arg("--state-dir")
        .arg(home.path().join("state"));
    cmd
}

fn seed_records(home: &TempDir, contents: &str) {
    let state = home.path().join("state");
    fs::create_dir_all(&state).unwrap();
    fs::write(state.join("cache.json"), contents).unwrap();
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("tpu").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("restart"))
        .stdout(predicate::str::contains("stop"))
        .stdout(predicate::str::contains("reinstall"))
        .stdout(predicate::str::contains("cleanup-ssh-hosts"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("tpu").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tpuflow"));
}

#[test]
fn test_version_ignores_broken_config() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.json");
    fs::write(&config, "{ not json").unwrap();

    tpu_with_config(&home, &config)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tpuflow"));
}

#[test]
fn test_create_help_shows_defaults() {
    let mut cmd = Command::cargo_bin("tpu").unwrap();
    cmd.args(["create", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v5litepod-8"))
        .stdout(predicate::str::contains("--zone"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("tpu").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

#[test]
fn test_reinstall_requires_name() {
    let mut cmd = Command::cargo_bin("tpu").unwrap();
    cmd.arg("reinstall").assert().failure();
}

#[test]
fn test_ls_empty() {
    let home = TempDir::new().unwrap();
    tpu(&home)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("No TPU VM recorded"));
}

#[test]
fn test_ls_shows_records_in_order() {
    let home = TempDir::new().unwrap();
    seed_records(
        &home,
        r#"{
  "tpu-vm-us-east5-a": {"type": "v5litepod-8", "zone": "us-east5-a"},
  "tpu-vm-europe-west4-b": {"type": "v5litepod-16", "zone": "europe-west4-b"}
}"#,
    );

    let output = tpu(&home).arg("ls").assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();

    assert!(stdout.contains("v5litepod-16"));
    let first = stdout.find("tpu-vm-us-east5-a").unwrap();
    let second = stdout.find("tpu-vm-europe-west4-b").unwrap();
    assert!(first < second);
}

#[test]
fn test_rm_unknown_name_is_not_an_error() {
    let home = TempDir::new().unwrap();
    tpu(&home)
        .args(["rm", "tpu-vm-nowhere"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not in the record table"));
}

#[test]
fn test_stop_unknown_name_fails() {
    let home = TempDir::new().unwrap();
    tpu(&home)
        .args(["stop", "tpu-vm-nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tpu-vm-nowhere"));
}

#[test]
fn test_stop_with_empty_records() {
    let home = TempDir::new().unwrap();
    tpu(&home)
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("No running TPU VM"));
}

#[test]
fn test_create_without_setup_script_fails_early() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.json");
    fs::write(
        &config,
        format!(
            r#"{{"setup_script": "{}"}}"#,
            home.path().join("absent.sh").display()
        ),
    )
    .unwrap();

    tpu_with_config(&home, &config)
        .args(["create", "--zone", "us-east5-a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.sh"));

    assert!(!home.path().join("state").join("cache.json").exists());
}

#[test]
fn test_print_config_defaults() {
    let home = TempDir::new().unwrap();
    tpu(&home)
        .arg("print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("tpu_name_prefix"))
        .stdout(predicate::str::contains("tpu-vm-"))
        .stdout(predicate::str::contains("cache.json"))
        .stdout(predicate::str::contains("known_hosts"));
}

#[test]
fn test_print_config_from_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.json");
    fs::write(&config, r#"{"tpu_name_prefix": "scratch-"}"#).unwrap();

    tpu_with_config(&home, &config)
        .arg("print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("scratch-"))
        .stdout(predicate::str::contains("config.json"));
}

#[test]
fn test_invalid_config_fails() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.json");
    fs::write(&config, "{ not json").unwrap();

    tpu_with_config(&home, &config)
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn test_corrupt_records_fail() {
    let home = TempDir::new().unwrap();
    seed_records(&home, "[1, 2");

    tpu(&home)
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cache.json"));
}
