use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::NamedTempFile;

#[test]
fn test_outer_out_of_range_is_rejected() {
    cargo_bin_cmd!("taskflow")
        .args(["--headless", "--outer", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--outer"));
}

#[test]
fn test_sleep_out_of_range_is_rejected() {
    cargo_bin_cmd!("taskflow")
        .args(["--headless", "--sleep", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0.01..=1"));
}

#[test]
fn test_env_var_is_validated() {
    cargo_bin_cmd!("taskflow")
        .arg("--headless")
        .env("TASKFLOW_MIDDLE", "11")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--middle"));
}

#[test]
fn test_config_file_value_out_of_range() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "inner = 50").unwrap();

    cargo_bin_cmd!("taskflow")
        .arg("--headless")
        .arg("--config")
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid configuration"))
        .stderr(predicate::str::contains("inner"));
}

#[test]
fn test_config_file_unknown_key() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "outer = 2\nspeed = 3").unwrap();

    cargo_bin_cmd!("taskflow")
        .arg("--headless")
        .arg("--config")
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown field"));
}

#[test]
fn test_missing_config_file() {
    cargo_bin_cmd!("taskflow")
        .args(["--headless", "--config", "/nonexistent/taskflow.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("read config file"));
}

#[test]
fn test_invalid_probability() {
    cargo_bin_cmd!("taskflow")
        .args(["--headless", "--early-exit-probability", "1.5"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("early_exit_probability"));
}
