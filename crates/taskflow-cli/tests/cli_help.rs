use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_run_flags() {
    cargo_bin_cmd!("taskflow")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--outer"))
        .stdout(predicate::str::contains("--middle"))
        .stdout(predicate::str::contains("--inner"))
        .stdout(predicate::str::contains("--sleep"))
        .stdout(predicate::str::contains("--headless"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("taskflow")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
