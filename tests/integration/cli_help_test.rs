use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn transit_star() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("transit-star"))
}

#[test]
fn test_help_lists_pipeline_commands() {
    let output = transit_star()
        .arg("--help")
        .output()
        .expect("should run successfully");

    let stdout = std::str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("PIPELINE COMMANDS"));
    for command in ["normalize", "dimensions", "facts", "run", "status", "report"] {
        assert!(stdout.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_version_matches_package() {
    transit_star()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_run_help_documents_format_and_config() {
    let output = transit_star()
        .args(["run", "--help"])
        .output()
        .expect("should run successfully");

    let stdout = std::str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("--format"));
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("transit-star run ./warehouse"));
}

#[test]
fn test_unknown_format_is_rejected() {
    transit_star()
        .args(["status", ".", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("yaml"));
}

#[test]
fn test_missing_input_directory_fails() {
    let dir = TempDir::new().unwrap();
    transit_star()
        .arg("normalize")
        .arg(dir.path())
        .env("TRANSIT_SCHEDULED", "1")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("NORM-001"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    transit_star()
        .arg("status")
        .arg(dir.path())
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .env("TRANSIT_SCHEDULED", "1")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("CFG-001"));
}

#[test]
fn test_status_on_empty_warehouse() {
    let dir = TempDir::new().unwrap();
    transit_star()
        .arg("status")
        .arg(dir.path())
        .env("TRANSIT_SCHEDULED", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("dim_date             missing"));
}
