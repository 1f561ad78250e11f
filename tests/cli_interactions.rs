//! Command-line and environment interaction tests

mod common;

use assert_cmd::assert::OutputAssertExt;
use common::{closed_port, csv_lines, klt, Behaviour, MockServer};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_help_lists_every_option() {
    let dir = TempDir::new().unwrap();

    let mut assert = klt(dir.path()).arg("--help").assert().success();
    for flag in [
        "--redis-host",
        "--redis-port",
        "--redis-password",
        "--writes",
        "--clients",
        "--rate-limit",
        "--logfile",
        "--out-file",
        "--min-retry-backoff-ms",
        "--max-retry-backoff-ms",
        "--max-retries",
        "--dial-timeout-ms",
        "--read-timeout-ms",
        "--log-level",
        "--log-format",
        "REDIS_SERVER",
        "REDIS_RATE_LIMIT",
    ] {
        assert = assert.stdout(predicate::str::contains(flag));
    }
}

#[test]
fn test_help_hides_password_from_environment() {
    let dir = TempDir::new().unwrap();

    klt(dir.path())
        .env("REDIS_PASSWORD", "do-not-print")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("do-not-print").not());
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();

    klt(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_rejects_malformed_arguments() {
    let dir = TempDir::new().unwrap();

    for args in [
        vec!["-c", "0"],
        vec!["-r", "0"],
        vec!["-w", "-5"],
        vec!["-p", "99999"],
        vec!["--dial-timeout-ms", "0"],
        vec!["--log-level", "chatty"],
        vec!["--log-format", "yaml"],
        vec!["--no-such-flag"],
    ] {
        klt(dir.path())
            .args(&args)
            .assert()
            .failure()
            .code(2);
    }

    // Nothing ran, so no result file
    assert!(!dir.path().join("results.csv").exists());
}

#[test]
fn test_inverted_backoff_is_config_error() {
    let dir = TempDir::new().unwrap();

    klt(dir.path())
        .args(["--min-retry-backoff-ms", "100", "--max-retry-backoff-ms", "10"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("[CONFIG]"));
}

#[test]
fn test_environment_configures_run() {
    let server = MockServer::start(Behaviour::Healthy);
    let dir = TempDir::new().unwrap();

    klt(dir.path())
        .env("REDIS_SERVER", "127.0.0.1")
        .env("REDIS_PORT", server.port.to_string())
        .env("REDIS_WRITES", "4")
        .env("REDIS_CLIENTS", "2")
        .env("REDIS_OUTFILE", "from-env.csv")
        .assert()
        .success();

    assert_eq!(csv_lines(&dir.path().join("from-env.csv")).len(), 5);
    assert_eq!(server.pings(), 4);
}

#[test]
fn test_flags_override_environment() {
    let server = MockServer::start(Behaviour::Healthy);
    let dir = TempDir::new().unwrap();

    klt(dir.path())
        .env("REDIS_SERVER", "127.0.0.1")
        .env("REDIS_PORT", closed_port().to_string())
        .env("REDIS_WRITES", "50")
        .args(["-p", &server.port.to_string(), "-w", "3"])
        .assert()
        .success();

    assert_eq!(server.pings(), 3);
}

#[test]
fn test_dotenv_file_in_working_directory() {
    let server = MockServer::start(Behaviour::Healthy);
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".env"),
        format!(
            "REDIS_SERVER=127.0.0.1\nREDIS_PORT={}\nREDIS_WRITES=6\nREDIS_OUTFILE=dotenv.csv\n",
            server.port
        ),
    )
    .unwrap();

    klt(dir.path()).assert().success();

    assert_eq!(csv_lines(&dir.path().join("dotenv.csv")).len(), 7);
}

#[test]
fn test_environment_wins_over_dotenv_file() {
    let server = MockServer::start(Behaviour::Healthy);
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".env"),
        format!("REDIS_SERVER=127.0.0.1\nREDIS_PORT={}\nREDIS_WRITES=9\n", server.port),
    )
    .unwrap();

    klt(dir.path()).env("REDIS_WRITES", "2").assert().success();

    assert_eq!(server.pings(), 2);
}

#[test]
fn test_unresolvable_host_fails_with_dns_error() {
    let dir = TempDir::new().unwrap();

    klt(dir.path())
        .args(["-s", "no-such-host.invalid", "-w", "2"])
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("[DNS]"));

    assert_eq!(csv_lines(&dir.path().join("results.csv")).len(), 1);
}
