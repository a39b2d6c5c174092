//! Binary-level tests for the `dispatcher-export` command.
//!
//! None of these reach a broker: each case fails or exits during argument
//! parsing or configuration validation.

use assert_cmd::Command;
use predicates::prelude::*;

const ENV_VARS: &[&str] = &[
    "DISPATCHER_KAFKA_BROKERS",
    "DISPATCHER_KAFKA_TOPIC",
    "DISPATCHER_KAFKA_GROUP_ID",
    "DISPATCHER_OUTPUT",
    "DISPATCHER_TIMEOUT_MS",
    "DISPATCHER_CONNECT_TIMEOUT_MS",
    "DISPATCHER_KAFKA_SECURITY_PROTOCOL",
    "DISPATCHER_KAFKA_SASL_MECHANISM",
    "DISPATCHER_KAFKA_SASL_USERNAME",
    "DISPATCHER_KAFKA_SASL_PASSWORD",
    "DISPATCHER_KAFKA_SSL_CA_LOCATION",
    "DISPATCHER_CONFIG",
    "RUST_LOG",
];

fn command() -> Command {
    let mut cmd = Command::cargo_bin("dispatcher-export").expect("binary not built");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_connection_options() {
    command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--bootstrap-servers"))
        .stdout(predicate::str::contains("--timeout-ms"))
        .stdout(predicate::str::contains("--security-protocol"));
}

#[test]
fn test_missing_brokers_fails() {
    command()
        .args(["--topic", "migration-requests"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bootstrap servers are required"));
}

#[test]
fn test_invalid_security_protocol_fails_without_output() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let output = dir.path().join("out.csv");

    command()
        .args([
            "--bootstrap-servers",
            "localhost:1",
            "--topic",
            "migration-requests",
            "--security-protocol",
            "BOGUS",
            "--output",
        ])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid security protocol"));

    assert!(!output.exists());
}

#[test]
fn test_sasl_without_credentials_fails() {
    command()
        .args([
            "--bootstrap-servers",
            "localhost:1",
            "--topic",
            "migration-requests",
            "--security-protocol",
            "SASL_SSL",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SASL username"));
}

#[test]
fn test_zero_timeout_fails() {
    command()
        .args([
            "--bootstrap-servers",
            "localhost:1",
            "--topic",
            "migration-requests",
            "--timeout-ms",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_ms must be greater than 0"));
}
