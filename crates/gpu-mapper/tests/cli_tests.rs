//! Tests for the `gpu-mapper` binary's startup checks.

use std::process::{Command, Output};

const ALL_REQUIRED: &str = "PROXMOX_API_URL, PROXMOX_TOKEN_ID, PROXMOX_TOKEN_VALUE";

fn run_without_settings(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gpu-mapper"))
        .args(args)
        .env_remove("PROXMOX_API_URL")
        .env_remove("PROXMOX_TOKEN_ID")
        .env_remove("PROXMOX_TOKEN_VALUE")
        .env_remove("PROXMOX_VERIFY_SSL")
        .output()
        .expect("binary runs")
}

/// With nothing configured the binary prints usage to stdout and exits 1.
#[test]
fn test_missing_config_exits_with_usage() {
    let output = run_without_settings(&[]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Error: "));
    assert!(stdout.contains(ALL_REQUIRED));
}

/// A partial configuration still stops before any request is made.
#[test]
fn test_partial_config_makes_no_requests() {
    let output = run_without_settings(&["--api-url", "http://127.0.0.1:1/api2/json"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PROXMOX_TOKEN_ID, PROXMOX_TOKEN_VALUE"));
    assert!(!stdout.contains("Making API request"));
}
