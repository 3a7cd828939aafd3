//! Integration tests for the `palisade` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling, all without requiring a live gateway.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `palisade` binary with env isolation.
///
/// Clears all `PALISADE_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn palisade_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("palisade");
    cmd.env("HOME", "/tmp/palisade-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/palisade-cli-test-nonexistent")
        .env_remove("PALISADE_PROFILE")
        .env_remove("PALISADE_GATEWAY")
        .env_remove("PALISADE_API_KEY")
        .env_remove("PALISADE_VSYS")
        .env_remove("PALISADE_OUTPUT")
        .env_remove("PALISADE_INSECURE")
        .env_remove("PALISADE_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let output = palisade_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn help_flag_lists_object_commands() {
    palisade_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("address")
            .and(predicate::str::contains("service"))
            .and(predicate::str::contains("rule"))
            .and(predicate::str::contains("sequence")),
    );
}

#[test]
fn version_flag() {
    palisade_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("palisade"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn completions_bash() {
    palisade_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn completions_zsh() {
    palisade_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config commands (no gateway needed) ─────────────────────────────

#[test]
fn config_path_prints_a_path() {
    palisade_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Error handling ──────────────────────────────────────────────────

#[test]
fn gateway_command_without_config_fails_cleanly() {
    let output = palisade_cmd().args(["address", "list"]).output().unwrap();
    assert_ne!(output.status.code(), Some(0));
    let text = combined_output(&output);
    assert!(
        text.contains("config") || text.contains("gateway"),
        "Expected a configuration hint:\n{text}"
    );
}

#[test]
fn unknown_profile_is_reported() {
    let output = palisade_cmd()
        .args(["--profile", "nope", "address", "list"])
        .output()
        .unwrap();
    assert_ne!(output.status.code(), Some(0));
    let text = combined_output(&output);
    assert!(text.contains("nope"), "Expected profile name in error:\n{text}");
}

#[test]
fn invalid_gateway_url_is_a_usage_error() {
    let output = palisade_cmd()
        .args([
            "--gateway",
            "not a url",
            "--api-key",
            "k",
            "address",
            "list",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unknown_subcommand_fails() {
    palisade_cmd().arg("frobnicate").assert().failure();
}
