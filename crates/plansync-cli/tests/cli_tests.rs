//! CLI integration tests for plansync.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for various error conditions.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the plansync binary.
fn cmd() -> Command {
    Command::cargo_bin("plansync").unwrap()
}

const VALID_CONFIG: &str = r#"
remote:
  endpoint: "https://api.example.com/2/0"
  workspace_id: "ws-1"
  model_id: "model-1"
  auth_token: "token"
database:
  connection_string: "host=localhost port=5432 dbname=plans"
  user: "plans"
  password: "secret"
  query: "INSERT INTO lines (a, b) VALUES ($1, $2)"
"#;

fn config_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("export-to-db"))
        .stdout(predicate::str::contains("db-to-list"))
        .stdout(predicate::str::contains("validate-config"));
}

#[test]
fn test_export_subcommand_help() {
    cmd()
        .args(["export-to-db", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--file-id"))
        .stdout(predicate::str::contains("--columns"));
}

#[test]
fn test_db_to_list_subcommand_help() {
    cmd()
        .args(["db-to-list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--list-id"))
        .stdout(predicate::str::contains("--action"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("plansync"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_output_json_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

#[test]
fn test_config_default_path() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

// =============================================================================
// validate-config Tests
// =============================================================================

#[test]
fn test_validate_config_accepts_valid_file() {
    let file = config_file(VALID_CONFIG);
    cmd()
        .args(["--config", file.path().to_str().unwrap(), "validate-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_validate_config_rejects_empty_password() {
    let broken = VALID_CONFIG.replace("password: \"secret\"", "password: \"\"");
    let file = config_file(&broken);
    cmd()
        .args(["--config", file.path().to_str().unwrap(), "validate-config"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("password"));
}

#[test]
fn test_validate_config_rejects_disallowed_driver_option() {
    let broken = VALID_CONFIG.replace(
        "host=localhost port=5432 dbname=plans",
        "host=localhost;autoDeserialize=true",
    );
    let file = config_file(&broken);
    cmd()
        .args(["--config", file.path().to_str().unwrap(), "validate-config"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("disallowed driver option"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_1() {
    // Missing file is an IO error, not a config error
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "validate-config"])
        .assert()
        .code(1);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let file = config_file("invalid: yaml: content: [");
    cmd()
        .args(["--config", file.path().to_str().unwrap(), "validate-config"])
        .assert()
        .code(1);
}

// =============================================================================
// Argument Validation Tests
// =============================================================================

#[test]
fn test_export_requires_file_id() {
    cmd().arg("export-to-db").assert().failure();
}

#[test]
fn test_db_to_list_rejects_unknown_action() {
    cmd()
        .args(["db-to-list", "--list-id", "l1", "--action", "upsert"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}
