//! End-to-end tests for configuration error handling.
//!
//! These tests invoke the actual CLI binary with broken configurations and
//! validate the diagnostics and exit codes from a user's perspective. No git
//! repositories are touched: configuration errors must be reported before any
//! repository state exists.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

#[test]
fn test_missing_config_file_exits_with_diagnostic() {
    let temp = assert_fs::TempDir::new().unwrap();

    let mut cmd = cargo_bin_cmd!("git-weld");
    cmd.current_dir(temp.path())
        .arg("no-such-file.json")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Error:"))
        .stdout(predicate::str::contains("no-such-file.json"));
}

#[test]
fn test_invalid_json_exits_with_diagnostic() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("merge.json");
    config.write_str("{ not json at all").unwrap();

    let mut cmd = cargo_bin_cmd!("git-weld");
    cmd.current_dir(temp.path())
        .arg(config.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Configuration error"));
}

#[test]
fn test_missing_main_project_option_is_named() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("merge.json");
    config
        .write_str(
            r#"{
                "mainProject": {
                    "name": "target",
                    "repository": "r",
                    "mainBranch": "master"
                },
                "projectsToMerge": {}
            }"#,
        )
        .unwrap();

    let mut cmd = cargo_bin_cmd!("git-weld");
    cmd.current_dir(temp.path())
        .arg(config.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("createBranch"));
}

#[test]
fn test_missing_project_option_names_the_project() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("merge.json");
    config
        .write_str(
            r#"{
                "mainProject": {
                    "name": "target",
                    "repository": "r",
                    "mainBranch": "master",
                    "createBranch": "integration"
                },
                "projectsToMerge": {
                    "legacy": {
                        "repository": "r",
                        "path": "legacy",
                        "mainBranch": "main"
                    }
                }
            }"#,
        )
        .unwrap();

    let mut cmd = cargo_bin_cmd!("git-weld");
    cmd.current_dir(temp.path())
        .arg(config.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("legacy"))
        .stdout(predicate::str::contains("ignoreBranches"));
}

#[test]
fn test_bad_ignore_pattern_fails_at_load() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("merge.json");
    config
        .write_str(
            r#"{
                "mainProject": {
                    "name": "target",
                    "repository": "r",
                    "mainBranch": "master",
                    "createBranch": "integration"
                },
                "projectsToMerge": {
                    "legacy": {
                        "repository": "r",
                        "path": "legacy",
                        "mainBranch": "main",
                        "ignoreBranches": "[unclosed"
                    }
                }
            }"#,
        )
        .unwrap();

    let mut cmd = cargo_bin_cmd!("git-weld");
    cmd.current_dir(temp.path())
        .arg(config.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("ignoreBranches"));
}

#[test]
fn test_missing_config_argument_is_a_usage_error() {
    let mut cmd = cargo_bin_cmd!("git-weld");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG"));
}
