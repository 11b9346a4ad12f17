//! Integration tests for the CLI interface
//!
//! These runs never get as far as the workflow service: each one stops at
//! help output, the `?` listing, or a local usage/validation error.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HELLO: &str = r#"version 1.0

workflow hello {
    input {
        File input_txt_file
        String docker
        Int threads = 4
    }
    parameter_meta {
        input_txt_file: "text file to greet"
    }
    call greet { input: f = input_txt_file, docker = docker }
}

task greet {
    input {
        File f
        String docker
    }
    command <<< cat ~{f} >>>
    runtime { docker: docker }
}
"#;

fn write_workflow(dir: &Path) -> PathBuf {
    let path = dir.join("hello.wdl");
    std::fs::write(&path, HELLO).unwrap();
    path
}

/// Command isolated from the user's configuration and environment.
fn cmd(dir: &Path) -> Command {
    let config = dir.join("config.toml");
    std::fs::write(&config, "").unwrap();

    let mut cmd = Command::cargo_bin("wdl-omics-run").unwrap();
    cmd.arg("--config")
        .arg(config)
        .env_remove("WDL_OMICS_ROLE_ARN")
        .env_remove("WDL_OMICS_OUTPUT_URI")
        .env_remove("WDL_OMICS_REGION")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = Command::cargo_bin("wdl-omics-run").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--role-arn"))
        .stdout(predicate::str::contains("MAIN_WDL"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = Command::cargo_bin("wdl-omics-run").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_question_mark_lists_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let wdl = write_workflow(temp_dir.path());

    cmd(temp_dir.path())
        .arg(wdl)
        .arg("?")
        .assert()
        .success()
        .stdout(predicate::str::contains("required inputs:"))
        .stdout(predicate::str::contains(
            "File input_txt_file  # text file to greet",
        ))
        .stdout(predicate::str::contains("Int threads = 4"));
}

#[test]
fn test_unknown_input_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let wdl = write_workflow(temp_dir.path());

    cmd(temp_dir.path())
        .args(["--role-arn", "arn:aws:iam::123456789012:role/OmicsRun"])
        .args(["--output-uri", "s3://bucket/out/"])
        .arg(wdl)
        .args(["input_txt_file=s3://bucket/in.txt", "docker=ubuntu", "bogus=1"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Input validation failed"))
        .stderr(predicate::str::contains("bogus: unknown input"));
}

#[test]
fn test_local_file_input_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let wdl = write_workflow(temp_dir.path());

    cmd(temp_dir.path())
        .args(["--role-arn", "arn:aws:iam::123456789012:role/OmicsRun"])
        .args(["--output-uri", "s3://bucket/out/"])
        .arg(wdl)
        .args(["input_txt_file=/home/me/in.txt", "docker=ubuntu"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("input_txt_file"))
        .stderr(predicate::str::contains("s3://"));
}

#[test]
fn test_missing_role_is_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let wdl = write_workflow(temp_dir.path());

    cmd(temp_dir.path())
        .args(["--output-uri", "s3://bucket/out/"])
        .arg(wdl)
        .arg("docker=ubuntu")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--role-arn is required"));
}

#[test]
fn test_output_uri_must_be_s3() {
    let temp_dir = TempDir::new().unwrap();
    let wdl = write_workflow(temp_dir.path());

    cmd(temp_dir.path())
        .args(["--role", "arn:aws:iam::123456789012:role/OmicsRun"])
        .args(["--output-uri", "/tmp/out"])
        .arg(wdl)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must be an s3:// URI"));
}

#[test]
fn test_build_with_inputs_is_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let wdl = write_workflow(temp_dir.path());

    cmd(temp_dir.path())
        .arg("--build")
        .arg(wdl)
        .arg("docker=ubuntu")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--build cannot be combined"));
}

#[test]
fn test_conflicting_cache_flags() {
    let temp_dir = TempDir::new().unwrap();
    let wdl = write_workflow(temp_dir.path());

    cmd(temp_dir.path())
        .args(["--cache", "shared", "--cache-id", "1234567"])
        .arg(wdl)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_missing_main_file() {
    let temp_dir = TempDir::new().unwrap();

    cmd(temp_dir.path())
        .arg(temp_dir.path().join("absent.wdl"))
        .arg("?")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Fetch error"));
}

#[test]
fn test_syntax_error_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let wdl = temp_dir.path().join("broken.wdl");
    std::fs::write(&wdl, "version 1.0\nworkflow {\n").unwrap();

    cmd(temp_dir.path())
        .arg(wdl)
        .arg("?")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("WDL parse error"));
}
