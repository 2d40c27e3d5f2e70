//! CLI options interaction tests
//!
//! These run the `ilb` binary and check argument handling, configuration
//! precedence and exit codes. None of them needs a real model.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const BENCH_VARS: [&str; 5] = [
    "SCALA_TEST_ON_GPU",
    "BENCH_NUM_RUNS",
    "BENCH_WARM_UP",
    "BENCH_BATCH_SIZE",
    "ENABLE_COLOR",
];

/// Command running in an empty directory with no benchmark variables set
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ilb").unwrap();
    cmd.current_dir(dir.path());
    for var in BENCH_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_options() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--model-path-prefix"))
        .stdout(predicate::str::contains("--e2e-model-path-prefix"))
        .stdout(predicate::str::contains("--batchsize"))
        .stdout(predicate::str::contains("--warm-up"))
        .stdout(predicate::str::contains("--use-gpu"))
        .stdout(predicate::str::contains("--timed-region"));
}

#[test]
fn test_help_explains_legacy_comparison() {
    let dir = TempDir::new().unwrap();
    let output = create_test_cmd(&dir).arg("--help").output().unwrap();
    assert!(output.status.success());

    // help text is wrapped to the terminal width
    let help = String::from_utf8_lossy(&output.stdout)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    assert!(help.contains("--warm-up 0"));
    assert!(help.contains("--trim head-tail"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_flag_exits_with_usage() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--not-a-flag")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_malformed_values_rejected() {
    let dir = TempDir::new().unwrap();
    for args in [
        vec!["--num-runs", "abc"],
        vec!["--batchsize", "-4"],
        vec!["--preprocess", "sharpen"],
        vec!["--use-gpu", "maybe"],
    ] {
        create_test_cmd(&dir).args(&args).assert().code(1);
    }
}

#[test]
fn test_semantic_validation_exits_one() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--num-runs", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--num-runs"));

    create_test_cmd(&dir)
        .args(["--color", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--no-color"));

    create_test_cmd(&dir)
        .args(["--use-batch", "--batchsize", "4", "--preprocess", "resize-normalize", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CONFIG"));
}

#[test]
fn test_huge_warm_up_exits_one() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--warm-up", "4294967295", "--no-color"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Warm-up"));

    create_test_cmd(&dir)
        .env("BENCH_WARM_UP", "4294967295")
        .arg("--no-color")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Warm-up"));
}

#[test]
fn test_invalid_env_var_is_config_error() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("BENCH_NUM_RUNS", "lots")
        .arg("--no-color")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("BENCH_NUM_RUNS"));
}

#[test]
fn test_env_file_is_read() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "BENCH_BATCH_SIZE=0\n").unwrap();

    create_test_cmd(&dir)
        .arg("--no-color")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Batch size"));
}

#[test]
fn test_missing_model_exits_two() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--model-path-prefix", "models/does_not_exist", "--num-runs", "2", "--no-color"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("[MODEL]"))
        .stderr(predicate::str::contains("models/does_not_exist"));
}

#[test]
fn test_corrupt_model_exits_two() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.onnx"), b"not a protobuf graph").unwrap();

    create_test_cmd(&dir)
        .args(["--model-path-prefix", "broken", "--no-color"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Model loading help"));
}

#[test]
fn test_gpu_request_does_not_change_exit_code() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("SCALA_TEST_ON_GPU", "1")
        .args(["--model-path-prefix", "absent", "--no-color"])
        .assert()
        .code(2);
}

#[test]
fn test_debug_output_stays_off_stdout() {
    let dir = TempDir::new().unwrap();
    let output = create_test_cmd(&dir)
        .args(["--model-path-prefix", "absent", "--debug", "--no-color"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Debug mode enabled"));
    assert!(stderr.contains("Configuration loaded successfully"));
    let summary = regex::Regex::new(r"(?m)^\s+Runs: \d+ \(\+\d+ warm-up\)$").unwrap();
    assert!(summary.is_match(&stderr));
}
