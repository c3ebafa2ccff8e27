//! CLI behavior tests: exit codes, output files, summaries, init.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn junit2html_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_junit2html"));
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn no_args_returns_error_not_panic() {
    let dir = TempDir::new().unwrap();
    junit2html_cmd(&dir)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("No input files given"));
}

#[test]
fn writes_default_output_and_summary() {
    let dir = TempDir::new().unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("junit-report.html"))
        .stdout(predicate::str::contains(
            "Suites: 1, Tests: 3, Passed: 1, Failed: 1, Errors: 0, Skipped: 1, Time: 0.17s",
        ));
    let html = fs::read_to_string(dir.path().join("junit-report.html")).unwrap();
    assert!(html.contains("<title>JUnit Report</title>"));
    assert!(html.contains("test_bad"));
}

#[test]
fn output_and_title_flags() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("nightly.html");
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .arg("-o")
        .arg(&out)
        .arg("--title")
        .arg("Nightly <build>")
        .assert()
        .success();
    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains("<title>Nightly &lt;build&gt;</title>"));
}

#[test]
fn fail_on_failures_exit_1() {
    let dir = TempDir::new().unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .arg("--fail-on-failures")
        .assert()
        .failure()
        .code(1);
    assert!(dir.path().join("junit-report.html").exists());
}

#[test]
fn failures_without_flag_exit_0() {
    let dir = TempDir::new().unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn best_effort_skips_malformed_with_warning() {
    let dir = TempDir::new().unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .arg(fixture("malformed.xml"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning"))
        .stderr(predicate::str::contains("malformed.xml"));
    let html = fs::read_to_string(dir.path().join("junit-report.html")).unwrap();
    assert!(html.contains("test_ok"));
    assert!(!html.contains("Broken"));
}

#[test]
fn strict_aborts_on_malformed() {
    let dir = TempDir::new().unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .arg(fixture("malformed.xml"))
        .arg("--strict")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("malformed.xml"));
    assert!(!dir.path().join("junit-report.html").exists());
}

#[test]
fn nothing_loadable_exit_2() {
    let dir = TempDir::new().unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("malformed.xml"))
        .arg("does-not-exist.xml")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("does-not-exist.xml"))
        .stderr(predicate::str::contains("No input could be loaded"));
    assert!(!dir.path().join("junit-report.html").exists());
}

#[test]
fn unwritable_output_exit_2() {
    let dir = TempDir::new().unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .arg("-o")
        .arg(dir.path().join("missing-dir").join("report.html"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Failed to write report"));
}

#[test]
fn json_output_valid() {
    let dir = TempDir::new().unwrap();
    let output = junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .arg(fixture("malformed.xml"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let s = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(s.trim()).expect("valid JSON");
    assert_eq!(value["tests"], 3);
    assert_eq!(value["failed"], 1);
    assert_eq!(value["skippedInputs"].as_array().unwrap().len(), 1);
}

#[test]
fn verbose_lists_failing_tests() {
    let dir = TempDir::new().unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Problems:"))
        .stdout(predicate::str::contains("Login › LoginTest › test_bad"));
}

#[test]
fn glob_pattern_without_matches_is_skipped() {
    let dir = TempDir::new().unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .arg("nothing-here/*.xml")
        .assert()
        .success()
        .stderr(predicate::str::contains("pattern matched no files"));
}

#[test]
fn config_file_supplies_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".junit2htmlrc.json"),
        r#"{ "title": "From config", "output": "cfg.html", "failOnFailures": true }"#,
    )
    .unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .assert()
        .failure()
        .code(1);
    let html = fs::read_to_string(dir.path().join("cfg.html")).unwrap();
    assert!(html.contains("<title>From config</title>"));
}

#[test]
fn bad_config_exit_2() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".junit2htmlrc.json"), "{ nope").unwrap();
    junit2html_cmd(&dir)
        .arg(fixture("login.xml"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid JSON in config"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join(".junit2htmlrc.json");
    junit2html_cmd(&dir)
        .arg("init")
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success();
    assert!(config_path.exists(), ".junit2htmlrc.json should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("\"title\""));
    assert!(content.contains("\"failOnFailures\""));

    junit2html_cmd(&dir)
        .arg("init")
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));
}
