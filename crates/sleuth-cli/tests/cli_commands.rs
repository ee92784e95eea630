use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn write_case(dir: &Path) {
    let files = [
        (
            "setup.json",
            json!({"title": "The Lambeth Poisoner", "description": "A chemist is found dead."}),
        ),
        (
            "clues.json",
            json!([
                {"location": "Scotland Yard", "description": "Lestrade has the autopsy."},
                {"location": "Lambeth Chemist", "description": "A bottle of arsenic is missing."}
            ]),
        ),
        (
            "questions.json",
            json!([
                {"question": "Who poisoned the chemist?", "points": 20},
                {"question": "What was the motive?", "points": 15}
            ]),
        ),
        ("answers.json", json!(["His apprentice", "Inheritance"])),
        ("solution.json", json!({"summary": "The apprentice did it."})),
        ("informants.json", json!([])),
        ("newspapers.json", json!({"description": "TIMES: Chemist found dead."})),
    ];
    for (name, value) in files {
        std::fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }
}

fn sleuth(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sleuth").unwrap();
    cmd.current_dir(cwd)
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("SLEUTH_EXCHANGE_DIR")
        .env_remove("SLEUTH_LOG_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_prints_crate_version() {
    let tmp = TempDir::new().unwrap();
    sleuth(tmp.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn validate_prints_summary() {
    let tmp = TempDir::new().unwrap();
    write_case(tmp.path());

    sleuth(tmp.path())
        .args(["validate", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("case: The Lambeth Poisoner"))
        .stdout(predicate::str::contains("questions:  2 (35 points)"));
}

#[test]
fn validate_json_output() {
    let tmp = TempDir::new().unwrap();
    write_case(tmp.path());

    let output = sleuth(tmp.path())
        .args(["validate", ".", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["valid"], true);
    assert_eq!(v["case"]["max_score"], 35);
    assert_eq!(v["case"]["clues"], 2);
}

#[test]
fn validate_missing_file_is_config_error() {
    let tmp = TempDir::new().unwrap();
    write_case(tmp.path());
    std::fs::remove_file(tmp.path().join("clues.json")).unwrap();

    sleuth(tmp.path())
        .args(["validate", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("clues.json"));
}

#[test]
fn run_without_api_key_is_config_error() {
    let tmp = TempDir::new().unwrap();
    write_case(tmp.path());

    sleuth(tmp.path())
        .args(["run", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
}

#[test]
fn malformed_env_number_is_config_error() {
    let tmp = TempDir::new().unwrap();
    write_case(tmp.path());

    sleuth(tmp.path())
        .args(["validate", "."])
        .env("SLEUTH_MAX_ITERATIONS", "abc")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("SLEUTH_MAX_ITERATIONS"));
}

#[test]
fn run_on_broken_case_is_config_error() {
    let tmp = TempDir::new().unwrap();
    write_case(tmp.path());
    std::fs::write(tmp.path().join("questions.json"), "not json").unwrap();

    sleuth(tmp.path())
        .args(["run", "."])
        .env("ANTHROPIC_API_KEY", "test-key")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("questions.json"));
}

#[test]
fn log_dir_gets_numbered_run_directory() {
    let tmp = TempDir::new().unwrap();
    write_case(tmp.path());
    let logs = tmp.path().join("logs");

    sleuth(tmp.path())
        .args(["validate", ".", "--log-dir"])
        .arg(&logs)
        .assert()
        .success();

    assert!(logs.join("run-0001").join("sleuth.log").is_file());
}
