//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn assessly() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("assessly").unwrap();
    cmd.env_remove("ASSESSLY_SERVER_URL")
        .env_remove("ASSESSLY_ACCESS_TOKEN");
    cmd
}

fn sample_assessments() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../assessments")
        .canonicalize()
        .unwrap()
}

/// Write a config pointing the local backend at the sample assessments and a
/// fresh submissions file inside `dir`.
fn local_config(dir: &TempDir) -> PathBuf {
    let config = format!(
        r#"user_id = "student-1"

[backend]
type = "local"
assessments_dir = "{}"
submissions_file = "{}"
"#,
        sample_assessments().display(),
        dir.path().join("submissions.json").display()
    );
    let path = dir.path().join("assessly.toml");
    std::fs::write(&path, config).unwrap();
    path
}

fn take_fractions(config: &Path) -> assert_cmd::assert::Assert {
    // Options are numbered from 1: answers {0: 1, 1: 0, 2: 1}.
    assessly()
        .arg("take")
        .arg("--assessment")
        .arg("fractions")
        .arg("--config")
        .arg(config)
        .write_stdin("a 2\nn\na 1\nn\na 2\ns\n")
        .assert()
}

#[test]
fn validate_sample_assessment() {
    assessly()
        .arg("validate")
        .arg("--assessment")
        .arg("../../assessments/cell-biology.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cell Biology Basics (4 questions, 10 min)"))
        .stdout(predicate::str::contains("All assessments valid"));
}

#[test]
fn validate_directory() {
    assessly()
        .arg("validate")
        .arg("--assessment")
        .arg("../../assessments")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cell Biology Basics"))
        .stdout(predicate::str::contains("Fractions"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[assessment]
id = "broken"
title = "Broken"

[[questions]]
id = "q1"
type = "multiple-choice"
prompt = "Pick one"
options = ["only"]
correct_answer = 3
"#,
    )
    .unwrap();

    assessly()
        .arg("validate")
        .arg("--assessment")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[q1] WARNING"))
        .stdout(predicate::str::contains("out of range"));
}

#[test]
fn validate_nonexistent_file() {
    assessly()
        .arg("validate")
        .arg("--assessment")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn grade_worked_example() {
    assessly()
        .arg("grade")
        .arg("--assessment")
        .arg("../../assessments/fractions.json")
        .arg("--answers")
        .arg("../../answers/fractions.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 2/3 (67%) [yellow]"));
}

#[test]
fn grade_short_answer_policies() {
    assessly()
        .arg("grade")
        .arg("--assessment")
        .arg("../../assessments/cell-biology.toml")
        .arg("--answers")
        .arg("../../answers/cell-biology.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 3/4 (75%)"))
        .stdout(predicate::str::contains("pending manual review"));

    assessly()
        .arg("grade")
        .arg("--assessment")
        .arg("../../assessments/cell-biology.toml")
        .arg("--answers")
        .arg("../../answers/cell-biology.json")
        .arg("--short-answer")
        .arg("exact")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 4/4 (100%) [green]"))
        .stdout(predicate::str::contains("Points: 5/5"));
}

#[test]
fn grade_rejects_unknown_policy() {
    assessly()
        .arg("grade")
        .arg("--assessment")
        .arg("../../assessments/fractions.json")
        .arg("--answers")
        .arg("../../answers/fractions.json")
        .arg("--short-answer")
        .arg("fuzzy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown short-answer policy"));
}

#[test]
fn list_filters_by_category() {
    let dir = TempDir::new().unwrap();
    let config = local_config(&dir);

    assessly()
        .arg("list")
        .arg("--config")
        .arg(&config)
        .arg("--category")
        .arg("math")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fractions"))
        .stdout(predicate::str::contains("Cell Biology").not());
}

#[test]
fn take_submit_and_review() {
    let dir = TempDir::new().unwrap();
    let config = local_config(&dir);

    take_fractions(&config)
        .success()
        .stdout(predicate::str::contains("Question 1 of 3"))
        .stdout(predicate::str::contains("Assessment submitted."))
        .stdout(predicate::str::contains("Score: 2/3 (67%) [yellow]"));

    assessly()
        .arg("submissions")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("2/3 (67%)"))
        .stdout(predicate::str::contains("1 awaiting feedback"));
}

#[test]
fn second_attempt_is_refused() {
    let dir = TempDir::new().unwrap();
    let config = local_config(&dir);

    take_fractions(&config).success();
    take_fractions(&config)
        .success()
        .stdout(predicate::str::contains("already submitted"));
}

#[test]
fn quitting_discards_answers() {
    let dir = TempDir::new().unwrap();
    let config = local_config(&dir);

    assessly()
        .arg("take")
        .arg("--assessment")
        .arg("fractions")
        .arg("--config")
        .arg(&config)
        .write_stdin("a 2\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("no answers were submitted"));

    assert!(!dir.path().join("submissions.json").exists());
}

#[test]
fn feedback_overrides_score() {
    let dir = TempDir::new().unwrap();
    let config = local_config(&dir);
    take_fractions(&config).success();

    let output = assessly()
        .arg("submissions")
        .arg("--config")
        .arg(&config)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = report["rows"][0]["submission_id"].as_str().unwrap().to_string();

    assessly()
        .arg("feedback")
        .arg("--submission")
        .arg(&id)
        .arg("--feedback")
        .arg("Check question 3 again")
        .arg("--manual-score")
        .arg("3")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Effective score: 3/3 (100%) [green]"));

    assessly()
        .arg("feedback")
        .arg("--submission")
        .arg(&id)
        .arg("--manual-score")
        .arg("4")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds total questions"));

    let html = dir.path().join("review.html");
    assessly()
        .arg("submissions")
        .arg("--config")
        .arg(&config)
        .arg("--format")
        .arg("html")
        .arg("--output")
        .arg(&html)
        .assert()
        .success();
    let content = std::fs::read_to_string(&html).unwrap();
    assert!(content.contains("3/3 (100%)"));
    assert!(content.contains("Check question 3 again"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    assessly()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created assessly.toml"))
        .stdout(predicate::str::contains("Created assessments/example.toml"));

    assert!(dir.path().join("assessly.toml").exists());
    assert!(dir.path().join("assessments/example.toml").exists());

    assessly()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--assessment")
        .arg("assessments/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All assessments valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    assessly()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    assessly()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    assessly()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Timed assessments"));
}

#[test]
fn version_output() {
    assessly()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("assessly"));
}
