use assert_cmd::Command;
use predicates::prelude::*;

fn codescout() -> Command {
    Command::cargo_bin("codescout").expect("binary builds")
}

#[test]
fn extract_finds_code_in_transcript_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("transcript.txt");
    std::fs::write(&file, "Use code SAVE20 at checkout\n").unwrap();

    codescout()
        .arg("extract")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("SAVE20"));
}

#[test]
fn extract_reads_stdin() {
    codescout()
        .args(["extract", "-"])
        .write_stdin("promo XJ7KQ2M\nXJ7KQ2M shown on screen\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("XJ7KQ2M"));
}

#[test]
fn extract_reports_no_candidates_for_plain_text() {
    codescout()
        .args(["extract", "-"])
        .write_stdin("hello world, nothing to see here\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No voucher code candidates"));
}

#[test]
fn extract_emits_json() {
    codescout()
        .args(["extract", "-", "--format", "json"])
        .write_stdin("Use code SAVE20 today\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"normalized\": \"SAVE20\""));
}

#[test]
fn min_confidence_filters_candidates() {
    // A lone uncorroborated token without trigger words scores 0.5
    codescout()
        .args(["extract", "-", "--min-confidence", "0.9"])
        .write_stdin("random token QX9ZR4T here\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No voucher code candidates"));
}

#[test]
fn extract_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("codes.csv");

    codescout()
        .args(["extract", "-", "--format", "csv", "--output"])
        .arg(&out)
        .write_stdin("voucher A1B2-C3D4-E5F6 inside\n")
        .assert()
        .success();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("code,normalized"));
    assert!(written.contains("A1B2-C3D4-E5F6,A1B2C3D4E5F6"));
}

#[test]
fn sources_lists_supported_inputs() {
    codescout()
        .arg("sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("YouTube"));
}

#[test]
fn missing_input_file_fails() {
    codescout()
        .args(["extract", "definitely-missing.txt"])
        .assert()
        .failure();
}
