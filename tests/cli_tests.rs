//! End-to-end tests for the `trial-matcher` binary against the embedded store.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn cmd() -> Command {
    Command::cargo_bin("trial-matcher").expect("binary should build")
}

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

#[test]
fn test_match_codes_ranks_inclusion_matches() {
    cmd()
        .args(["match", "--codes", "C50.911,I10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Code families: C50, I10"))
        .stdout(predicate::str::contains("NCT90000001"))
        .stdout(predicate::str::contains("NCT90000002"))
        .stdout(predicate::str::contains("SAFETY ALERT").not());
}

#[test]
fn test_match_description_reports_exclusion_alert() {
    cmd()
        .args(["match", "Patient with breast cancer and a history of heart failure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ID: NCT90000001"))
        .stdout(predicate::str::contains("Score: -90"))
        .stdout(predicate::str::contains(
            "Excludes I50: History of clinically significant cardiac disease",
        ))
        .stdout(predicate::str::contains("[SAFETY ALERT]"));
}

#[test]
fn test_match_without_recognizable_terms() {
    cmd()
        .args(["match", "Feeling well, routine check-up"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No identifiable medical codes"));
}

#[test]
fn test_match_without_candidates() {
    cmd()
        .args(["match", "--codes", "K35.80"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Code families: K35"))
        .stdout(predicate::str::contains("No trials have inclusion criteria"));
}

#[test]
fn test_match_reads_description_from_stdin() {
    cmd()
        .args(["match", "-"])
        .write_stdin("Long-standing ASTHMA, otherwise healthy")
        .assert()
        .success()
        .stdout(predicate::str::contains("ID: NCT90000003"))
        .stdout(predicate::str::contains("Score: 10"));
}

#[test]
fn test_match_json_orders_by_score() {
    let output = cmd()
        .args(["match", "--codes", "C50.911,R10.9,I50.9", "--format", "json"])
        .output()
        .expect("Failed to run binary");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["status"], "ranked");
    assert_eq!(json["families"], serde_json::json!(["C50", "I50", "R10"]));

    let trials = json["trials"].as_array().expect("trials array");
    assert_eq!(trials.len(), 2);
    assert_eq!(trials[0]["nct_id"], "NCT90000001");
    assert_eq!(trials[0]["score"], -90);
    assert_eq!(trials[1]["nct_id"], "NCT90000005");
    assert_eq!(trials[1]["score"], -95);
    assert_eq!(
        trials[1]["alerts"],
        serde_json::json!(["Excludes C50: Known or suspected breast cancer"])
    );
}

#[test]
fn test_match_tsv_with_limit() {
    cmd()
        .args(["match", "--codes", "C50.911,I10", "--format", "tsv", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rank\tnct_id\ttitle\tscore"))
        .stdout(predicate::str::contains("1\tNCT90000001\t"))
        .stdout(predicate::str::contains("NCT90000002").not());
}

#[test]
fn test_match_rejects_malformed_code() {
    cmd()
        .args(["match", "--codes", "C50;DROP"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid medical code"));
}

#[test]
fn test_match_requires_input() {
    cmd().arg("match").assert().failure();
}

#[test]
fn test_match_with_config_file() {
    let config = write_temp(r#"{"scoring": {"exclusion_penalty": 1000}}"#);

    cmd()
        .args(["match", "--codes", "C50.911,I50.9", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: -990"));
}

#[test]
fn test_match_rejects_invalid_config() {
    let config = write_temp(r#"{"store_timeout_ms": 0}"#);

    cmd()
        .args(["match", "--codes", "C50", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}

#[test]
fn test_match_with_custom_store() {
    let store = write_temp(
        r#"{
            "version": "1.0.0",
            "trials": [{
                "nct_id": "NCT00000042",
                "title": "Anemia supplementation",
                "criteria": [
                    {"type": "Inclusion", "category": "Condition", "code": "D64.9", "text": "Iron deficiency anemia"},
                    {"type": "Exclusion", "category": "Condition", "code": "", "text": "Uncoded exclusion"}
                ]
            }]
        }"#,
    );

    cmd()
        .args(["match", "patient with anemia", "--store"])
        .arg(store.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ID: NCT00000042"))
        .stdout(predicate::str::contains("Iron deficiency anemia"));
}

#[test]
fn test_match_with_custom_lexicon() {
    let lexicon = write_temp(
        r#"{"version": "1.0.0", "entries": [{"term": "HTN", "codes": ["I10"]}]}"#,
    );

    cmd()
        .args(["match", "Known HTN on therapy", "--lexicon"])
        .arg(lexicon.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ID: NCT90000002"));
}

#[test]
fn test_catalog_list_and_show() {
    cmd()
        .args(["catalog", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trial Store (5 trials)"));

    cmd()
        .args(["catalog", "show", "NCT90000003"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Physician-diagnosed asthma"));

    cmd()
        .args(["catalog", "show", "NCT00000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_catalog_stats() {
    cmd()
        .args(["catalog", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trials:   5"))
        .stdout(predicate::str::contains("Condition coding: 10/10 (100%)"));
}

#[test]
fn test_catalog_search() {
    cmd()
        .args(["catalog", "search", "--condition", "heart failure", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NCT90000001\tExclusion"))
        .stdout(predicate::str::contains("NCT90000004\tExclusion"));
}

#[test]
fn test_catalog_export_round_trips_through_store_flag() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("export.json");

    cmd()
        .args(["catalog", "export"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 5 trials"));

    cmd()
        .args(["catalog", "list", "--format", "json", "--store"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"nct_id\": \"NCT90000005\""));
}

#[test]
fn test_catalog_search_by_age_hides_whole_trial() {
    cmd()
        .args(["catalog", "search", "--age", "16", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NCT90000002\t"))
        .stdout(predicate::str::contains("NCT90000001").not());

    cmd()
        .args(["catalog", "search", "--age", "30", "--trial", "NCT90000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NCT90000001 [Inclusion]"));
}

#[test]
fn test_catalog_enrich_makes_uncoded_criteria_matchable() {
    let store = write_temp(
        r#"{
            "version": "1.0.0",
            "trials": [{
                "nct_id": "NCT00000077",
                "title": "Anemia supplementation",
                "criteria": [
                    {"type": "Inclusion", "category": "Condition", "text": "Iron deficiency anemia"}
                ]
            }]
        }"#,
    );
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let enriched = dir.path().join("enriched.json");

    cmd()
        .args(["match", "--codes", "D64.9", "--store"])
        .arg(store.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No trials have inclusion criteria"));

    cmd()
        .args(["catalog", "enrich"])
        .arg(&enriched)
        .arg("--store")
        .arg(store.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Coded 1 of 1 uncoded criteria"));

    cmd()
        .args(["match", "--codes", "D64.9", "--store"])
        .arg(&enriched)
        .assert()
        .success()
        .stdout(predicate::str::contains("ID: NCT00000077"));
}
