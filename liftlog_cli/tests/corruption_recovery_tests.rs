//! Corruption recovery tests for the liftlog binary.
//!
//! These tests verify the system can handle:
//! - Corrupted store files
//! - Corrupted journal lines
//! - Empty files
//! - Rejected imports

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn liftlog(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("liftlog"));
    cmd.arg("--data-dir")
        .arg(data_dir)
        .env("XDG_CONFIG_HOME", data_dir.join("config"));
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn corrupt_copies(data_dir: &Path) -> Vec<std::path::PathBuf> {
    fs::read_dir(data_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("liftlog.json.corrupt-"))
        .map(|e| e.path())
        .collect()
}

#[test]
fn test_corrupted_store_file_is_preserved() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let store_path = data_dir.join("liftlog.json");
    fs::write(&store_path, "{ invalid json }}}}").expect("Failed to write corrupted store");

    liftlog(data_dir)
        .args(["exercise", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Flat Bench Press"));

    // Original bytes kept aside, fresh store written in its place
    let copies = corrupt_copies(data_dir);
    assert_eq!(copies.len(), 1);
    assert_eq!(fs::read_to_string(&copies[0]).unwrap(), "{ invalid json }}}}");

    let fresh = fs::read_to_string(&store_path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&fresh).unwrap();
    assert_eq!(doc["data"]["exercises"].as_array().unwrap().len(), 20);
}

#[test]
fn test_empty_store_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    fs::write(data_dir.join("liftlog.json"), "").unwrap();

    liftlog(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No active program"));
    assert_eq!(corrupt_copies(data_dir).len(), 1);
}

#[test]
fn test_newer_store_schema_refused() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let store_path = data_dir.join("liftlog.json");
    fs::write(&store_path, r#"{"schema_version": 42, "data": {}}"#).unwrap();

    liftlog(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("schema version 42"));

    // Left untouched for a newer binary to read
    assert_eq!(
        fs::read_to_string(&store_path).unwrap(),
        r#"{"schema_version": 42, "data": {}}"#
    );
    assert!(corrupt_copies(data_dir).is_empty());
}

#[test]
fn test_corrupted_journal_lines_do_not_block_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let journal_path = data_dir.join("journal.jsonl");
    {
        let mut file = fs::File::create(&journal_path).unwrap();
        writeln!(file, "{{ not json").unwrap();
        write!(file, "{{\"at\": \"2024-01-01T00:00:00Z\", \"event\":").unwrap();
    }

    liftlog(data_dir)
        .args(["exercise", "add", "Sled Push", "--muscle", "legs"])
        .assert()
        .success();

    let journal = fs::read_to_string(&journal_path).unwrap();
    assert!(journal.contains("exercise_added"));
}

#[test]
fn test_rejected_import_leaves_data_intact() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    liftlog(data_dir)
        .args(["exercise", "add", "Sled Push", "--muscle", "legs"])
        .assert()
        .success();

    let bad_import = data_dir.join("bad.json");
    fs::write(&bad_import, r#"{"version": 1}"#).unwrap();
    liftlog(data_dir)
        .arg("import")
        .arg(&bad_import)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Format error"));

    fs::write(&bad_import, "definitely not json").unwrap();
    liftlog(data_dir)
        .arg("import")
        .arg(&bad_import)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Format error"));

    liftlog(data_dir)
        .args(["exercise", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sled Push (custom)"));
}

#[test]
fn test_store_manual_recovery() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    liftlog(data_dir)
        .args(["exercise", "add", "Sled Push", "--muscle", "legs"])
        .assert()
        .success();
    let good = fs::read_to_string(data_dir.join("liftlog.json")).unwrap();

    // Corrupt, run once, then restore the preserved copy by hand
    fs::write(data_dir.join("liftlog.json"), &good[..good.len() / 2]).unwrap();
    liftlog(data_dir).assert().success();
    let copies = corrupt_copies(data_dir);
    assert_eq!(copies.len(), 1);

    fs::write(data_dir.join("liftlog.json"), &good).unwrap();
    liftlog(data_dir)
        .args(["exercise", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sled Push (custom)"));
}
