//! CLI integration tests for the Prism command-line interface.
//!
//! Help/parsing tests need no network. The records tests point the store
//! at a temp directory via environment variables.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the prism binary, isolated from the user's config.
fn prism(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("prism").unwrap();
    cmd.env("PRISM_CONFIG_DIR", config_dir);
    cmd.env_remove("GEMINI_API_KEY");
    cmd.env_remove("PRISM_STORE_PATH");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = tempfile::tempdir().unwrap();
    prism(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Prism"))
        .stdout(predicate::str::contains("multi-tool AI assistant"));
}

#[test]
fn test_version_displays() {
    let dir = tempfile::tempdir().unwrap();
    prism(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("prism"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    prism(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("image"))
        .stdout(predicate::str::contains("speak"))
        .stdout(predicate::str::contains("video"))
        .stdout(predicate::str::contains("records"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid Input Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_fails() {
    let dir = tempfile::tempdir().unwrap();
    prism(dir.path())
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_ask_requires_a_prompt() {
    let dir = tempfile::tempdir().unwrap();
    prism(dir.path()).arg("ask").assert().failure();
}

#[test]
fn test_image_rejects_bad_aspect_ratio() {
    let dir = tempfile::tempdir().unwrap();
    prism(dir.path())
        .args(["image", "a lighthouse", "--aspect-ratio", "4:3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("aspect-ratio"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Records Tests (no network)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_records_list_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    prism(dir.path())
        .args(["records", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No records found"));
}

#[test]
fn test_records_find_reads_the_store_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("records.json");
    std::fs::write(
        &store,
        r#"[{"id":"5f0c3e0e-45a9-40c2-b38a-64b2b79c4f8e","collection":"notes","data":"water the plants","created_at":"2026-08-30T12:00:00Z"}]"#,
    )
    .unwrap();

    prism(dir.path())
        .env("PRISM_STORE_PATH", &store)
        .args(["records", "find", "plants"])
        .assert()
        .success()
        .stdout(predicate::str::contains("notes"))
        .stdout(predicate::str::contains("water the plants"));
}

#[test]
fn test_records_flush_with_yes() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("records.json");
    std::fs::write(
        &store,
        r#"[{"id":"5f0c3e0e-45a9-40c2-b38a-64b2b79c4f8e","collection":"notes","data":"old note","created_at":"2026-08-30T12:00:00Z"}]"#,
    )
    .unwrap();

    prism(dir.path())
        .env("PRISM_STORE_PATH", &store)
        .args(["records", "flush", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 records"));

    let contents = std::fs::read_to_string(&store).unwrap();
    assert_eq!(contents, "[]");
}

#[test]
fn test_malformed_store_is_treated_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("records.json");
    std::fs::write(&store, "{not valid json").unwrap();

    prism(dir.path())
        .env("PRISM_STORE_PATH", &store)
        .args(["records", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No records found"));
}
