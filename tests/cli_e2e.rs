//! End-to-end CLI tests for slackview.
//!
//! These tests run the actual binary against a fixture export and check the
//! JSON document it writes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test cli_e2e
//! ```

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Creates a temporary export with one channel, one DM and one MPIM.
fn setup_archive() -> TempDir {
    let dir = tempdir().expect("Failed to create temp dir");
    let root = dir.path();

    fs::write(
        root.join("users.json"),
        r#"[
  {"id": "U1", "name": "alice", "profile": {"real_name": "Alice"}},
  {"id": "U2", "name": "bob"}
]"#,
    )
    .unwrap();
    fs::write(
        root.join("channels.json"),
        r#"[{"id": "C1", "name": "general"}, {"id": "C2", "name": "random"}]"#,
    )
    .unwrap();
    fs::write(root.join("dms.json"), r#"[{"id": "D1", "members": ["U1", "U2"]}]"#).unwrap();
    fs::write(
        root.join("mpims.json"),
        r#"[{"id": "G1", "name": "mpdm-alice--bob-1", "members": ["U1", "U2"]}]"#,
    )
    .unwrap();

    for (rel, content) in [
        (
            "general/2024-01-15.json",
            r#"[
  {"ts": "1705314600.000100", "user": "U1", "text": "Hello *team*", "reply_count": 1,
   "replies": [{"user": "U2", "ts": "1705314720.000300"}]},
  {"ts": "1705314660.000200", "user": "U2", "subtype": "channel_join", "text": "joined"},
  {"ts": "1705314720.000300", "user": "U2", "text": "Hi Alice!", "thread_ts": "1705314600.000100"}
]"#,
        ),
        (
            "random/2024-01-15.json",
            r#"[{"ts": "1705314600.000100", "user": "U2", "text": "random stuff"}]"#,
        ),
        (
            "D1/2024-01-15.json",
            r#"[{"ts": "1705314600.000100", "user": "U2", "text": "psst"}]"#,
        ),
        (
            "mpdm-alice--bob-1/2024-01-15.json",
            r#"[{"ts": "1705314600.000100", "user": "U1", "text": "group chat"}]"#,
        ),
    ] {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    dir
}

fn slackview_cmd() -> Command {
    let mut cmd = Command::from_std(std::process::Command::new(env!("CARGO_BIN_EXE_slackview")));
    for var in [
        "SEV_ARCHIVE",
        "SEV_OUTPUT",
        "SEV_WORKSPACE",
        "SEV_SHOW_DMS",
        "SEV_NO_THREAD_NOTE",
        "SEV_SINCE",
        "SEV_SKIP_CHANNEL_MEMBER_CHANGE",
        "SEV_HIDE_CHANNELS",
        "SEV_CHANNELS",
        "SEV_DEBUG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn output_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn read_json(path: &PathBuf) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn channel<'a>(doc: &'a Value, name: &str) -> &'a Value {
    doc["channels"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == name)
        .unwrap_or_else(|| panic!("channel {name} missing"))
}

// ============================================================================
// Basic functionality
// ============================================================================

#[test]
fn test_basic_export() {
    let archive = setup_archive();
    let output = output_path(&archive, "out.json");

    slackview_cmd()
        .args([
            archive.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--workspace",
            "acme",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Done"))
        .stdout(predicate::str::contains("Channels:  2"));

    let doc = read_json(&output);
    let general = &channel(&doc, "general")["messages"];
    assert_eq!(general.as_array().unwrap().len(), 3);
    assert_eq!(general[0]["msg"], "Hello <strong>team</strong>");
    assert_eq!(general[0]["username"], "Alice");
    assert_eq!(general[1]["msg"], "<b>Thread Reply:</b> Hi Alice!");
    assert_eq!(general[1]["is_thread_reply"], true);
    assert!(
        general[0]["permalink"]
            .as_str()
            .unwrap()
            .starts_with("https://acme.slack.com/archives/C1/p1705314600000100")
    );
    assert_eq!(doc["dms"], serde_json::json!([]));
}

#[test]
fn test_show_dms() {
    let archive = setup_archive();
    let output = output_path(&archive, "out.json");

    slackview_cmd()
        .args([archive.path().to_str().unwrap(), "-o", output.to_str().unwrap(), "--show-dms"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DMs:       1"));

    let doc = read_json(&output);
    assert_eq!(doc["dms"][0]["name"], "D1");
    assert_eq!(doc["dms"][0]["label"], "Alice");
    assert_eq!(doc["mpims"][0]["label"], "Alice, bob");
    assert_eq!(doc["mpims"][0]["messages"][0]["msg"], "group chat");
}

// ============================================================================
// Flags
// ============================================================================

#[test]
fn test_no_thread_note_and_skip_member_change() {
    let archive = setup_archive();
    let output = output_path(&archive, "out.json");

    slackview_cmd()
        .args([
            archive.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--no-thread-note",
            "--skip-channel-member-change",
        ])
        .assert()
        .success();

    let doc = read_json(&output);
    let general = channel(&doc, "general")["messages"].as_array().unwrap().clone();
    assert_eq!(general.len(), 2);
    assert_eq!(general[1]["msg"], "Hi Alice!");
}

#[test]
fn test_hide_channels_via_env() {
    let archive = setup_archive();
    let output = output_path(&archive, "out.json");

    slackview_cmd()
        .env("SEV_HIDE_CHANNELS", "random")
        .args([archive.path().to_str().unwrap(), "-o", output.to_str().unwrap()])
        .assert()
        .success();

    let doc = read_json(&output);
    let names: Vec<_> = doc["channels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["general"]);
}

#[test]
fn test_channels_selection() {
    let archive = setup_archive();
    let output = output_path(&archive, "out.json");

    slackview_cmd()
        .args([
            archive.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--channels",
            "random",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Channels:  1"));
}

#[test]
fn test_since_filter() {
    let archive = setup_archive();
    let output = output_path(&archive, "out.json");

    slackview_cmd()
        .args([
            archive.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--since",
            "2030-01-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Messages:  0"));
}

// ============================================================================
// Error handling
// ============================================================================

#[test]
fn test_missing_archive() {
    let dir = tempdir().unwrap();
    slackview_cmd()
        .arg(dir.path().join("nope").to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("users.json"));
}

#[test]
fn test_invalid_since() {
    let archive = setup_archive();
    slackview_cmd()
        .args([archive.path().to_str().unwrap(), "--since", "15/01/2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_help() {
    slackview_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--show-dms"))
        .stdout(predicate::str::contains("SEV_SINCE"));
}
