//! End-to-end tests for the `ct` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
  "functions": [{"start": 4096, "end": 4352, "frame": 65280}],
  "code": [{"start": 8192, "end": 8256}],
  "structures": [{"id": 65296, "name": "Point", "members": [
    {"id": 65297, "name": "x", "offset": 0, "size": 4},
    {"id": 65298, "name": "y", "offset": 4, "size": 4}
  ]}],
  "enums": [{"id": 65312, "name": "Color"}]
}"#;

const EVENTS: &str = r#"# one editing session
{"kind":"rename","ea":4096,"type_label":"function","old_name":"sub_1000","new_name":"main"}
{"kind":"code_created","ea":8192}
{"kind":"comment_changed","ea":8200}
{"kind":"structure_updated","struct_id":65296}
{"kind":"structure_updated","struct_id":65280}
{"kind":"structure_member_updated","struct_id":65296,"member_id":65298,"offset":4}
{"kind":"enum_updated","enum_id":65312}
{"kind":"enum_updated","enum_id":65313}
{"kind":"segment_added","start":4096,"end":12288}
"#;

fn ct() -> Command {
    let mut cmd = Command::cargo_bin("ct").unwrap();
    cmd.env_remove("CT_CACHE_DIR_NAME")
        .env_remove("CT_ANNOTATIONS_DB")
        .env_remove("RUST_LOG");
    cmd
}

fn workspace() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let snapshot = temp_dir.path().join("target.json");
    let events = temp_dir.path().join("events.jsonl");
    fs::write(&snapshot, SNAPSHOT).unwrap();
    fs::write(&events, EVENTS).unwrap();
    (temp_dir, snapshot, events)
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn cache_lines(dir: &Path, file: &str) -> Vec<serde_json::Value> {
    fs::read_to_string(dir.join("cache").join(file))
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_version_json() {
    let output = ct().args(["version", "--json"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["name"], "changetrack");
}

#[test]
fn test_replay_writes_cache_next_to_snapshot() {
    let (temp_dir, snapshot, events) = workspace();

    let output = ct()
        .arg("replay")
        .arg(&snapshot)
        .arg(&events)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    assert_eq!(report["notifications"], 9);
    assert_eq!(report["flushed"], true);
    assert_eq!(report["pending"]["addresses"], 0);
    // 4096 (rename, also the frame owner), 8192, 8200
    assert_eq!(report["stats"]["addresses"], 3);
    assert_eq!(report["stats"]["structures"], 2);
    assert_eq!(report["stats"]["members"], 1);
    assert_eq!(report["stats"]["enums"], 1);
    assert_eq!(report["stats"]["segments"], 1);
    assert_eq!(report["stats"]["deletions"], 1);

    let cache = temp_dir.path().join("cache");
    assert!(cache.join(".gitignore").exists());
    assert_eq!(cache_lines(temp_dir.path(), "addresses.jsonl").len(), 3);

    let structures = cache_lines(temp_dir.path(), "structures.jsonl");
    let frame = structures.iter().find(|s| s["id"] == 65280).unwrap();
    assert_eq!(frame["owner"], 4096);

    let deletions = cache_lines(temp_dir.path(), "deletions.jsonl");
    assert_eq!(deletions[0]["type"], "enum_deleted");
    assert_eq!(deletions[0]["id"], 65313);
}

#[test]
fn test_replay_no_flush_keeps_pending() {
    let (_temp_dir, snapshot, events) = workspace();

    let output = ct()
        .arg("replay")
        .arg(&snapshot)
        .arg(&events)
        .args(["--no-flush", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["flushed"], false);
    assert_eq!(report["pending"]["addresses"], 2);
    assert_eq!(report["pending"]["comments"], 1);
}

#[test]
fn test_replay_rejects_malformed_log() {
    let (temp_dir, snapshot, _events) = workspace();
    let events = temp_dir.path().join("bad.jsonl");
    fs::write(&events, "{\"kind\":\"code_created\",\"ea\":1}\nnot json\n").unwrap();

    let output = ct()
        .arg("replay")
        .arg(&snapshot)
        .arg(&events)
        .arg("--json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    let error: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(error["error"]["code"], "INVALID_NOTIFICATION");
    assert!(!temp_dir.path().join("cache").exists());
}

#[test]
fn test_replay_missing_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let output = ct()
        .arg("replay")
        .arg(temp_dir.path().join("missing.json"))
        .arg(temp_dir.path().join("events.jsonl"))
        .arg("--json")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_status_after_replay() {
    let (_temp_dir, snapshot, events) = workspace();
    ct().arg("replay").arg(&snapshot).arg(&events).assert().success();

    let output = ct().arg("status").arg(&snapshot).arg("--json").output().unwrap();
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["cache"]["exists"], true);
    assert!(report["pending_annotations"].as_u64().unwrap() > 0);
    let files = report["cache"]["files"].as_array().unwrap();
    assert!(files.iter().any(|f| f["name"] == "members.jsonl"));
}

#[test]
fn test_annotations_for_entity_and_commit() {
    let (_temp_dir, snapshot, events) = workspace();
    ct().arg("replay").arg(&snapshot).arg(&events).assert().success();

    let output = ct()
        .args(["annotations", "--json"])
        .arg(&snapshot)
        .arg("0x1000")
        .output()
        .unwrap();
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(
        report["annotations"][0]["message"],
        "function renamed from sub_1000 to main"
    );

    let output = ct()
        .args(["annotations", "--json", "--mark-committed"])
        .arg(&snapshot)
        .output()
        .unwrap();
    assert!(output.status.success());
    let report = stdout_json(&output);
    let message = report["commit_message"].as_str().unwrap();
    assert!(message.contains("0x2008: Changed comment"));
    assert_eq!(report["marked_committed"], report["count"]);

    let output = ct()
        .args(["annotations", "--json"])
        .arg(&snapshot)
        .output()
        .unwrap();
    assert_eq!(stdout_json(&output)["count"], 0);
}

#[test]
fn test_custom_cache_dir_name_flag() {
    let (temp_dir, snapshot, events) = workspace();
    ct().arg("replay")
        .arg(&snapshot)
        .arg(&events)
        .args(["--cache-dir-name", "yacache"])
        .assert()
        .success();

    assert!(temp_dir.path().join("yacache").join("addresses.jsonl").exists());
    assert!(!temp_dir.path().join("cache").exists());
}
