//! Tests that run the `tl` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tl() -> Command {
    Command::cargo_bin("tl").unwrap()
}

/// A workspace with a catalog of two targets and nothing selected.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("utils")).unwrap();
    std::fs::write(
        dir.path().join("utils/targets.json"),
        r#"[
            { "name": "uno", "info": "Arduino Uno", "device_url": "https://arduino.cc",
              "url": "https://example.com/uno", "branch": "main", "test_ignore": true },
            { "name": "microbit", "info": "BBC micro:bit", "url": "https://example.com/mb",
              "branch": "master" }
        ]"#,
    )
    .unwrap();
    dir
}

#[test]
fn help_flag_works() {
    tl().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("library repositories"));
}

#[test]
fn version_flag_works() {
    tl().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tl"));
}

#[test]
fn targets_lists_catalog() {
    let ws = workspace();
    tl().arg("--cwd")
        .arg(ws.path())
        .arg("targets")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "uno: Arduino Uno (https://arduino.cc)",
        ))
        .stdout(predicate::str::contains("microbit: BBC micro:bit"));
}

#[test]
fn select_writes_build_config() {
    let ws = workspace();
    std::fs::create_dir_all(ws.path().join("build")).unwrap();
    std::fs::write(ws.path().join("build/stale.o"), "").unwrap();

    tl().arg("--cwd")
        .arg(ws.path())
        .args(["select", "uno", "--dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected target 'uno'"));

    let text = std::fs::read_to_string(ws.path().join("build.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["target"]["name"], "uno");
    assert_eq!(json["target"]["dev"], true);
    assert_eq!(json["target"]["test_ignore"], true);
    assert!(json["target"].get("device_url").is_none());
    assert!(!ws.path().join("build/stale.o").exists());
}

#[test]
fn select_unknown_target_fails() {
    let ws = workspace();
    tl().arg("--cwd")
        .arg(ws.path())
        .args(["select", "zx81"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown target 'zx81'"));
    assert!(!ws.path().join("build.json").exists());
}

#[test]
fn status_without_selection_fails() {
    let ws = workspace();
    tl().arg("--cwd")
        .arg(ws.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no target selected"));
}

#[test]
fn status_reports_missing_target_checkout() {
    let ws = workspace();
    tl().arg("--cwd")
        .arg(ws.path())
        .args(["select", "microbit"])
        .assert()
        .success();

    tl().arg("--cwd")
        .arg(ws.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("microbit"));
}

#[test]
fn conflicting_bump_flags_are_rejected() {
    let ws = workspace();
    tl().arg("--cwd")
        .arg(ws.path())
        .args(["lock", "--major", "--branch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn completion_generates_script() {
    tl().args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tl"));
}
