//! Exit-status tests for the command-line tools.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_extract_exits_1_without_config() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("extract-pulses")
        .unwrap()
        .arg("--base-dir")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config.json"));
    assert!(!dir.path().join("pulses.txt").exists());
}

#[test]
fn test_extract_warns_and_succeeds_on_bad_entries() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("data")).unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"data_folder_path": "data"}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("selections.json"),
        r#"[{"file_name": "ghost.npz", "selections": [{"start_index": 0, "end_index": 1}]}]"#,
    )
    .unwrap();

    Command::cargo_bin("extract-pulses")
        .unwrap()
        .arg("--base-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Done. Pulses written to:"))
        .stderr(predicate::str::contains("WARN").and(predicate::str::contains("ghost.npz")));

    let text = std::fs::read_to_string(dir.path().join("pulses.txt")).unwrap();
    assert_eq!(text, "time\tcurrent\tvoltage\n");
}

#[test]
fn test_sample_workspace_extracts_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("generate-sample")
        .unwrap()
        .args(["--files", "2", "--base-dir"])
        .arg(dir.path())
        .assert()
        .success();

    Command::cargo_bin("extract-pulses")
        .unwrap()
        .arg("--base-dir")
        .arg(dir.path())
        .assert()
        .success();

    let set = rusty_pulse::data::pulses::read_pulses(&dir.path().join("pulses.txt")).unwrap();
    // Four pulses plus one clamped tail range per recording.
    assert_eq!(set.len(), 10);
    assert_eq!(set.skipped_lines, 0);
    assert!(set.pulses.iter().all(|p| p.time[0] == 0.0));
}

#[test]
fn test_viewer_returns_cleanly_without_input() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("rusty-pulse")
        .unwrap()
        .arg("--base-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_viewer_returns_cleanly_on_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("pulses.txt");
    std::fs::write(&input, "time\tcurrent\tvoltage\n").unwrap();
    Command::cargo_bin("rusty-pulse")
        .unwrap()
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("No pulses found"));
}
