mod common;

use std::fs;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn validate_command_reports_shapes() {
    let tmp = TempDir::new().unwrap();
    common::write_dataset(tmp.path(), 3, 2);

    let mut cmd = Command::cargo_bin("kira-mvpa").unwrap();
    let output = cmd
        .arg("validate")
        .arg("--input")
        .arg(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("kira-mvpa validate ok"));
    assert!(text.contains("grid: 4x4x2"));
    assert!(text.contains("retained: 27/51"));
    assert!(text.contains("category face: 9"));
    assert!(text.contains("mask vt: 16 voxels, features 27x16"));
}

#[test]
fn validate_command_fails_on_missing_labels() {
    let tmp = TempDir::new().unwrap();
    common::write_dataset(tmp.path(), 2, 2);
    fs::remove_file(tmp.path().join("labels.txt")).unwrap();

    let mut cmd = Command::cargo_bin("kira-mvpa").unwrap();
    cmd.arg("validate").arg("--input").arg(tmp.path());
    cmd.assert().failure();
}

#[test]
fn folds_command_prints_diagram() {
    let tmp = TempDir::new().unwrap();
    let (labels, runs) = common::session(3);
    let path = tmp.path().join("labels.txt");
    common::write_labels(&path, &labels, &runs);

    let mut cmd = Command::cargo_bin("kira-mvpa").unwrap();
    let output = cmd.arg("folds").arg("--labels").arg(&path).output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "3 folds over 27 samples");
    assert_eq!(lines.len(), 5);
    assert!(lines[3].starts_with("  fold 1"));
    assert!(lines[3].contains(" . T ."));
}

#[test]
fn run_command_writes_outputs_and_summary() {
    let tmp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    common::write_dataset(tmp.path(), 3, 4);

    let mut cmd = Command::cargo_bin("kira-mvpa").unwrap();
    let output = cmd
        .arg("run")
        .arg("--input")
        .arg(tmp.path())
        .arg("--out")
        .arg(out.path())
        .args(["--mask", "vt", "--scale", "--c", "0.1,1", "--json", "--tsv"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.starts_with("kira-mvpa v"));
    assert!(text.contains("vt (raw): mean accuracy"));

    let v: Value = serde_json::from_slice(&fs::read(out.path().join("mvpa.json")).unwrap()).unwrap();
    assert_eq!(v["params"]["c_grid"], serde_json::json!([0.1, 1.0]));
    assert_eq!(v["params"]["scale"], true);
    assert_eq!(v["regions"].as_array().unwrap().len(), 1);
    assert!(out.path().join("scores.tsv").exists());
    assert!(out.path().join("confusion_vt_raw.tsv").exists());
    assert!(!out.path().join("weights").exists());
}

#[test]
fn run_command_rejects_unknown_mask() {
    let tmp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    common::write_dataset(tmp.path(), 2, 4);

    let mut cmd = Command::cargo_bin("kira-mvpa").unwrap();
    cmd.arg("run")
        .arg("--input")
        .arg(tmp.path())
        .arg("--out")
        .arg(out.path())
        .args(["--mask", "v1"]);
    cmd.assert().failure();
}
