use std::fs;

use kira_mvpa::io::dataset::{discover, nifti_stem, select_masks};
use kira_mvpa::io::labels::{parse_session_table, read_session_table};
use tempfile::TempDir;

#[test]
fn session_table_reads_aliases_and_extra_columns() {
    let text = "# session 1\nonset trial_type run\n0.0 rest 1\n2.5 face 1\n\n5.0 house 2\n";
    let table = parse_session_table(text, "labels.txt").unwrap();
    assert_eq!(table.labels, vec!["rest", "face", "house"]);
    assert_eq!(table.runs, vec![1, 1, 2]);
    let counts = table.run_counts();
    assert_eq!(counts.get(&1), Some(&2));
    assert_eq!(counts.get(&2), Some(&1));
}

#[test]
fn session_table_errors_name_the_line() {
    let err = parse_session_table("labels chunks\nface 1\nhouse\n", "t.txt").unwrap_err();
    assert!(err.to_string().contains("t.txt:3"));

    let err = parse_session_table("labels chunks\nface x\n", "t.txt").unwrap_err();
    assert!(err.to_string().contains("t.txt:2"));

    assert!(parse_session_table("labels onset\nface 1\n", "t.txt").is_err());
    assert!(parse_session_table("labels chunks\n", "t.txt").is_err());
    assert!(parse_session_table("", "t.txt").is_err());
}

#[test]
fn session_table_file_is_read() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("labels.txt");
    fs::write(&path, "labels chunks\nface 0\nrest 0\n").unwrap();
    let table = read_session_table(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert!(read_session_table(&tmp.path().join("missing.txt")).is_err());
}

#[test]
fn discovery_finds_bold_labels_and_sorted_masks() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    for name in [
        "bold.nii.gz",
        "labels.txt",
        "mask_vt.nii.gz",
        "mask_face_house.nii",
        "anat.nii",
        "mask_.nii",
    ] {
        fs::write(dir.join(name), b"").unwrap();
    }
    let files = discover(dir, None, None).unwrap();
    assert_eq!(files.bold, dir.join("bold.nii.gz"));
    assert_eq!(files.labels, dir.join("labels.txt"));
    let names: Vec<&str> = files.masks.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["face_house", "vt"]);

    let picked = select_masks(&files.masks, &["vt".to_string()]).unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].path, dir.join("mask_vt.nii.gz"));
    let err = select_masks(&files.masks, &["v1".to_string()]).unwrap_err();
    assert!(err.to_string().contains("available: face_house, vt"));
}

#[test]
fn discovery_accepts_single_bold_like_file_and_overrides() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("sub-1_task-objects_bold.nii"), b"").unwrap();
    fs::write(dir.join("labels.txt"), b"").unwrap();
    fs::write(dir.join("targets.txt"), b"").unwrap();
    let files = discover(dir, None, Some(&dir.join("targets.txt"))).unwrap();
    assert_eq!(files.bold, dir.join("sub-1_task-objects_bold.nii"));
    assert_eq!(files.labels, dir.join("targets.txt"));
    assert!(select_masks(&files.masks, &[]).is_err());
}

#[test]
fn discovery_fails_without_bold_or_labels() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("labels.txt"), b"").unwrap();
    assert!(discover(tmp.path(), None, None).is_err());

    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bold.nii"), b"").unwrap();
    assert!(discover(tmp.path(), None, None).is_err());
    assert!(discover(&tmp.path().join("nope"), None, None).is_err());
}

#[test]
fn nifti_stem_strips_both_suffixes() {
    assert_eq!(nifti_stem(std::path::Path::new("a/mask_vt.nii.gz")), Some("mask_vt"));
    assert_eq!(nifti_stem(std::path::Path::new("bold.nii")), Some("bold"));
    assert_eq!(nifti_stem(std::path::Path::new("labels.txt")), None);
}
