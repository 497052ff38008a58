use kira_mvpa::decode::filter::{category_set, encode_labels, filter_baseline};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn filter_drops_baseline_and_keeps_alignment() {
    let labels = strings(&["rest", "face", "face", "rest", "house", "rest"]);
    let runs = vec![1, 1, 1, 2, 2, 2];
    let kept = filter_baseline(&labels, &runs, "rest").unwrap();
    assert_eq!(kept.labels, strings(&["face", "face", "house"]));
    assert_eq!(kept.runs, vec![1, 1, 2]);
    assert_eq!(kept.source, vec![1, 2, 4]);
}

#[test]
fn filter_is_idempotent() {
    let labels = strings(&["rest", "a", "b", "rest", "a", "c", "rest"]);
    let runs = vec![1, 1, 1, 2, 2, 2, 3];
    let once = filter_baseline(&labels, &runs, "rest").unwrap();
    let twice = filter_baseline(&once.labels, &once.runs, "rest").unwrap();
    assert_eq!(once.labels, twice.labels);
    assert_eq!(once.runs, twice.runs);
    assert_eq!(twice.source, (0..once.len()).collect::<Vec<_>>());
}

#[test]
fn filter_rejects_misaligned_inputs() {
    let labels = strings(&["a", "b"]);
    let err = filter_baseline(&labels, &[1], "rest").unwrap_err();
    assert!(err.to_string().contains("differ in length"));
}

#[test]
fn filter_rejects_all_baseline() {
    let labels = strings(&["rest", "rest"]);
    assert!(filter_baseline(&labels, &[1, 2], "rest").is_err());
}

#[test]
fn categories_are_sorted_and_encoded() {
    let labels = strings(&["house", "face", "cat", "face"]);
    let categories = category_set(&labels);
    assert_eq!(categories, strings(&["cat", "face", "house"]));
    assert_eq!(encode_labels(&labels, &categories).unwrap(), vec![2, 1, 0, 1]);
    assert!(encode_labels(&strings(&["dog"]), &categories).is_err());
}
