use kira_mvpa::glm::design::cosine_order;
use kira_mvpa::glm::hrf::{convolve, kernel, spm_hrf};
use kira_mvpa::glm::{GlmOutput, GlmParams, build_design, events_from_labels, fit_run, reduce_runs};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn block_labels(blocks: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for block in blocks {
        out.extend(["rest", "rest"].map(String::from));
        out.extend(std::iter::repeat_n(block.to_string(), 3));
    }
    out.extend(["rest", "rest"].map(String::from));
    out
}

fn categories() -> Vec<String> {
    ["cat", "face", "house"].map(String::from).to_vec()
}

#[test]
fn hrf_peaks_near_five_seconds_then_undershoots() {
    let samples: Vec<f64> = (0..320).map(|i| spm_hrf(i as f64 * 0.1)).collect();
    let peak = samples
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i as f64 * 0.1)
        .unwrap();
    assert!((4.0..=6.0).contains(&peak), "peak at {}", peak);
    assert!(spm_hrf(15.0) < 0.0);
    assert_eq!(spm_hrf(0.0), 0.0);
    assert_eq!(spm_hrf(-1.0), 0.0);
}

#[test]
fn kernel_is_normalized_and_convolution_is_causal() {
    let k = kernel(0.5);
    assert_eq!(k.len(), 64);
    assert!((k.iter().sum::<f64>() - 1.0).abs() < 1e-12);

    let mut impulse = vec![0.0; 80];
    impulse[3] = 2.0;
    let response = convolve(&impulse, &k);
    assert_eq!(response.len(), 80);
    assert!(response[..3].iter().all(|&v| v == 0.0));
    for (j, &kv) in k.iter().enumerate() {
        assert!((response[3 + j] - 2.0 * kv).abs() < 1e-15);
    }
    assert!(kernel(0.0).is_empty());
}

#[test]
fn events_come_from_label_blocks() {
    let labels = block_labels(&["face", "house", "cat"]);
    let events = events_from_labels(&labels, "rest", &categories(), 2.0).unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].category, 1);
    assert_eq!(events[0].onset, 4.0);
    assert_eq!(events[0].duration, 6.0);
    assert_eq!(events[2].category, 0);
    assert_eq!(events[2].onset, 24.0);

    let unknown = vec!["rest".to_string(), "dog".to_string()];
    assert!(events_from_labels(&unknown, "rest", &categories(), 2.0).is_err());
}

#[test]
fn design_has_conditions_drifts_and_constant() {
    let labels = block_labels(&["face", "house"]);
    let events = events_from_labels(&labels, "rest", &categories(), 2.0).unwrap();

    let design = build_design(labels.len(), 2.0, &events, &categories(), 0.1).unwrap();
    let drifts = cosine_order(labels.len(), 2.0, 0.1);
    assert_eq!(drifts, 4);
    assert_eq!(design.n_frames(), 12);
    assert_eq!(design.n_regressors(), 2 + drifts + 1);
    assert_eq!(design.columns[0], "face");
    assert_eq!(design.columns[1], "house");
    assert_eq!(design.columns.last().unwrap(), "constant");
    assert_eq!(design.conditions, vec![(1, 0), (2, 1)]);
    assert!(design.matrix.column(design.n_regressors() - 1).iter().all(|&v| v == 1.0));
    // the face regressor rises after its block starts
    assert!(design.matrix[[5, 0]] > design.matrix[[1, 0]]);

    assert_eq!(cosine_order(12, 2.0, 0.0), 0);
    assert!(build_design(1, 2.0, &[], &categories(), 0.01).is_err());
    assert!(build_design(10, 0.0, &[], &categories(), 0.01).is_err());
}

#[test]
fn ols_recovers_planted_betas() {
    let labels = block_labels(&["face", "house", "cat"]);
    let events = events_from_labels(&labels, "rest", &categories(), 2.0).unwrap();
    let design = build_design(labels.len(), 2.0, &events, &categories(), 0.01).unwrap();

    let p = design.n_regressors();
    let mut truth = Array2::<f64>::zeros((p, 2));
    for (i, (_, col)) in design.conditions.iter().enumerate() {
        truth[[*col, 0]] = i as f64 + 1.0;
        truth[[*col, 1]] = -2.0 * (i as f64 + 1.0);
    }
    truth[[p - 1, 0]] = 100.0;
    truth[[p - 1, 1]] = 50.0;
    let y = design.matrix.dot(&truth);

    let maps = fit_run(y.view(), &design, GlmOutput::Beta).unwrap();
    assert_eq!(maps.len(), 3);
    for (category, map) in &maps {
        let (_, col) = design.conditions.iter().find(|(c, _)| c == category).unwrap();
        assert!((map[0] - truth[[*col, 0]]).abs() < 1e-6);
        assert!((map[1] - truth[[*col, 1]]).abs() < 1e-6);
    }

    let tmaps = fit_run(y.view(), &design, GlmOutput::TStat).unwrap();
    for (_, map) in &tmaps {
        assert!(map.iter().all(|&t| t == 0.0 || t.abs() > 1e3));
    }
}

#[test]
fn tstat_scales_beta_by_its_standard_error() {
    let labels = block_labels(&["face", "house"]);
    let events = events_from_labels(&labels, "rest", &categories(), 2.0).unwrap();
    let design = build_design(labels.len(), 2.0, &events, &categories(), 0.01).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let noise: Array1<f64> = (0..labels.len()).map(|_| rng.random_range(-0.1..0.1)).collect();
    let signal = design.matrix.column(0).mapv(|v| 3.0 * v) + 10.0 + &noise;
    let y = signal.insert_axis(ndarray::Axis(1));

    let betas = fit_run(y.view(), &design, GlmOutput::Beta).unwrap();
    let tstats = fit_run(y.view(), &design, GlmOutput::TStat).unwrap();
    assert!(betas[0].1[0] > 2.0);
    assert!(tstats[0].1[0] > betas[0].1[0]);
    assert_eq!(betas[0].0, tstats[0].0);
}

#[test]
fn reduce_runs_emits_one_row_per_present_pair_and_skips_absent() {
    let mut labels = Vec::new();
    let mut runs = Vec::new();
    for run in 1..=3u32 {
        let blocks: &[&str] = if run == 3 {
            &["face", "house"]
        } else {
            &["face", "house", "cat"]
        };
        let run_labels = block_labels(blocks);
        runs.extend(std::iter::repeat_n(run, run_labels.len()));
        labels.extend(run_labels);
    }
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let y = Array2::from_shape_fn((labels.len(), 5), |_| 10.0 + rng.random_range(-1.0..1.0));

    let params = GlmParams {
        tr: 2.0,
        high_pass: 0.01,
        output: GlmOutput::Beta,
        baseline: "rest".to_string(),
    };
    let maps = reduce_runs(y.view(), &labels, &runs, &categories(), &params).unwrap();
    assert_eq!(maps.features.nrows(), 8);
    assert_eq!(maps.features.ncols(), 5);
    assert_eq!(maps.rows.len(), 8);
    let run3: Vec<usize> = maps.rows.iter().filter(|r| r.run == 3).map(|r| r.category).collect();
    assert_eq!(run3, vec![1, 2]);
    assert_eq!(maps.skipped.len(), 1);
    assert_eq!(maps.skipped[0].run, 3);
    assert_eq!(maps.skipped[0].category, "cat");

    assert!(reduce_runs(y.view(), &labels[1..], &runs[1..], &categories(), &params).is_err());
}

#[test]
fn trial_on_last_frame_is_skipped_not_fatal() {
    // Two runs of 20 frames: face at 4..8, a lone house frame at the very end.
    let mut labels = Vec::new();
    let mut runs = Vec::new();
    for run in 1..=2u32 {
        for frame in 0..20 {
            let label = match frame {
                4..=7 => "face",
                19 => "house",
                _ => "rest",
            };
            labels.push(label.to_string());
            runs.push(run);
        }
    }
    let cats = vec!["face".to_string(), "house".to_string()];

    let events = events_from_labels(&labels[..20], "rest", &cats, 2.0).unwrap();
    let design = build_design(20, 2.0, &events, &cats, 0.01).unwrap();
    assert_eq!(design.conditions.len(), 1);
    assert_eq!(design.conditions[0].0, 0);
    assert_eq!(design.unestimable, vec![1]);
    assert_eq!(design.columns[0], "face");

    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let y = Array2::from_shape_fn((labels.len(), 3), |_| 5.0 + rng.random_range(-1.0..1.0));
    let params = GlmParams {
        tr: 2.0,
        high_pass: 0.01,
        output: GlmOutput::TStat,
        baseline: "rest".to_string(),
    };
    let maps = reduce_runs(y.view(), &labels, &runs, &cats, &params).unwrap();
    assert_eq!(maps.rows.len(), 2);
    assert!(maps.rows.iter().all(|r| r.category == 0));
    let skipped: Vec<(u32, &str)> = maps
        .skipped
        .iter()
        .map(|s| (s.run, s.category.as_str()))
        .collect();
    assert_eq!(skipped, vec![(1, "house"), (2, "house")]);
}
