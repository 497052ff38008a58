use std::collections::BTreeMap;

use anyhow::Result;
use ndarray::ArrayView2;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::decode::cv::{DecodeConfig, cross_validate};
use crate::math::stats::{mean, std_dev};

#[derive(Debug, Clone, PartialEq)]
pub struct PermutationSummary {
    pub observed: f64,
    pub null: Vec<f64>,
    pub null_mean: f64,
    pub null_std: f64,
    pub p_value: f64,
}

/// Shuffles labels among the samples of each run, leaving run membership intact.
pub fn permute_within_runs(y: &[usize], runs: &[u32], rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut by_run: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, &run) in runs.iter().enumerate() {
        by_run.entry(run).or_default().push(i);
    }
    let mut out = y.to_vec();
    for positions in by_run.values() {
        let mut values: Vec<usize> = positions.iter().map(|&i| y[i]).collect();
        values.shuffle(rng);
        for (&i, v) in positions.iter().zip(values) {
            out[i] = v;
        }
    }
    out
}

pub fn permutation_test(
    x: ArrayView2<'_, f64>,
    y: &[usize],
    runs: &[u32],
    categories: &[String],
    cfg: &DecodeConfig,
    observed: f64,
    n_permutations: usize,
    seed: u64,
) -> Result<PermutationSummary> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut null = Vec::with_capacity(n_permutations);
    for i in 0..n_permutations {
        let shuffled = permute_within_runs(y, runs, &mut rng);
        let outcome = cross_validate(x, &shuffled, runs, categories, cfg)?;
        let score = outcome.mean_accuracy();
        debug!(permutation = i, accuracy = score, "permutation scored");
        null.push(score);
    }

    let null_mean = mean(&null);
    let null_std = std_dev(&null, null_mean);
    let exceed = null.iter().filter(|&&s| s >= observed).count();
    let p_value = (exceed + 1) as f64 / (n_permutations + 1) as f64;

    Ok(PermutationSummary {
        observed,
        null,
        null_mean,
        null_std,
        p_value,
    })
}
