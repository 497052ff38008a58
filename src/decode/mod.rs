pub mod cv;
pub mod filter;
pub mod folds;
pub mod permutation;
pub mod scale;
pub mod search;
pub mod svm;

use ndarray::Array2;

use crate::scores::InputKind;

/// A decodable sample set: one feature row per sample, aligned labels and runs.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub mask: String,
    pub mask_index: usize,
    pub kind: InputKind,
    pub features: Array2<f64>,
    pub targets: Vec<usize>,
    pub runs: Vec<u32>,
    pub skipped: Vec<SkippedPair>,
}

/// A (run, category) pair that produced no GLM map because the run has no trials of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPair {
    pub run: u32,
    pub category: String,
}
