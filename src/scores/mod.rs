pub mod confusion;
pub mod table;

use std::path::PathBuf;

use crate::decode::SkippedPair;
use crate::decode::cv::CvOutcome;
use crate::decode::permutation::PermutationSummary;

pub use confusion::ConfusionMatrix;
pub use table::ScoreTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Raw,
    Glm,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Glm => "glm",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeightMap {
    pub name: String,
    pub coef: Vec<f64>,
    pub file: Option<PathBuf>,
}

impl WeightMap {
    pub fn max_abs(&self) -> f64 {
        self.coef.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }
}

#[derive(Debug, Clone)]
pub struct RegionResult {
    pub mask: String,
    pub kind: InputKind,
    pub n_features: usize,
    pub n_samples: usize,
    pub cv: CvOutcome,
    pub permutation: Option<PermutationSummary>,
    pub final_c: Option<f64>,
    pub weights: Vec<WeightMap>,
    pub skipped: Vec<SkippedPair>,
}

impl RegionResult {
    pub fn label(&self) -> String {
        format!("{} ({})", self.mask, self.kind.as_str())
    }
}
