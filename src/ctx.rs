use std::path::PathBuf;

use crate::decode::FeatureSet;
use crate::decode::cv::DecodeConfig;
use crate::decode::filter::Retained;
use crate::glm::GlmOutput;
use crate::io::dataset::DatasetFiles;
use crate::io::labels::SessionTable;
use crate::io::nifti::Spatial;
use crate::schema::v1::MvpaV1;
use crate::scores::RegionResult;
use crate::volume::{Mask, Series4};

pub const DEFAULT_BASELINE: &str = "rest";
pub const DEFAULT_TR: f64 = 2.5;
pub const DEFAULT_HIGH_PASS: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct GlmSettings {
    pub enabled: bool,
    pub output: GlmOutput,
    pub tr_override: Option<f64>,
    pub high_pass: f64,
}

impl Default for GlmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            output: GlmOutput::Beta,
            tr_override: None,
            high_pass: DEFAULT_HIGH_PASS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub json_path: PathBuf,
    pub scores_tsv: PathBuf,
    pub folds_tsv: PathBuf,
    pub regions_tsv: PathBuf,
    pub weights_dir: PathBuf,
}

impl OutputPaths {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            json_path: out_dir.join("mvpa.json"),
            scores_tsv: out_dir.join("scores.tsv"),
            folds_tsv: out_dir.join("folds.tsv"),
            regions_tsv: out_dir.join("region_accuracy.tsv"),
            weights_dir: out_dir.join("weights"),
            out_dir,
        }
    }

    pub fn confusion_tsv(&self, mask: &str, kind: &str) -> PathBuf {
        self.out_dir.join(format!("confusion_{}_{}.tsv", mask, kind))
    }
}

#[derive(Debug)]
pub struct Ctx {
    pub input: PathBuf,
    pub bold_override: Option<PathBuf>,
    pub labels_override: Option<PathBuf>,
    pub mask_names: Vec<String>,
    pub baseline: String,
    pub standardize: bool,
    pub decode: DecodeConfig,
    pub glm: GlmSettings,
    pub permutations: usize,
    pub seed: u64,
    pub write_weights: bool,
    pub write_json: bool,
    pub write_tsv: bool,
    pub files: Option<DatasetFiles>,
    pub session: Option<SessionTable>,
    pub series: Option<Series4>,
    pub spatial: Spatial,
    pub header_tr: Option<f64>,
    pub tr: Option<f64>,
    pub masks: Vec<Mask>,
    pub retained: Option<Retained>,
    pub categories: Vec<String>,
    pub targets: Vec<usize>,
    pub feature_sets: Vec<FeatureSet>,
    pub results: Vec<RegionResult>,
    pub warnings: Vec<String>,
    pub output: OutputPaths,
    pub report: MvpaV1,
}

impl Ctx {
    pub fn new(input: PathBuf, out_dir: PathBuf, tool_version: &str) -> Self {
        Self {
            input,
            bold_override: None,
            labels_override: None,
            mask_names: Vec::new(),
            baseline: DEFAULT_BASELINE.to_string(),
            standardize: false,
            decode: DecodeConfig::default(),
            glm: GlmSettings::default(),
            permutations: 0,
            seed: 0,
            write_weights: false,
            write_json: false,
            write_tsv: false,
            files: None,
            session: None,
            series: None,
            spatial: Spatial::default(),
            header_tr: None,
            tr: None,
            masks: Vec::new(),
            retained: None,
            categories: Vec::new(),
            targets: Vec::new(),
            feature_sets: Vec::new(),
            results: Vec::new(),
            warnings: Vec::new(),
            output: OutputPaths::new(out_dir),
            report: MvpaV1::empty(tool_version, DEFAULT_BASELINE),
        }
    }

    pub fn mask(&self, index: usize) -> anyhow::Result<&Mask> {
        self.masks
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("mask index {} out of range", index))
    }

    pub fn distinct_runs(&self) -> Vec<u32> {
        let mut runs = self
            .retained
            .as_ref()
            .map(|r| r.runs.clone())
            .unwrap_or_default();
        runs.sort_unstable();
        runs.dedup();
        runs
    }
}
