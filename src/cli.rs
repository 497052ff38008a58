use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::decode::svm::Loss;
use crate::glm::GlmOutput;

#[derive(Debug, Parser)]
#[command(
    name = "kira-mvpa",
    version,
    about = "Leave-one-run-out MVPA decoding of fMRI sessions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Run(RunArgs),
    Validate(ValidateArgs),
    Folds(FoldsArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    #[arg(long, help = "Dataset directory (bold, labels.txt, mask_*.nii[.gz])")]
    pub input: PathBuf,

    #[arg(long, help = "Functional series override")]
    pub bold: Option<PathBuf>,

    #[arg(long, help = "Metadata table override")]
    pub labels: Option<PathBuf>,

    #[arg(long, help = "Region mask name (repeatable; default: all discovered)")]
    pub mask: Vec<String>,

    #[arg(long, default_value = crate::ctx::DEFAULT_BASELINE)]
    pub baseline: String,

    #[arg(long, default_value_t = false, help = "Z-score each voxel over time")]
    pub standardize: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(
        long,
        default_value_t = false,
        help = "Standardize features per fold (fit on training rows)"
    )]
    pub scale: bool,

    #[arg(
        long = "c",
        value_delimiter = ',',
        num_args = 1..,
        default_values_t = [1.0],
        help = "SVM C values; more than one triggers nested search"
    )]
    pub c: Vec<f64>,

    #[arg(long, value_enum, default_value_t = LossArg::SquaredHinge)]
    pub loss: LossArg,

    #[arg(long, default_value_t = 1000)]
    pub max_iter: usize,

    #[arg(long, default_value_t = 1e-4)]
    pub tol: f64,

    #[arg(long, default_value_t = false, help = "Also decode per-run GLM maps")]
    pub glm: bool,

    #[arg(long, value_enum, default_value_t = GlmOutputArg::Beta)]
    pub glm_output: GlmOutputArg,

    #[arg(long, help = "Repetition time in seconds (default: header, else 2.5)")]
    pub tr: Option<f64>,

    #[arg(long, default_value_t = crate::ctx::DEFAULT_HIGH_PASS)]
    pub high_pass: f64,

    #[arg(long, default_value_t = 0)]
    pub permutations: usize,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[arg(long, default_value_t = false, help = "Write weight maps as NIfTI")]
    pub weights: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub tsv: bool,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct FoldsArgs {
    #[arg(long, help = "Metadata table")]
    pub labels: PathBuf,

    #[arg(long, default_value = crate::ctx::DEFAULT_BASELINE)]
    pub baseline: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LossArg {
    Hinge,
    SquaredHinge,
}

impl From<LossArg> for Loss {
    fn from(value: LossArg) -> Self {
        match value {
            LossArg::Hinge => Loss::Hinge,
            LossArg::SquaredHinge => Loss::SquaredHinge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GlmOutputArg {
    Beta,
    Tstat,
}

impl From<GlmOutputArg> for GlmOutput {
    fn from(value: GlmOutputArg) -> Self {
        match value {
            GlmOutputArg::Beta => GlmOutput::Beta,
            GlmOutputArg::Tstat => GlmOutput::TStat,
        }
    }
}
