use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputMeta {
    pub grid: Option<[usize; 3]>,
    pub timepoints: Option<u64>,
    pub retained: Option<u64>,
    pub runs: Vec<u32>,
    pub categories: Vec<String>,
    pub baseline: String,
    pub tr: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    pub standardize: bool,
    pub scale: bool,
    pub c_grid: Vec<f64>,
    pub loss: String,
    pub max_iter: usize,
    pub tol: f64,
    pub glm: bool,
    pub glm_output: Option<String>,
    pub high_pass: f64,
    pub permutations: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub mean_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldReport {
    pub fold: usize,
    pub held_out_run: u32,
    pub n_train: usize,
    pub n_test: usize,
    pub accuracy: f64,
    pub c: f64,
    pub converged: bool,
    pub iterations: usize,
    pub per_category: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionReport {
    pub categories: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermutationReport {
    pub n: usize,
    pub observed: f64,
    pub null_mean: f64,
    pub null_std: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedReport {
    pub run: u32,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightMapReport {
    pub name: String,
    pub max_abs: f64,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionReport {
    pub mask: String,
    pub input: String,
    pub n_features: usize,
    pub n_samples: usize,
    pub chance: f64,
    pub mean_accuracy: f64,
    pub per_category: Vec<CategoryScore>,
    pub folds: Vec<FoldReport>,
    pub confusion: ConfusionReport,
    pub permutation: Option<PermutationReport>,
    pub final_c: Option<f64>,
    pub weight_maps: Vec<WeightMapReport>,
    pub glm_skipped: Vec<SkippedReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MvpaV1 {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub input_meta: InputMeta,
    pub params: Params,
    pub regions: Vec<RegionReport>,
    pub warnings: Vec<String>,
}

impl MvpaV1 {
    pub fn empty(tool_version: &str, baseline: &str) -> Self {
        Self {
            tool: "kira-mvpa".to_string(),
            version: tool_version.to_string(),
            schema_version: "v1".to_string(),
            input_meta: InputMeta {
                grid: None,
                timepoints: None,
                retained: None,
                runs: Vec::new(),
                categories: Vec::new(),
                baseline: baseline.to_string(),
                tr: None,
            },
            params: Params {
                standardize: false,
                scale: false,
                c_grid: Vec::new(),
                loss: String::new(),
                max_iter: 0,
                tol: 0.0,
                glm: false,
                glm_output: None,
                high_pass: 0.0,
                permutations: 0,
                seed: 0,
            },
            regions: Vec::new(),
            warnings: Vec::new(),
        }
    }
}
