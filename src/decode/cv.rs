use anyhow::{Result, bail};
use ndarray::{Array2, ArrayView2, Axis};
use tracing::{debug, warn};

use crate::decode::folds::{Fold, LeaveOneRunOut};
use crate::decode::scale::Standardizer;
use crate::decode::search::{SearchOutcome, select_c};
use crate::decode::svm::{FitReport, LinearSvc, SvmParams};
use crate::scores::table::{accuracy, per_category_accuracy};
use crate::scores::{ConfusionMatrix, ScoreTable};

#[derive(Debug, Clone)]
pub struct DecodeConfig {
    pub svm: SvmParams,
    /// More than one value triggers nested search inside each training partition.
    pub c_grid: Vec<f64>,
    /// Standardize features per fold using training rows only.
    pub scale: bool,
    pub threads: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            svm: SvmParams::default(),
            c_grid: vec![1.0],
            scale: false,
            threads: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FoldOutcome {
    pub fold: usize,
    pub held_out: u32,
    pub n_train: usize,
    pub n_test: usize,
    pub accuracy: f64,
    pub per_category: Vec<Option<f64>>,
    pub c: f64,
    pub search: Option<SearchOutcome>,
    pub fit: FitReport,
    pub truth: Vec<usize>,
    pub predicted: Vec<usize>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CvOutcome {
    pub folds: Vec<FoldOutcome>,
    pub table: ScoreTable,
    pub confusion: ConfusionMatrix,
}

impl CvOutcome {
    pub fn mean_accuracy(&self) -> f64 {
        self.table.mean_accuracy()
    }
}

pub struct FittedModel {
    pub model: LinearSvc,
    pub scaler: Option<Standardizer>,
    pub fit: FitReport,
}

impl FittedModel {
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        match &self.scaler {
            Some(scaler) => {
                let xs = scaler.transform(x)?;
                self.model.predict(xs.view())
            }
            None => self.model.predict(x),
        }
    }
}

pub fn fit_model(
    x: ArrayView2<'_, f64>,
    y: &[usize],
    n_classes: usize,
    params: &SvmParams,
    scale: bool,
) -> Result<FittedModel> {
    let mut model = LinearSvc::new(params.clone());
    if scale {
        let scaler = Standardizer::fit(x)?;
        let xs = scaler.transform(x)?;
        let fit = model.fit(xs.view(), y, n_classes)?;
        Ok(FittedModel {
            model,
            scaler: Some(scaler),
            fit,
        })
    } else {
        let fit = model.fit(x, y, n_classes)?;
        Ok(FittedModel {
            model,
            scaler: None,
            fit,
        })
    }
}

pub fn cross_validate(
    x: ArrayView2<'_, f64>,
    y: &[usize],
    runs: &[u32],
    categories: &[String],
    cfg: &DecodeConfig,
) -> Result<CvOutcome> {
    if x.nrows() != y.len() || y.len() != runs.len() {
        bail!(
            "feature rows ({}), labels ({}) and runs ({}) must align",
            x.nrows(),
            y.len(),
            runs.len()
        );
    }
    if cfg.c_grid.is_empty() {
        bail!("C grid is empty");
    }
    let folds: Vec<Fold> = LeaveOneRunOut::new(runs)?.collect();
    let outcomes = run_folds(x, y, runs, categories.len(), cfg, folds)?;

    let mut table = ScoreTable::new(categories.to_vec());
    let mut confusion = ConfusionMatrix::new(categories.to_vec());
    for fold in &outcomes {
        table.push_fold(fold.held_out, fold.accuracy, &fold.per_category);
        confusion.add(&fold.truth, &fold.predicted)?;
    }
    Ok(CvOutcome {
        folds: outcomes,
        table,
        confusion,
    })
}

#[cfg(feature = "mt")]
fn run_folds(
    x: ArrayView2<'_, f64>,
    y: &[usize],
    runs: &[u32],
    n_classes: usize,
    cfg: &DecodeConfig,
    folds: Vec<Fold>,
) -> Result<Vec<FoldOutcome>> {
    use rayon::prelude::*;

    if cfg.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cfg.threads)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build thread pool: {}", e))?;
        return pool.install(|| {
            folds
                .into_par_iter()
                .map(|fold| run_fold(x, y, runs, n_classes, cfg, fold))
                .collect()
        });
    }
    folds
        .into_iter()
        .map(|fold| run_fold(x, y, runs, n_classes, cfg, fold))
        .collect()
}

#[cfg(not(feature = "mt"))]
fn run_folds(
    x: ArrayView2<'_, f64>,
    y: &[usize],
    runs: &[u32],
    n_classes: usize,
    cfg: &DecodeConfig,
    folds: Vec<Fold>,
) -> Result<Vec<FoldOutcome>> {
    folds
        .into_iter()
        .map(|fold| run_fold(x, y, runs, n_classes, cfg, fold))
        .collect()
}

fn run_fold(
    x: ArrayView2<'_, f64>,
    y: &[usize],
    runs: &[u32],
    n_classes: usize,
    cfg: &DecodeConfig,
    fold: Fold,
) -> Result<FoldOutcome> {
    if fold.train.is_empty() || fold.test.is_empty() {
        bail!("fold {} (run {}) has an empty partition", fold.index, fold.held_out);
    }
    let x_train: Array2<f64> = x.select(Axis(0), &fold.train);
    let y_train: Vec<usize> = fold.train.iter().map(|&i| y[i]).collect();
    let x_test: Array2<f64> = x.select(Axis(0), &fold.test);
    let truth: Vec<usize> = fold.test.iter().map(|&i| y[i]).collect();

    let mut warnings = Vec::new();
    let (c, search) = if cfg.c_grid.len() > 1 {
        let runs_train: Vec<u32> = fold.train.iter().map(|&i| runs[i]).collect();
        let outcome = select_c(x_train.view(), &y_train, &runs_train, n_classes, cfg)?;
        if outcome.fallback {
            warnings.push(format!(
                "fold {} (run {}): single training run, C search skipped",
                fold.index, fold.held_out
            ));
        }
        (outcome.c, Some(outcome))
    } else {
        (cfg.c_grid[0], None)
    };

    let params = cfg.svm.with_c(c);
    let fitted = fit_model(x_train.view(), &y_train, n_classes, &params, cfg.scale)?;
    if !fitted.fit.converged {
        warn!(
            fold = fold.index,
            held_out = fold.held_out,
            iterations = fitted.fit.iterations,
            "svm did not converge"
        );
        warnings.push(format!(
            "fold {} (run {}): svm did not converge after {} iterations",
            fold.index, fold.held_out, fitted.fit.iterations
        ));
    }
    let predicted = fitted.predict(x_test.view())?;
    let acc = accuracy(&truth, &predicted);
    debug!(fold = fold.index, held_out = fold.held_out, c, accuracy = acc, "fold scored");

    Ok(FoldOutcome {
        fold: fold.index,
        held_out: fold.held_out,
        n_train: fold.train.len(),
        n_test: fold.test.len(),
        accuracy: acc,
        per_category: per_category_accuracy(&truth, &predicted, n_classes),
        c,
        search,
        fit: fitted.fit,
        truth,
        predicted,
        warnings,
    })
}
