use std::collections::BTreeSet;

use anyhow::{Context, Result, bail};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use tracing::{debug, info};

use crate::decode::SkippedPair;
use crate::glm::design::{DesignMatrix, build_design, events_from_labels};
use crate::math::linalg::Cholesky;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlmOutput {
    Beta,
    TStat,
}

impl GlmOutput {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beta => "beta",
            Self::TStat => "tstat",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlmParams {
    pub tr: f64,
    pub high_pass: f64,
    pub output: GlmOutput,
    pub baseline: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlmRow {
    pub run: u32,
    pub category: usize,
}

#[derive(Debug, Clone)]
pub struct GlmMaps {
    pub features: Array2<f64>,
    pub rows: Vec<GlmRow>,
    pub skipped: Vec<SkippedPair>,
}

/// OLS fit of one run. Returns one map per condition regressor, in design
/// order. With `TStat`, voxels with zero residual variance get 0.
pub fn fit_run(
    y: ArrayView2<'_, f64>,
    design: &DesignMatrix,
    output: GlmOutput,
) -> Result<Vec<(usize, Array1<f64>)>> {
    let x = &design.matrix;
    if y.nrows() != x.nrows() {
        bail!(
            "data has {} frames but design has {}",
            y.nrows(),
            x.nrows()
        );
    }
    let n = x.nrows();
    let p = x.ncols();
    let gram = x.t().dot(x);
    let chol = Cholesky::factor(gram.view()).context("design matrix is rank deficient")?;
    let xty = x.t().dot(&y);
    let betas = chol.solve(xty.view())?;

    let maps = match output {
        GlmOutput::Beta => design
            .conditions
            .iter()
            .map(|&(category, col)| (category, betas.row(col).to_owned()))
            .collect(),
        GlmOutput::TStat => {
            if n <= p {
                bail!(
                    "t statistics need more frames ({}) than regressors ({})",
                    n,
                    p
                );
            }
            let resid = &y - &x.dot(&betas);
            let sigma2: Array1<f64> =
                resid.map_axis(Axis(0), |c| c.dot(&c) / (n - p) as f64);
            let inv_diag = chol.inverse_diag();
            design
                .conditions
                .iter()
                .map(|&(category, col)| {
                    let beta = betas.row(col);
                    let t = beta
                        .iter()
                        .zip(sigma2.iter())
                        .map(|(&b, &s2)| {
                            let se = (s2 * inv_diag[col]).sqrt();
                            if se > 0.0 { b / se } else { 0.0 }
                        })
                        .collect::<Array1<f64>>();
                    (category, t)
                })
                .collect()
        }
    };
    Ok(maps)
}

/// Fits every run of a full (unfiltered) masked series. Rows come out in
/// run order, then category order. Categories without trials in a run, or
/// whose regressor vanishes at every frame, are skipped and reported, never
/// filled in.
pub fn reduce_runs(
    y: ArrayView2<'_, f64>,
    labels: &[String],
    runs: &[u32],
    categories: &[String],
    params: &GlmParams,
) -> Result<GlmMaps> {
    if y.nrows() != labels.len() || labels.len() != runs.len() {
        bail!(
            "series frames ({}), labels ({}) and runs ({}) must align",
            y.nrows(),
            labels.len(),
            runs.len()
        );
    }
    let run_ids: BTreeSet<u32> = runs.iter().copied().collect();
    let mut rows = Vec::new();
    let mut maps: Vec<Array1<f64>> = Vec::new();
    let mut skipped = Vec::new();

    for run in run_ids {
        let frames: Vec<usize> = (0..runs.len()).filter(|&i| runs[i] == run).collect();
        let run_labels: Vec<String> = frames.iter().map(|&i| labels[i].clone()).collect();
        let events = events_from_labels(&run_labels, &params.baseline, categories, params.tr)?;
        let design = build_design(frames.len(), params.tr, &events, categories, params.high_pass)
            .with_context(|| format!("failed to build design for run {}", run))?;
        let run_y = y.select(Axis(0), &frames);
        let fitted = fit_run(run_y.view(), &design, params.output)
            .with_context(|| format!("GLM fit failed for run {}", run))?;

        for (c, category) in categories.iter().enumerate() {
            if !design.conditions.iter().any(|&(dc, _)| dc == c) {
                if design.unestimable.contains(&c) {
                    info!(run, category = %category, "regressor vanishes at every frame; GLM map skipped");
                } else {
                    info!(run, category = %category, "no trials in run; GLM map skipped");
                }
                skipped.push(SkippedPair {
                    run,
                    category: category.clone(),
                });
            }
        }
        for (category, map) in fitted {
            rows.push(GlmRow { run, category });
            maps.push(map);
        }
        debug!(run, frames = frames.len(), regressors = design.n_regressors(), "run fitted");
    }

    if maps.is_empty() {
        bail!("GLM produced no maps; no run contains non-baseline trials");
    }
    let n_features = y.ncols();
    let mut features = Array2::<f64>::zeros((maps.len(), n_features));
    for (i, map) in maps.iter().enumerate() {
        features.row_mut(i).assign(map);
    }

    Ok(GlmMaps {
        features,
        rows,
        skipped,
    })
}
