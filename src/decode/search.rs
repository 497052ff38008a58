use anyhow::Result;
use ndarray::{ArrayView2, Axis};
use tracing::debug;

use crate::decode::cv::{DecodeConfig, fit_model};
use crate::decode::folds::LeaveOneRunOut;
use crate::scores::table::accuracy;

#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub c: f64,
    pub mean_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub c: f64,
    pub grid: Vec<GridPoint>,
    /// The partition had a single run, so the first grid value was used.
    pub fallback: bool,
}

/// Picks C by leave-one-run-out over the given training partition only.
/// Ties go to the smaller C.
pub fn select_c(
    x: ArrayView2<'_, f64>,
    y: &[usize],
    runs: &[u32],
    n_classes: usize,
    cfg: &DecodeConfig,
) -> Result<SearchOutcome> {
    let inner = match LeaveOneRunOut::new(runs) {
        Ok(folds) => folds.collect::<Vec<_>>(),
        Err(_) => {
            return Ok(SearchOutcome {
                c: cfg.c_grid[0],
                grid: Vec::new(),
                fallback: true,
            });
        }
    };

    let mut grid = Vec::with_capacity(cfg.c_grid.len());
    for &c in &cfg.c_grid {
        let params = cfg.svm.with_c(c);
        let mut total = 0.0;
        for fold in &inner {
            let x_train = x.select(Axis(0), &fold.train);
            let y_train: Vec<usize> = fold.train.iter().map(|&i| y[i]).collect();
            let x_test = x.select(Axis(0), &fold.test);
            let truth: Vec<usize> = fold.test.iter().map(|&i| y[i]).collect();
            let fitted = fit_model(x_train.view(), &y_train, n_classes, &params, cfg.scale)?;
            let predicted = fitted.predict(x_test.view())?;
            total += accuracy(&truth, &predicted);
        }
        let mean_accuracy = total / inner.len() as f64;
        debug!(c, mean_accuracy, "inner grid point");
        grid.push(GridPoint { c, mean_accuracy });
    }

    let mut best = &grid[0];
    for point in &grid[1..] {
        let better = point.mean_accuracy > best.mean_accuracy
            || (point.mean_accuracy == best.mean_accuracy && point.c < best.c);
        if better {
            best = point;
        }
    }

    let c = best.c;
    Ok(SearchOutcome {
        c,
        grid,
        fallback: false,
    })
}
