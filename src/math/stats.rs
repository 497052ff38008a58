//! Column statistics over feature matrices.
//!
//! Standard deviations are population (ddof = 0) throughout.

use ndarray::{Array2, ArrayView1, Axis};

/// Columns with a standard deviation at or below this are treated as constant.
pub const STD_EPS: f64 = 1e-12;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64], mean_val: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - mean_val) * (v - mean_val)).sum();
    (ss / values.len() as f64).sqrt()
}

pub fn column_mean_std(column: ArrayView1<'_, f64>) -> (f64, f64) {
    let n = column.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let m = column.sum() / n as f64;
    let ss: f64 = column.iter().map(|v| (v - m) * (v - m)).sum();
    (m, (ss / n as f64).sqrt())
}

/// Z-scores every column in place. Constant columns become all zero.
pub fn zscore_columns(x: &mut Array2<f64>) {
    for mut column in x.axis_iter_mut(Axis(1)) {
        let (m, s) = column_mean_std(column.view());
        if s <= STD_EPS {
            column.fill(0.0);
        } else {
            column.mapv_inplace(|v| (v - m) / s);
        }
    }
}
