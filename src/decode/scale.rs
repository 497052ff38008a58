use anyhow::{Result, bail};
use ndarray::{Array2, ArrayView2, Axis};

use crate::math::stats::{STD_EPS, column_mean_std};

/// Per-column centering and scaling learned from one set of rows and applied
/// to others.
#[derive(Debug, Clone)]
pub struct Standardizer {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Standardizer {
    pub fn fit(x: ArrayView2<'_, f64>) -> Result<Self> {
        if x.nrows() == 0 {
            bail!("cannot fit a standardizer on zero rows");
        }
        let mut mean = Vec::with_capacity(x.ncols());
        let mut scale = Vec::with_capacity(x.ncols());
        for column in x.axis_iter(Axis(1)) {
            let (m, s) = column_mean_std(column);
            mean.push(m);
            scale.push(if s <= STD_EPS { 1.0 } else { s });
        }
        Ok(Self { mean, scale })
    }

    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            bail!(
                "standardizer fitted on {} columns, got {}",
                self.mean.len(),
                x.ncols()
            );
        }
        let mut out = x.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let m = self.mean[j];
            let s = self.scale[j];
            column.mapv_inplace(|v| (v - m) / s);
        }
        Ok(out)
    }
}
