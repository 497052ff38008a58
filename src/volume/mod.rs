//! Voxel grids, 4-D functional series and region masks.
//!
//! Voxel order is x fastest, then y, then z; a series stores one contiguous
//! block of `grid.n_voxels()` values per timepoint.

use anyhow::{Result, bail};
use ndarray::Array2;

use crate::math::stats::zscore_columns;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid3 {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl Grid3 {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    pub fn n_voxels(&self) -> usize {
        self.nx * self.ny * self.nz
    }
}

impl std::fmt::Display for Grid3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

#[derive(Debug, Clone)]
pub struct Series4 {
    pub grid: Grid3,
    pub n_t: usize,
    data: Vec<f32>,
}

impl Series4 {
    pub fn new(grid: Grid3, n_t: usize, data: Vec<f32>) -> Result<Self> {
        let expected = grid.n_voxels() * n_t;
        if data.len() != expected {
            bail!(
                "series data length {} does not match {} grid x {} timepoints",
                data.len(),
                grid,
                n_t
            );
        }
        Ok(Self { grid, n_t, data })
    }

    pub fn frame(&self, t: usize) -> &[f32] {
        let n = self.grid.n_voxels();
        &self.data[t * n..(t + 1) * n]
    }
}

#[derive(Debug, Clone)]
pub struct Mask {
    pub name: String,
    pub grid: Grid3,
    pub voxels: Vec<usize>,
}

impl Mask {
    /// Any non-zero, non-NaN value is inside the mask.
    pub fn from_values(name: &str, grid: Grid3, values: &[f32]) -> Result<Self> {
        if values.len() != grid.n_voxels() {
            bail!(
                "mask '{}' has {} values, expected {} for grid {}",
                name,
                values.len(),
                grid.n_voxels(),
                grid
            );
        }
        let voxels: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0 && !v.is_nan())
            .map(|(i, _)| i)
            .collect();
        if voxels.is_empty() {
            bail!("mask '{}' selects no voxels", name);
        }
        Ok(Self {
            name: name.to_string(),
            grid,
            voxels,
        })
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}

pub fn mask_series(series: &Series4, mask: &Mask, standardize: bool) -> Result<Array2<f64>> {
    let frames: Vec<usize> = (0..series.n_t).collect();
    mask_frames(series, &frames, mask, standardize)
}

/// Feature matrix with one row per selected frame and one column per mask voxel.
pub fn mask_frames(
    series: &Series4,
    frames: &[usize],
    mask: &Mask,
    standardize: bool,
) -> Result<Array2<f64>> {
    if mask.grid != series.grid {
        bail!(
            "mask '{}' grid {} does not match functional grid {}",
            mask.name,
            mask.grid,
            series.grid
        );
    }
    let mut out = Array2::<f64>::zeros((frames.len(), mask.len()));
    for (row, &t) in frames.iter().enumerate() {
        if t >= series.n_t {
            bail!("frame {} out of range ({} timepoints)", t, series.n_t);
        }
        let frame = series.frame(t);
        let mut dst = out.row_mut(row);
        for (col, &voxel) in mask.voxels.iter().enumerate() {
            let v = frame[voxel];
            if v.is_nan() {
                bail!("NaN in functional data at frame {} voxel {}", t, voxel);
            }
            dst[col] = v as f64;
        }
    }
    if standardize {
        zscore_columns(&mut out);
    }
    Ok(out)
}

/// Maps per-voxel values back onto the full grid; voxels outside the mask are zero.
pub fn unmask(values: &[f64], mask: &Mask) -> Result<Vec<f32>> {
    if values.len() != mask.len() {
        bail!(
            "cannot unmask {} values with mask '{}' of {} voxels",
            values.len(),
            mask.name,
            mask.len()
        );
    }
    let mut out = vec![0.0f32; mask.grid.n_voxels()];
    for (&voxel, &v) in mask.voxels.iter().zip(values.iter()) {
        out[voxel] = v as f32;
    }
    Ok(out)
}
