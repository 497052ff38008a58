#![allow(dead_code)]

use std::fs;
use std::path::Path;

use kira_mvpa::io::nifti::{Spatial, write_nifti};
use kira_mvpa::volume::Grid3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const CATEGORIES: [&str; 3] = ["cat", "face", "house"];
pub const GRID: Grid3 = Grid3 {
    nx: 4,
    ny: 4,
    nz: 2,
};
pub const TR: f32 = 2.0;

/// Per-run block layout: rest, face, rest, house, rest, cat, rest.
pub fn run_labels() -> Vec<&'static str> {
    let mut out = Vec::new();
    for block in ["face", "house", "cat"] {
        out.extend(["rest", "rest"]);
        out.extend([block; 3]);
    }
    out.extend(["rest", "rest"]);
    out
}

pub fn session(n_runs: u32) -> (Vec<String>, Vec<u32>) {
    let mut labels = Vec::new();
    let mut runs = Vec::new();
    for run in 1..=n_runs {
        for label in run_labels() {
            labels.push(label.to_string());
            runs.push(run);
        }
    }
    (labels, runs)
}

/// The first 16 voxels form the informative region: voxel v responds to
/// category k when v % 3 == k. The rest is noise only.
pub fn synthetic_series(labels: &[String], seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_vox = GRID.n_voxels();
    let mut data = Vec::with_capacity(n_vox * labels.len());
    for label in labels {
        let category = CATEGORIES.iter().position(|c| *c == label.as_str());
        for v in 0..n_vox {
            let mut value = 10.0 + rng.random_range(-0.5f32..0.5);
            if let Some(k) = category {
                if v < 16 && v % 3 == k {
                    value += 2.0;
                }
            }
            data.push(value);
        }
    }
    data
}

pub fn write_labels(path: &Path, labels: &[String], runs: &[u32]) {
    let mut text = String::from("labels chunks\n");
    for (label, run) in labels.iter().zip(runs) {
        text.push_str(&format!("{} {}\n", label, run));
    }
    fs::write(path, text).unwrap();
}

pub fn spatial_with_tr() -> Spatial {
    let mut spatial = Spatial::default();
    spatial.pixdim[4] = TR;
    spatial.xyzt_units = 2 | 8;
    spatial
}

/// Writes bold.nii.gz, labels.txt, mask_vt.nii.gz and mask_noise.nii.gz.
pub fn write_dataset(dir: &Path, n_runs: u32, seed: u64) {
    let (labels, runs) = session(n_runs);
    let data = synthetic_series(&labels, seed);
    write_nifti(
        &dir.join("bold.nii.gz"),
        GRID,
        labels.len(),
        &data,
        &spatial_with_tr(),
    )
    .unwrap();
    write_labels(&dir.join("labels.txt"), &labels, &runs);

    let n_vox = GRID.n_voxels();
    let vt: Vec<f32> = (0..n_vox).map(|v| if v < 16 { 1.0 } else { 0.0 }).collect();
    let noise: Vec<f32> = (0..n_vox).map(|v| if v >= 16 { 1.0 } else { 0.0 }).collect();
    write_nifti(&dir.join("mask_vt.nii.gz"), GRID, 1, &vt, &Spatial::default()).unwrap();
    write_nifti(&dir.join("mask_noise.nii"), GRID, 1, &noise, &Spatial::default()).unwrap();
}
