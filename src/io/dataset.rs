use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub const LABELS_FILE: &str = "labels.txt";
pub const MASK_PREFIX: &str = "mask_";

#[derive(Debug, Clone)]
pub struct DatasetFiles {
    pub bold: PathBuf,
    pub labels: PathBuf,
    pub masks: Vec<MaskFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskFile {
    pub name: String,
    pub path: PathBuf,
}

/// Stem of a `.nii` / `.nii.gz` file name, `None` for anything else.
pub fn nifti_stem(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    name.strip_suffix(".nii.gz")
        .or_else(|| name.strip_suffix(".nii"))
}

pub fn discover(
    dir: &Path,
    bold_override: Option<&Path>,
    labels_override: Option<&Path>,
) -> Result<DatasetFiles> {
    if !dir.is_dir() {
        bail!("input {} is not a directory", dir.display());
    }
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    let bold = match bold_override {
        Some(p) => p.to_path_buf(),
        None => find_bold(&entries).with_context(|| {
            format!("missing bold.nii or bold.nii.gz in {}", dir.display())
        })?,
    };
    if !bold.is_file() {
        bail!("functional series {} not found", bold.display());
    }

    let labels = match labels_override {
        Some(p) => p.to_path_buf(),
        None => dir.join(LABELS_FILE),
    };
    if !labels.is_file() {
        bail!("labels table {} not found", labels.display());
    }

    let masks: Vec<MaskFile> = entries
        .iter()
        .filter_map(|p| {
            let stem = nifti_stem(p)?;
            let name = stem.strip_prefix(MASK_PREFIX)?;
            if name.is_empty() {
                return None;
            }
            Some(MaskFile {
                name: name.to_string(),
                path: p.clone(),
            })
        })
        .collect();

    Ok(DatasetFiles {
        bold,
        labels,
        masks,
    })
}

fn find_bold(entries: &[PathBuf]) -> Option<PathBuf> {
    if let Some(p) = entries.iter().find(|p| nifti_stem(p) == Some("bold")) {
        return Some(p.clone());
    }
    let candidates: Vec<&PathBuf> = entries
        .iter()
        .filter(|p| nifti_stem(p).is_some_and(|s| s.contains("bold")))
        .collect();
    if candidates.len() == 1 {
        Some(candidates[0].clone())
    } else {
        None
    }
}

/// Keeps the requested masks in request order; an unknown name is an error.
pub fn select_masks(available: &[MaskFile], requested: &[String]) -> Result<Vec<MaskFile>> {
    if available.is_empty() {
        bail!("no {}<name>.nii[.gz] mask files found", MASK_PREFIX);
    }
    if requested.is_empty() {
        return Ok(available.to_vec());
    }
    let mut out = Vec::with_capacity(requested.len());
    for name in requested {
        match available.iter().find(|m| &m.name == name) {
            Some(m) => out.push(m.clone()),
            None => {
                let names: Vec<&str> = available.iter().map(|m| m.name.as_str()).collect();
                bail!("mask '{}' not found (available: {})", name, names.join(", "));
            }
        }
    }
    Ok(out)
}
