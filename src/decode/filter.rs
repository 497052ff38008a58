use std::collections::BTreeSet;

use anyhow::{Result, bail};

/// Non-baseline samples with their original positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retained {
    pub labels: Vec<String>,
    pub runs: Vec<u32>,
    pub source: Vec<usize>,
}

impl Retained {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub fn filter_baseline(labels: &[String], runs: &[u32], baseline: &str) -> Result<Retained> {
    if labels.len() != runs.len() {
        bail!(
            "labels ({}) and runs ({}) differ in length",
            labels.len(),
            runs.len()
        );
    }
    let mut out = Retained {
        labels: Vec::new(),
        runs: Vec::new(),
        source: Vec::new(),
    };
    for (i, (label, &run)) in labels.iter().zip(runs.iter()).enumerate() {
        if label == baseline {
            continue;
        }
        out.labels.push(label.clone());
        out.runs.push(run);
        out.source.push(i);
    }
    if out.is_empty() {
        bail!("no samples left after removing baseline label '{}'", baseline);
    }
    Ok(out)
}

/// Sorted distinct labels.
pub fn category_set(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn encode_labels(labels: &[String], categories: &[String]) -> Result<Vec<usize>> {
    labels
        .iter()
        .map(|l| match categories.binary_search(l) {
            Ok(i) => Ok(i),
            Err(_) => bail!("label '{}' is not a known category", l),
        })
        .collect()
}
