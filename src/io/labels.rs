use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

const LABEL_COLUMNS: &[&str] = &["labels", "label", "category", "trial_type"];
const RUN_COLUMNS: &[&str] = &["chunks", "chunk", "run", "runs"];

/// Per-volume stimulus label and run id, positionally aligned with the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTable {
    pub labels: Vec<String>,
    pub runs: Vec<u32>,
}

impl SessionTable {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Volume count per run, ascending by run id.
    pub fn run_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for &run in &self.runs {
            *counts.entry(run).or_insert(0) += 1;
        }
        counts
    }
}

pub fn read_session_table(path: &Path) -> Result<SessionTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read labels table {}", path.display()))?;
    parse_session_table(&content, &path.display().to_string())
}

pub fn parse_session_table(content: &str, source: &str) -> Result<SessionTable> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'));

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("{}: labels table is empty", source))?;
    let header: Vec<&str> = header_line.split_whitespace().collect();
    let label_col = find_column(&header, LABEL_COLUMNS)
        .ok_or_else(|| anyhow::anyhow!("{}: header has no label column ({})", source, LABEL_COLUMNS.join("/")))?;
    let run_col = find_column(&header, RUN_COLUMNS)
        .ok_or_else(|| anyhow::anyhow!("{}: header has no run column ({})", source, RUN_COLUMNS.join("/")))?;

    let mut labels = Vec::new();
    let mut runs = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != header.len() {
            bail!(
                "{}:{} expected {} columns, found {}",
                source,
                line_no,
                header.len(),
                parts.len()
            );
        }
        let run: u32 = parts[run_col]
            .parse()
            .with_context(|| format!("{}:{} invalid run id '{}'", source, line_no, parts[run_col]))?;
        labels.push(parts[label_col].to_string());
        runs.push(run);
    }

    if labels.is_empty() {
        bail!("{}: labels table has a header but no rows", source);
    }

    Ok(SessionTable { labels, runs })
}

fn find_column(header: &[&str], names: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}
