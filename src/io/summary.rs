use anyhow::{Result, bail};

use crate::ctx::Ctx;
use crate::decode::folds::LeaveOneRunOut;

pub fn format_summary(ctx: &Ctx) -> Result<String> {
    let version = env!("CARGO_PKG_VERSION");
    let retained = ctx
        .retained
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("baseline filter not applied"))?;
    if ctx.results.is_empty() {
        bail!("no decoding results to summarize");
    }
    let grid = ctx
        .series
        .as_ref()
        .map(|s| s.grid.to_string())
        .unwrap_or_else(|| "?".to_string());

    let mut out = String::new();
    out.push_str(&format!("kira-mvpa v{}\n", version));
    out.push_str(&format!(
        "Input: grid={}, {} samples, {} runs, {} categories\n",
        grid,
        retained.len(),
        ctx.distinct_runs().len(),
        ctx.categories.len()
    ));
    out.push_str(&format!("Chance: {:.3}\n", 1.0 / ctx.categories.len() as f64));

    for result in &ctx.results {
        let table = &result.cv.table;
        out.push_str(&format!(
            "{}: mean accuracy {:.3} ({} features, {} samples)\n",
            result.label(),
            table.mean_accuracy(),
            result.n_features,
            result.n_samples
        ));
        for (i, category) in table.categories.iter().enumerate() {
            match table.category_mean(i) {
                Some(acc) => out.push_str(&format!("  {:<16} {:.3}\n", category, acc)),
                None => out.push_str(&format!("  {:<16} NA\n", category)),
            }
        }
        if let Some(perm) = &result.permutation {
            out.push_str(&format!(
                "  permutation: n={} null mean {:.3} p={:.4}\n",
                perm.null.len(),
                perm.null_mean,
                perm.p_value
            ));
        }
    }

    Ok(out)
}

/// Text fold diagram: one row per fold, one column per run, `T` = test and
/// `.` = train.
pub fn format_fold_diagram(runs: &[u32]) -> Result<String> {
    let splitter = LeaveOneRunOut::new(runs)?;
    let groups = splitter.groups().to_vec();
    let width = groups
        .iter()
        .map(|g| g.to_string().len())
        .max()
        .unwrap_or(1);

    let mut out = String::new();
    out.push_str(&format!("{} folds over {} samples\n", groups.len(), runs.len()));
    out.push_str(&format!("{:>8} ", "run"));
    for g in &groups {
        out.push_str(&format!(" {:>width$}", g, width = width));
    }
    out.push_str("  n_train n_test\n");
    for fold in splitter {
        out.push_str(&format!("{:>8} ", format!("fold {}", fold.index)));
        for &g in &groups {
            let cell = if g == fold.held_out { "T" } else { "." };
            out.push_str(&format!(" {:>width$}", cell, width = width));
        }
        out.push_str(&format!("  {:>7} {:>6}\n", fold.train.len(), fold.test.len()));
    }
    Ok(out)
}
