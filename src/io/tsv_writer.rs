use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::Ctx;
use crate::decode::folds::LeaveOneRunOut;
use crate::scores::ConfusionMatrix;

fn create(path: &Path) -> Result<BufWriter<std::fs::File>> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// One line per (region, input, fold, category); untested cells are `NA`.
pub fn write_scores(path: &Path, ctx: &Ctx) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "region\tinput\tfold\theld_out_run\tcategory\taccuracy")?;
    for result in &ctx.results {
        let table = &result.cv.table;
        for fold in 0..table.n_folds() {
            for (c, category) in table.categories.iter().enumerate() {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    result.mask,
                    result.kind.as_str(),
                    fold,
                    table.held_out[fold],
                    category,
                    fmt_opt(table.get(c, fold))
                )?;
            }
        }
    }
    w.flush()?;
    Ok(())
}

/// Fold diagram: one line per fold, one column per run, `test`/`train`.
pub fn write_folds(path: &Path, ctx: &Ctx) -> Result<()> {
    let retained = ctx
        .retained
        .as_ref()
        .context("baseline filter not applied")?;
    let splitter = LeaveOneRunOut::new(&retained.runs)?;
    let groups = splitter.groups().to_vec();

    let mut w = create(path)?;
    let header: Vec<String> = groups.iter().map(|g| format!("run_{}", g)).collect();
    writeln!(w, "fold\tn_train\tn_test\t{}", header.join("\t"))?;
    for fold in splitter {
        let cells: Vec<&str> = groups
            .iter()
            .map(|&g| if g == fold.held_out { "test" } else { "train" })
            .collect();
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            fold.index,
            fold.train.len(),
            fold.test.len(),
            cells.join("\t")
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_region_accuracy(path: &Path, ctx: &Ctx) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "region\tinput\tn_features\tn_samples\tmean_accuracy\tchance\tp_value")?;
    for result in &ctx.results {
        let table = &result.cv.table;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{:.6}\t{:.6}\t{}",
            result.mask,
            result.kind.as_str(),
            result.n_features,
            result.n_samples,
            table.mean_accuracy(),
            table.chance(),
            fmt_opt(result.permutation.as_ref().map(|p| p.p_value))
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_confusion(path: &Path, confusion: &ConfusionMatrix) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "true\\predicted\t{}", confusion.categories.join("\t"))?;
    for (i, category) in confusion.categories.iter().enumerate() {
        let counts: Vec<String> = confusion
            .counts
            .row(i)
            .iter()
            .map(|c| c.to_string())
            .collect();
        writeln!(w, "{}\t{}", category, counts.join("\t"))?;
    }
    w.flush()?;
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.6}", v),
        None => "NA".to_string(),
    }
}
