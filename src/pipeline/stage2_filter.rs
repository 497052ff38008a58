use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::decode::filter::{category_set, encode_labels, filter_baseline};
use crate::pipeline::Stage;

pub struct Stage2Filter;

impl Stage2Filter {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Filter {
    fn name(&self) -> &'static str {
        "stage2_filter"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let session = ctx.session.as_ref().context("session table not loaded")?;
        let retained = filter_baseline(&session.labels, &session.runs, &ctx.baseline)?;
        let categories = category_set(&retained.labels);
        if categories.len() < 2 {
            bail!(
                "need at least 2 categories after removing '{}', found {}",
                ctx.baseline,
                categories.len()
            );
        }
        let targets = encode_labels(&retained.labels, &categories)?;

        for run in session.run_counts().keys() {
            if !retained.runs.contains(run) {
                warn!(run, "run has no non-baseline samples");
                ctx.warnings
                    .push(format!("run {} has no non-baseline samples", run));
            }
        }
        let retained_runs: std::collections::BTreeSet<u32> =
            retained.runs.iter().copied().collect();
        for run in &retained_runs {
            for (c, category) in categories.iter().enumerate() {
                let present = retained
                    .runs
                    .iter()
                    .zip(targets.iter())
                    .any(|(r, t)| r == run && *t == c);
                if !present {
                    ctx.warnings.push(format!(
                        "run {} has no samples of category '{}'",
                        run, category
                    ));
                }
            }
        }
        if retained_runs.len() < 2 {
            bail!(
                "leave-one-run-out needs at least 2 runs with non-baseline samples, found {}",
                retained_runs.len()
            );
        }

        info!(
            retained = retained.len(),
            dropped = session.len() - retained.len(),
            categories = categories.len(),
            "baseline_filtered"
        );

        ctx.report.input_meta.retained = Some(retained.len() as u64);
        ctx.report.input_meta.categories = categories.clone();
        ctx.report.input_meta.runs = retained_runs.into_iter().collect();

        ctx.retained = Some(retained);
        ctx.categories = categories;
        ctx.targets = targets;
        Ok(())
    }
}
