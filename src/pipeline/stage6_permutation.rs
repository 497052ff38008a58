use anyhow::{Result, bail};
use tracing::info;

use crate::ctx::Ctx;
use crate::decode::permutation::permutation_test;
use crate::pipeline::Stage;

pub struct Stage6Permutation;

impl Stage6Permutation {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6Permutation {
    fn name(&self) -> &'static str {
        "stage6_permutation"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.permutations == 0 {
            return Ok(());
        }
        if ctx.results.len() != ctx.feature_sets.len() {
            bail!("decoding results missing before permutation stage");
        }
        for (set, result) in ctx.feature_sets.iter().zip(ctx.results.iter_mut()) {
            let summary = permutation_test(
                set.features.view(),
                &set.targets,
                &set.runs,
                &ctx.categories,
                &ctx.decode,
                result.cv.mean_accuracy(),
                ctx.permutations,
                ctx.seed,
            )?;
            info!(
                mask = %set.mask,
                input = set.kind.as_str(),
                observed = summary.observed,
                null_mean = summary.null_mean,
                p_value = summary.p_value,
                "permutation_done"
            );
            result.permutation = Some(summary);
        }
        Ok(())
    }
}
