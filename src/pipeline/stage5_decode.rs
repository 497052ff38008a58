use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::decode::cv::cross_validate;
use crate::pipeline::Stage;
use crate::scores::RegionResult;

pub struct Stage5Decode;

impl Stage5Decode {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Decode {
    fn name(&self) -> &'static str {
        "stage5_decode"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        ctx.results.clear();
        for set in &ctx.feature_sets {
            let cv = cross_validate(
                set.features.view(),
                &set.targets,
                &set.runs,
                &ctx.categories,
                &ctx.decode,
            )?;
            for fold in &cv.folds {
                for warning in &fold.warnings {
                    ctx.warnings
                        .push(format!("{} ({}): {}", set.mask, set.kind.as_str(), warning));
                }
            }
            info!(
                mask = %set.mask,
                input = set.kind.as_str(),
                folds = cv.folds.len(),
                mean_accuracy = cv.mean_accuracy(),
                chance = cv.table.chance(),
                "region_decoded"
            );
            ctx.results.push(RegionResult {
                mask: set.mask.clone(),
                kind: set.kind,
                n_features: set.features.ncols(),
                n_samples: set.features.nrows(),
                cv,
                permutation: None,
                final_c: None,
                weights: Vec::new(),
                skipped: set.skipped.clone(),
            });
        }
        Ok(())
    }
}
