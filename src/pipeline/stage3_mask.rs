use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::decode::FeatureSet;
use crate::pipeline::Stage;
use crate::scores::InputKind;
use crate::volume::mask_frames;

pub struct Stage3Mask;

impl Stage3Mask {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Mask {
    fn name(&self) -> &'static str {
        "stage3_mask"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let series = ctx.series.as_ref().context("functional series not loaded")?;
        let retained = ctx.retained.as_ref().context("baseline filter not applied")?;

        for (mask_index, mask) in ctx.masks.iter().enumerate() {
            let features = mask_frames(series, &retained.source, mask, ctx.standardize)?;
            info!(
                mask = %mask.name,
                samples = features.nrows(),
                features = features.ncols(),
                standardize = ctx.standardize,
                "features_extracted"
            );
            ctx.feature_sets.push(FeatureSet {
                mask: mask.name.clone(),
                mask_index,
                kind: InputKind::Raw,
                features,
                targets: ctx.targets.clone(),
                runs: retained.runs.clone(),
                skipped: Vec::new(),
            });
        }
        Ok(())
    }
}
