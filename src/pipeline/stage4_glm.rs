use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::ctx::{Ctx, DEFAULT_TR};
use crate::decode::FeatureSet;
use crate::glm::{GlmParams, reduce_runs};
use crate::pipeline::Stage;
use crate::scores::InputKind;
use crate::volume::mask_series;

pub struct Stage4Glm;

impl Stage4Glm {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Glm {
    fn name(&self) -> &'static str {
        "stage4_glm"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if !ctx.glm.enabled {
            return Ok(());
        }
        let tr = match (ctx.glm.tr_override, ctx.header_tr) {
            (Some(tr), _) => tr,
            (None, Some(tr)) => tr,
            (None, None) => {
                warn!(tr = DEFAULT_TR, "no repetition time in header; using default");
                ctx.warnings.push(format!(
                    "no repetition time in header or --tr; assumed {} s",
                    DEFAULT_TR
                ));
                DEFAULT_TR
            }
        };
        ctx.tr = Some(tr);
        ctx.report.input_meta.tr = Some(tr);

        let params = GlmParams {
            tr,
            high_pass: ctx.glm.high_pass,
            output: ctx.glm.output,
            baseline: ctx.baseline.clone(),
        };
        let series = ctx.series.as_ref().context("functional series not loaded")?;
        let session = ctx.session.as_ref().context("session table not loaded")?;

        for (mask_index, mask) in ctx.masks.iter().enumerate() {
            let full = mask_series(series, mask, ctx.standardize)?;
            let maps = reduce_runs(
                full.view(),
                &session.labels,
                &session.runs,
                &ctx.categories,
                &params,
            )
            .with_context(|| format!("GLM reduction failed for mask '{}'", mask.name))?;
            info!(
                mask = %mask.name,
                maps = maps.rows.len(),
                skipped = maps.skipped.len(),
                output = params.output.as_str(),
                "glm_maps_ready"
            );
            ctx.feature_sets.push(FeatureSet {
                mask: mask.name.clone(),
                mask_index,
                kind: InputKind::Glm,
                targets: maps.rows.iter().map(|r| r.category).collect(),
                runs: maps.rows.iter().map(|r| r.run).collect(),
                features: maps.features,
                skipped: maps.skipped,
            });
        }
        Ok(())
    }
}
