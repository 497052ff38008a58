use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::io::{self, json_writer, tsv_writer};
use crate::pipeline::Stage;

pub struct Stage8Output;

impl Stage8Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage8Output {
    fn name(&self) -> &'static str {
        "stage8_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let report = json_writer::build_report(ctx)?;
        ctx.report = report;

        if ctx.write_json {
            io::write_json(&ctx.output.json_path, &ctx.report)?;
        }
        if ctx.write_tsv {
            tsv_writer::write_scores(&ctx.output.scores_tsv, ctx)?;
            tsv_writer::write_folds(&ctx.output.folds_tsv, ctx)?;
            tsv_writer::write_region_accuracy(&ctx.output.regions_tsv, ctx)?;
            for result in &ctx.results {
                let path = ctx
                    .output
                    .confusion_tsv(&result.mask, result.kind.as_str());
                tsv_writer::write_confusion(&path, &result.cv.confusion)?;
            }
        }

        info!(
            json = ctx.write_json,
            tsv = ctx.write_tsv,
            "stage8_output_ready"
        );
        Ok(())
    }
}
