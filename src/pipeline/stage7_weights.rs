use anyhow::{Context, Result, bail};
use tracing::info;

use crate::ctx::Ctx;
use crate::decode::cv::{FoldOutcome, fit_model};
use crate::io::nifti::write_nifti;
use crate::pipeline::Stage;
use crate::scores::WeightMap;
use crate::volume::unmask;

pub struct Stage7Weights;

impl Stage7Weights {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage7Weights {
    fn name(&self) -> &'static str {
        "stage7_weights"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.results.len() != ctx.feature_sets.len() {
            bail!("decoding results missing before weight stage");
        }
        let n_classes = ctx.categories.len();
        for (set, result) in ctx.feature_sets.iter().zip(ctx.results.iter_mut()) {
            let c = final_c(&ctx.decode.c_grid, &result.cv.folds);
            let params = ctx.decode.svm.with_c(c);
            let fitted = fit_model(
                set.features.view(),
                &set.targets,
                n_classes,
                &params,
                ctx.decode.scale,
            )?;
            if !fitted.fit.converged {
                ctx.warnings.push(format!(
                    "{} ({}): final svm did not converge after {} iterations",
                    set.mask,
                    set.kind.as_str(),
                    fitted.fit.iterations
                ));
            }

            let coef = fitted.model.coef();
            let names: Vec<String> = if coef.nrows() == 1 {
                vec![format!("{}_vs_{}", ctx.categories[1], ctx.categories[0])]
            } else {
                ctx.categories.clone()
            };

            let mask = ctx
                .masks
                .get(set.mask_index)
                .context("feature set refers to an unknown mask")?;
            let mut maps = Vec::with_capacity(names.len());
            for (row, name) in coef.rows().into_iter().zip(names) {
                let values = row.to_vec();
                let file = if ctx.write_weights {
                    let path = ctx.output.weights_dir.join(format!(
                        "{}_{}_{}.nii.gz",
                        sanitize(&set.mask),
                        set.kind.as_str(),
                        sanitize(&name)
                    ));
                    let volume = unmask(&values, mask)?;
                    write_nifti(&path, mask.grid, 1, &volume, &ctx.spatial)?;
                    Some(path)
                } else {
                    None
                };
                maps.push(WeightMap {
                    name,
                    coef: values,
                    file,
                });
            }
            info!(
                mask = %set.mask,
                input = set.kind.as_str(),
                c,
                maps = maps.len(),
                written = ctx.write_weights,
                "weights_ready"
            );
            result.final_c = Some(c);
            result.weights = maps;
        }
        Ok(())
    }
}

/// Most frequent C chosen across folds; ties go to the smaller value.
pub fn final_c(grid: &[f64], folds: &[FoldOutcome]) -> f64 {
    let first = grid.first().copied().unwrap_or(1.0);
    if grid.len() < 2 || folds.is_empty() {
        return first;
    }
    let mut best = first;
    let mut best_count = 0usize;
    for &c in grid {
        let count = folds.iter().filter(|f| f.c == c).count();
        if count > best_count || (count == best_count && c < best) {
            best = c;
            best_count = count;
        }
    }
    best
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' { ch } else { '_' })
        .collect()
}
