use std::path::Path;

use anyhow::Result;

use crate::ctx::Ctx;
use crate::schema::v1::{
    CategoryScore, ConfusionReport, FoldReport, InputMeta, MvpaV1, Params, PermutationReport,
    RegionReport, SkippedReport, WeightMapReport,
};
use crate::scores::RegionResult;

pub fn build_report(ctx: &Ctx) -> Result<MvpaV1> {
    let input_meta = InputMeta {
        grid: ctx.report.input_meta.grid,
        timepoints: ctx.report.input_meta.timepoints,
        retained: ctx.retained.as_ref().map(|r| r.len() as u64),
        runs: ctx.distinct_runs(),
        categories: ctx.categories.clone(),
        baseline: ctx.baseline.clone(),
        tr: ctx.tr,
    };

    let params = Params {
        standardize: ctx.standardize,
        scale: ctx.decode.scale,
        c_grid: ctx.decode.c_grid.clone(),
        loss: ctx.decode.svm.loss.as_str().to_string(),
        max_iter: ctx.decode.svm.max_iter,
        tol: ctx.decode.svm.tol,
        glm: ctx.glm.enabled,
        glm_output: ctx
            .glm
            .enabled
            .then(|| ctx.glm.output.as_str().to_string()),
        high_pass: ctx.glm.high_pass,
        permutations: ctx.permutations,
        seed: ctx.seed,
    };

    let regions = ctx
        .results
        .iter()
        .map(|r| region_report(r, &ctx.output.out_dir))
        .collect::<Vec<_>>();

    Ok(MvpaV1 {
        tool: "kira-mvpa".to_string(),
        version: ctx.report.version.clone(),
        schema_version: "v1".to_string(),
        input_meta,
        params,
        regions,
        warnings: ctx.warnings.clone(),
    })
}

fn region_report(result: &RegionResult, out_dir: &Path) -> RegionReport {
    let table = &result.cv.table;
    let per_category = table
        .categories
        .iter()
        .enumerate()
        .map(|(i, category)| CategoryScore {
            category: category.clone(),
            mean_accuracy: table.category_mean(i),
        })
        .collect();

    let folds = result
        .cv
        .folds
        .iter()
        .map(|f| FoldReport {
            fold: f.fold,
            held_out_run: f.held_out,
            n_train: f.n_train,
            n_test: f.n_test,
            accuracy: f.accuracy,
            c: f.c,
            converged: f.fit.converged,
            iterations: f.fit.iterations,
            per_category: f.per_category.clone(),
        })
        .collect();

    let confusion = ConfusionReport {
        categories: result.cv.confusion.categories.clone(),
        counts: result
            .cv
            .confusion
            .counts
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect(),
    };

    let permutation = result.permutation.as_ref().map(|p| PermutationReport {
        n: p.null.len(),
        observed: p.observed,
        null_mean: p.null_mean,
        null_std: p.null_std,
        p_value: p.p_value,
    });

    let weight_maps = result
        .weights
        .iter()
        .map(|w| WeightMapReport {
            name: w.name.clone(),
            max_abs: w.max_abs(),
            file: w.file.as_ref().map(|p| {
                p.strip_prefix(out_dir)
                    .unwrap_or(p)
                    .display()
                    .to_string()
            }),
        })
        .collect();

    RegionReport {
        mask: result.mask.clone(),
        input: result.kind.as_str().to_string(),
        n_features: result.n_features,
        n_samples: result.n_samples,
        chance: table.chance(),
        mean_accuracy: table.mean_accuracy(),
        per_category,
        folds,
        confusion,
        permutation,
        final_c: result.final_c,
        weight_maps,
        glm_skipped: result
            .skipped
            .iter()
            .map(|s| SkippedReport {
                run: s.run,
                category: s.category.clone(),
            })
            .collect(),
    }
}
