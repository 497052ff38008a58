use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kira_mvpa::cli::{Cli, Commands, InputArgs, RunArgs};
use kira_mvpa::ctx::Ctx;
use kira_mvpa::decode::filter::filter_baseline;
use kira_mvpa::io;
use kira_mvpa::pipeline::Pipeline;
use kira_mvpa::pipeline::stage0_scaffold::Stage0Scaffold;
use kira_mvpa::pipeline::stage1_input::Stage1Input;
use kira_mvpa::pipeline::stage2_filter::Stage2Filter;
use kira_mvpa::pipeline::stage3_mask::Stage3Mask;
use kira_mvpa::pipeline::stage4_glm::Stage4Glm;
use kira_mvpa::pipeline::stage5_decode::Stage5Decode;
use kira_mvpa::pipeline::stage6_permutation::Stage6Permutation;
use kira_mvpa::pipeline::stage7_weights::Stage7Weights;
use kira_mvpa::pipeline::stage8_output::Stage8Output;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let mut ctx = run_ctx(args);
            let pipeline = Pipeline::new(vec![
                Box::new(Stage0Scaffold::new()),
                Box::new(Stage1Input::new()),
                Box::new(Stage2Filter::new()),
                Box::new(Stage3Mask::new()),
                Box::new(Stage4Glm::new()),
                Box::new(Stage5Decode::new()),
                Box::new(Stage6Permutation::new()),
                Box::new(Stage7Weights::new()),
                Box::new(Stage8Output::new()),
            ]);
            pipeline.run(&mut ctx)?;
            print_summary(&ctx)?;
        }
        Commands::Validate(args) => {
            let mut ctx = Ctx::new(
                args.input.input.clone(),
                PathBuf::from("."),
                env!("CARGO_PKG_VERSION"),
            );
            apply_input(&mut ctx, args.input);

            let pipeline = Pipeline::new(vec![
                Box::new(Stage1Input::new()),
                Box::new(Stage2Filter::new()),
                Box::new(Stage3Mask::new()),
            ]);
            pipeline.run(&mut ctx)?;
            print_validate_summary(&ctx)?;
        }
        Commands::Folds(args) => {
            let table = io::labels::read_session_table(&args.labels)?;
            let retained = filter_baseline(&table.labels, &table.runs, &args.baseline)?;
            print!("{}", io::summary::format_fold_diagram(&retained.runs)?);
        }
    }

    Ok(())
}

fn apply_input(ctx: &mut Ctx, args: InputArgs) {
    ctx.bold_override = args.bold;
    ctx.labels_override = args.labels;
    ctx.mask_names = args.mask;
    ctx.baseline = args.baseline;
    ctx.standardize = args.standardize;
}

fn run_ctx(args: RunArgs) -> Ctx {
    let mut ctx = Ctx::new(
        args.input.input.clone(),
        args.out,
        env!("CARGO_PKG_VERSION"),
    );
    apply_input(&mut ctx, args.input);
    ctx.decode.svm.loss = args.loss.into();
    ctx.decode.svm.max_iter = args.max_iter;
    ctx.decode.svm.tol = args.tol;
    ctx.decode.svm.seed = args.seed;
    ctx.decode.c_grid = args.c;
    ctx.decode.scale = args.scale;
    ctx.decode.threads = args.threads;
    ctx.glm.enabled = args.glm;
    ctx.glm.output = args.glm_output.into();
    ctx.glm.tr_override = args.tr;
    ctx.glm.high_pass = args.high_pass;
    ctx.permutations = args.permutations;
    ctx.seed = args.seed;
    ctx.write_weights = args.weights;
    ctx.write_json = args.json;
    ctx.write_tsv = args.tsv;
    ctx
}

fn print_summary(ctx: &Ctx) -> Result<()> {
    let summary = io::summary::format_summary(ctx)?;
    print!("{}", summary);
    print_warnings(ctx);
    Ok(())
}

fn print_validate_summary(ctx: &Ctx) -> Result<()> {
    let series = ctx.series.as_ref().context("functional series not loaded")?;
    let session = ctx.session.as_ref().context("labels not loaded")?;
    let retained = ctx.retained.as_ref().context("baseline filter not applied")?;

    println!("kira-mvpa validate ok");
    println!("grid: {}", series.grid);
    println!("timepoints: {}", series.n_t);
    println!("retained: {}/{}", retained.len(), session.len());
    for (run, count) in session.run_counts() {
        let kept = retained.runs.iter().filter(|&&r| r == run).count();
        println!("run {}: {} volumes, {} retained", run, count, kept);
    }
    for (c, category) in ctx.categories.iter().enumerate() {
        let n = ctx.targets.iter().filter(|&&t| t == c).count();
        println!("category {}: {}", category, n);
    }
    for set in &ctx.feature_sets {
        println!(
            "mask {}: {} voxels, features {}x{}",
            set.mask,
            ctx.mask(set.mask_index)?.len(),
            set.features.nrows(),
            set.features.ncols()
        );
    }
    print_warnings(ctx);
    Ok(())
}

fn print_warnings(ctx: &Ctx) {
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
}
