use assert_cmd::Command;

#[test]
fn cli_help_smoke() {
    let mut cmd = Command::cargo_bin("kira-mvpa").unwrap();
    cmd.arg("--help");
    cmd.assert().success();
}

#[test]
fn cli_run_help_lists_decoder_options() {
    let mut cmd = Command::cargo_bin("kira-mvpa").unwrap();
    let output = cmd.args(["run", "--help"]).output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    for flag in ["--baseline", "--glm", "--permutations", "--loss", "--weights"] {
        assert!(text.contains(flag), "missing {} in help", flag);
    }
}

#[test]
fn cli_run_requires_out() {
    let mut cmd = Command::cargo_bin("kira-mvpa").unwrap();
    cmd.args(["run", "--input", "."]);
    cmd.assert().failure();
}

#[test]
fn cli_run_defaults() {
    use clap::Parser;
    use kira_mvpa::cli::{Cli, Commands, GlmOutputArg, LossArg};

    let cli = Cli::try_parse_from(["kira-mvpa", "run", "--input", "data", "--out", "out"]).unwrap();
    let Commands::Run(args) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.input.baseline, "rest");
    assert!(args.input.mask.is_empty());
    assert_eq!(args.c, vec![1.0]);
    assert_eq!(args.loss, LossArg::SquaredHinge);
    assert_eq!(args.max_iter, 1000);
    assert_eq!(args.glm_output, GlmOutputArg::Beta);
    assert_eq!(args.high_pass, 0.01);
    assert_eq!(args.permutations, 0);
    assert!(args.tr.is_none());
    assert!(!args.json && !args.tsv && !args.weights && !args.glm);
}

#[test]
fn cli_parses_repeated_masks_and_c_list() {
    use clap::Parser;
    use kira_mvpa::cli::{Cli, Commands, LossArg};

    let cli = Cli::try_parse_from([
        "kira-mvpa", "run", "--input", "d", "--out", "o", "--mask", "vt", "--mask", "ffa",
        "--c", "0.1,1,10", "--loss", "hinge", "--glm-output", "tstat",
    ])
    .unwrap();
    let Commands::Run(args) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.input.mask, vec!["vt", "ffa"]);
    assert_eq!(args.c, vec![0.1, 1.0, 10.0]);
    assert_eq!(args.loss, LossArg::Hinge);
}
