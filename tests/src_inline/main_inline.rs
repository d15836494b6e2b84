use super::*;

use crate::model::config::BinarizationMethod;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("kira-biclust").chain(args.iter().copied()))
}

fn run_args(args: &[&str]) -> RunArgs {
    match parse(args).unwrap().command {
        Command::Run(run) => run,
        other => panic!("expected run, got {other:?}"),
    }
}

#[test]
fn test_parse_run_with_module_tables() {
    let args = run_args(&[
        "run",
        "-e",
        "exprs.tsv",
        "-o",
        "out",
        "--modules-up",
        "up.tsv",
        "--directions",
        "DOWN,UP",
        "--min-snr",
        "0.5",
    ]);
    assert_eq!(args.opts.exprs, PathBuf::from("exprs.tsv"));
    assert_eq!(args.modules_up, Some(PathBuf::from("up.tsv")));
    assert_eq!(args.directions, vec![Direction::Down, Direction::Up]);
    assert_eq!(args.min_snr, Some(0.5));
    assert_eq!(args.rscript_bin, PathBuf::from("Rscript"));
}

#[test]
fn test_verbose_is_global() {
    let cli = parse(&["binarize", "-e", "x.tsv", "-o", "out", "-vv"]).unwrap();
    assert_eq!(cli.verbose, 2);
}

#[test]
fn test_modules_conflict_with_rscript() {
    let err = parse(&[
        "run",
        "-e",
        "x.tsv",
        "-o",
        "out",
        "--modules-up",
        "up.tsv",
        "--rscript",
        "wgcna.R",
    ])
    .unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn test_resolve_config_overrides() {
    let args = run_args(&[
        "run",
        "-e",
        "x.tsv",
        "-o",
        "out",
        "--method",
        "gmm",
        "--min-n-samples",
        "5",
        "--pval",
        "0.05",
        "--seed",
        "7",
    ]);
    let config = args.opts.resolve_config().unwrap();
    assert_eq!(config.method, BinarizationMethod::Gmm);
    assert_eq!(config.min_n_samples, 5);
    assert_eq!(config.snr_pval, 0.05);
    assert_eq!(config.seed, 7);
    assert_eq!(config.min_snr, 0.0);
}

#[test]
fn test_resolve_config_unknown_method() {
    let args = run_args(&["run", "-e", "x.tsv", "-o", "out", "--method", "kmeans"]);
    assert!(matches!(
        args.opts.resolve_config(),
        Err(ConfigError::UnknownMethod(ref m)) if m == "kmeans"
    ));
}

#[test]
fn test_build_clusterer() {
    let args = run_args(&["run", "-e", "x.tsv", "-o", "out"]);
    assert!(matches!(
        build_clusterer(&args),
        Err(PipelineError::External { .. })
    ));

    let args = run_args(&["run", "-e", "x.tsv", "-o", "out", "--modules-down", "d.tsv"]);
    assert_eq!(build_clusterer(&args).unwrap().name(), "modules");

    let args = run_args(&["run", "-e", "x.tsv", "-o", "out", "--rscript", "wgcna.R"]);
    assert_eq!(build_clusterer(&args).unwrap().name(), "WGCNA");
}

#[test]
fn test_parse_evaluate() {
    let cli = parse(&[
        "evaluate",
        "--tool",
        "fabia",
        "-e",
        "x.tsv",
        "--ground-truth",
        "gt.tsv",
        "--result",
        "r.tsv",
        "--matcher",
        "Rscript",
        "--matcher-arg",
        "match.R",
        "--matcher-arg",
        "--vanilla",
    ])
    .unwrap();
    let Command::Evaluate(args) = cli.command else {
        panic!("expected evaluate");
    };
    assert_eq!(args.tool, ResultFormat::TwoColumn);
    assert_eq!(args.matcher_args, vec!["match.R".to_string(), "--vanilla".to_string()]);
    assert_eq!(args.fdr, DEFAULT_FDR);
    assert!(args.out.is_none());
}
