mod input;
mod logging;
mod model;
mod pipeline;
mod report;
mod stats;

use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::input::cache::{BinarizedCache, FileCache};
use crate::input::expression::{load_expression_matrix, read_sample_ids};
use crate::input::ground_truth::load_ground_truth;
use crate::input::results::{ResultFormat, load_results};
use crate::model::Direction;
use crate::model::config::{BiclusterConfig, ConfigError};
use crate::pipeline::stage4_modules::{ModuleClusterer, ModuleFileClusterer, RscriptClusterer};
use crate::pipeline::stage6_report::{Stage6Input, write_binarization_outputs, write_reports};
use crate::pipeline::stage7_evaluate::{
    CommandMatcher, DEFAULT_FDR, run_stage7, write_evaluation,
};
use crate::pipeline::{PipelineError, binarize, discover};

const TOOL_NAME: &str = "kira-biclust";

#[derive(Debug, Parser)]
#[command(name = "kira-biclust", version, about = "Bicluster discovery from gene expression")]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Binarize, detect modules and write refined biclusters
    Run(RunArgs),
    /// Binarize only; writes UP/DOWN matrices and feature statistics
    Binarize(BinarizeArgs),
    /// Score a bicluster result table against known sample groups
    Evaluate(EvaluateArgs),
}

#[derive(Debug, Args)]
struct BinarizeOpts {
    /// Expression matrix, genes x samples (.tsv, .csv, optionally .gz)
    #[arg(short, long)]
    exprs: PathBuf,
    /// JSON config; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Binarization method: Jenks or GMM
    #[arg(long)]
    method: Option<String>,
    #[arg(long)]
    min_n_samples: Option<usize>,
    /// Controls the number of permutations for SNR thresholds
    #[arg(long)]
    pval: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Reuse binarized matrices stored under this path prefix
    #[arg(long)]
    cache_prefix: Option<PathBuf>,
}

impl BinarizeOpts {
    fn resolve_config(&self) -> Result<BiclusterConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => BiclusterConfig::load_json(path)?,
            None => BiclusterConfig::default_v1(),
        };
        if let Some(method) = &self.method {
            config.method = method.parse()?;
        }
        if let Some(v) = self.min_n_samples {
            config.min_n_samples = v;
        }
        if let Some(v) = self.pval {
            config.snr_pval = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        Ok(config)
    }

    fn cache(&self) -> Option<FileCache> {
        self.cache_prefix.as_ref().map(FileCache::new)
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    opts: BinarizeOpts,
    #[arg(short, long)]
    out: PathBuf,
    /// Prune bicluster genes with |SNR| below this value
    #[arg(long)]
    min_snr: Option<f64>,
    /// Comma-separated subset of UP,DOWN
    #[arg(long, value_delimiter = ',')]
    directions: Vec<Direction>,
    /// Precomputed module table for UP calls
    #[arg(long, conflicts_with = "rscript")]
    modules_up: Option<PathBuf>,
    /// Precomputed module table for DOWN calls
    #[arg(long, conflicts_with = "rscript")]
    modules_down: Option<PathBuf>,
    /// R script that detects modules in a binarized matrix
    #[arg(long)]
    rscript: Option<PathBuf>,
    #[arg(long, default_value = "Rscript")]
    rscript_bin: PathBuf,
}

#[derive(Debug, Args)]
struct BinarizeArgs {
    #[command(flatten)]
    opts: BinarizeOpts,
    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct EvaluateArgs {
    /// Result format: kira, isa2, fabia, qubic or debi
    #[arg(long)]
    tool: ResultFormat,
    /// Expression matrix; only the sample header is read
    #[arg(short, long)]
    exprs: PathBuf,
    #[arg(long)]
    ground_truth: PathBuf,
    #[arg(long)]
    result: PathBuf,
    /// Matching program, called as `<matcher> [args] found known N FDR`
    #[arg(long)]
    matcher: PathBuf,
    #[arg(long = "matcher-arg", allow_hyphen_values = true)]
    matcher_args: Vec<String>,
    #[arg(long, default_value_t = DEFAULT_FDR)]
    fdr: f64,
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    match cli.command {
        Command::Run(args) => run_discovery(&args),
        Command::Binarize(args) => run_binarize(&args),
        Command::Evaluate(args) => run_evaluate(&args),
    }
}

fn run_discovery(args: &RunArgs) -> Result<(), PipelineError> {
    let mut config = args.opts.resolve_config()?;
    if let Some(v) = args.min_snr {
        config.min_snr = v;
    }
    if !args.directions.is_empty() {
        config.directions = Direction::ALL
            .into_iter()
            .filter(|d| args.directions.contains(d))
            .collect();
    }
    let clusterer = build_clusterer(args)?;

    let matrix = load_expression_matrix(&args.opts.exprs)?;
    fs::create_dir_all(&args.out).map_err(|source| PipelineError::Write {
        path: args.out.display().to_string(),
        source,
    })?;
    let cache = args.opts.cache();
    let run = binarize(
        &matrix,
        &config,
        cache.as_ref().map(|c| c as &dyn BinarizedCache),
    )?;
    let results = discover(&matrix, &config, &run.binarization, clusterer.as_ref())?;

    let input = Stage6Input {
        n_genes: matrix.n_genes(),
        n_samples: matrix.n_samples(),
        config: &config,
        run: &run,
        results: &results,
        clustering: clusterer.name(),
        tool_name: TOOL_NAME.to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    write_reports(&input, &args.out)
}

fn build_clusterer(args: &RunArgs) -> Result<Box<dyn ModuleClusterer>, PipelineError> {
    if let Some(script) = &args.rscript {
        let mut clusterer = RscriptClusterer::new(script.clone(), args.out.clone());
        clusterer.rscript = args.rscript_bin.clone();
        return Ok(Box::new(clusterer));
    }
    if args.modules_up.is_none() && args.modules_down.is_none() {
        return Err(PipelineError::External {
            collaborator: "module detection",
            message: "either --rscript or --modules-up/--modules-down is required".to_string(),
        });
    }
    Ok(Box::new(ModuleFileClusterer {
        up: args.modules_up.clone(),
        down: args.modules_down.clone(),
    }))
}

fn run_binarize(args: &BinarizeArgs) -> Result<(), PipelineError> {
    let config = args.opts.resolve_config()?;
    let matrix = load_expression_matrix(&args.opts.exprs)?;
    let cache = args.opts.cache();
    let run = binarize(
        &matrix,
        &config,
        cache.as_ref().map(|c| c as &dyn BinarizedCache),
    )?;
    write_binarization_outputs(&run, &config, &args.out)?;
    tracing::info!("binarized matrices written to {}", args.out.display());
    Ok(())
}

fn run_evaluate(args: &EvaluateArgs) -> Result<(), PipelineError> {
    let n_samples = read_sample_ids(&args.exprs)?.len();
    let known = load_ground_truth(&args.ground_truth)?;
    let found = load_results(args.tool, &args.result)?;
    tracing::info!(
        "{} biclusters read from {} ({})",
        found.len(),
        args.result.display(),
        args.tool
    );

    let work_dir = args.out.clone().unwrap_or_else(|| {
        std::env::temp_dir().join(format!("{TOOL_NAME}-eval-{}", std::process::id()))
    });
    let matcher = CommandMatcher {
        program: args.matcher.clone(),
        args: args.matcher_args.clone(),
        work_dir: work_dir.clone(),
    };
    let summary = run_stage7(&found, &known, n_samples, args.fdr, &matcher)?;
    println!("{}", summary.score);
    if args.out.is_some() {
        write_evaluation(&summary, &work_dir.join("evaluation.json"))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
