use std::time::Instant;

use thiserror::Error;

use crate::input::InputError;
use crate::input::cache::{BinarizedCache, CacheKey};
use crate::model::Direction;
use crate::model::binarized::{Binarization, BinarizationSource};
use crate::model::config::{BiclusterConfig, ConfigError};
use crate::model::matrix::ExpressionMatrix;
use crate::model::thresholds::{ThresholdFunction, ThresholdTable};

pub mod stage1_thresholds;
pub mod stage2_trend;
pub mod stage3_binarize;
pub mod stage4_modules;
pub mod stage5_biclusters;
pub mod stage6_report;
pub mod stage7_evaluate;

use stage1_thresholds::{ThresholdParams, run_stage1};
use stage2_trend::run_stage2;
use stage3_binarize::{run_stage3, strategy_for};
use stage4_modules::ModuleClusterer;
use stage5_biclusters::{DirectionResult, RefineParams, run_stage5};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("gene '{gene}' of {direction} module {module} is missing from the {missing_from}")]
    UnknownGene {
        gene: String,
        direction: Direction,
        module: usize,
        missing_from: &'static str,
    },
    #[error("{collaborator} failed: {message}")]
    External {
        collaborator: &'static str,
        message: String,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Everything the binarization step produced. Threshold artifacts are absent
/// when the calls came from the cache.
#[derive(Debug, Clone)]
pub struct BinarizeRun {
    pub binarization: Binarization,
    pub thresholds: Option<(ThresholdTable, ThresholdFunction)>,
}

/// Builds the threshold function and binarizes every gene, consulting
/// `cache` first when one is supplied and storing fresh results into it.
pub fn binarize(
    matrix: &ExpressionMatrix,
    config: &BiclusterConfig,
    cache: Option<&dyn BinarizedCache>,
) -> Result<BinarizeRun, PipelineError> {
    config.validate(matrix.n_samples())?;

    if let Some(cache) = cache {
        let up_key = cache_key(config, Direction::Up);
        let down_key = cache_key(config, Direction::Down);
        let up = cache.load(&up_key, matrix.samples())?;
        let down = cache.load(&down_key, matrix.samples())?;
        if let (Some(up), Some(down)) = (up, down) {
            return Ok(BinarizeRun {
                binarization: Binarization {
                    up,
                    down,
                    stats: Vec::new(),
                    n_processed: 0,
                    n_ambiguous: 0,
                    source: BinarizationSource::Cache,
                },
                thresholds: None,
            });
        }
        tracing::debug!("binarization cache miss");
    }

    tracing::info!("binarization started");
    let t0 = Instant::now();
    let table = run_stage1(&ThresholdParams {
        n_samples: matrix.n_samples(),
        min_n_samples: config.min_n_samples,
        snr_pval: config.snr_pval,
        seed: config.seed,
    })?;
    let function = run_stage2(&table);
    tracing::info!(
        "SNR thresholds for individual features computed in {:.2} s",
        t0.elapsed().as_secs_f64()
    );

    let strategy = strategy_for(config.method);
    let binarization = run_stage3(matrix, &function, strategy.as_ref(), config.min_n_samples);

    if let Some(cache) = cache {
        cache.store(&cache_key(config, Direction::Up), &binarization.up)?;
        cache.store(&cache_key(config, Direction::Down), &binarization.down)?;
    }

    Ok(BinarizeRun {
        binarization,
        thresholds: Some((table, function)),
    })
}

/// Clusters the binarized calls of each configured direction and turns the
/// modules into refined biclusters.
pub fn discover(
    matrix: &ExpressionMatrix,
    config: &BiclusterConfig,
    binarization: &Binarization,
    clusterer: &dyn ModuleClusterer,
) -> Result<Vec<DirectionResult>, PipelineError> {
    let params = RefineParams {
        min_snr: config.min_snr,
        min_n_samples: config.min_n_samples,
    };
    let mut out = Vec::with_capacity(config.directions.len());
    for &direction in &config.directions {
        let calls = binarization.calls(direction);
        let clustering = clusterer.cluster(calls)?;
        out.push(run_stage5(matrix, calls, &clustering, &params)?);
    }
    Ok(out)
}

pub fn cache_key(config: &BiclusterConfig, direction: Direction) -> CacheKey {
    CacheKey {
        snr_pval: config.snr_pval,
        method: config.method,
        direction,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod.rs"]
mod tests;
