use std::time::Instant;

use rayon::prelude::*;

use crate::model::Direction;
use crate::model::binarized::{Binarization, BinarizationSource, BinarizedCalls, FeatureStat};
use crate::model::config::BinarizationMethod;
use crate::model::matrix::ExpressionMatrix;
use crate::model::thresholds::ThresholdFunction;
use crate::stats::gmm::fit_two_components;
use crate::stats::jenks::jenks_break;
use crate::stats::snr;

/// Splits one expression row into a positive (up) and a negative (down)
/// group. `None` when no split exists.
pub trait BinarizationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Positive-group mask over the row's samples.
    fn partition(&self, row: &[f64], min_n_samples: usize) -> Option<Vec<bool>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JenksStrategy;

impl BinarizationStrategy for JenksStrategy {
    fn name(&self) -> &'static str {
        "Jenks"
    }

    fn partition(&self, row: &[f64], min_n_samples: usize) -> Option<Vec<bool>> {
        if let Some(mask) = split_at_minimum(row, min_n_samples) {
            return Some(mask);
        }
        let threshold = jenks_break(row)?;
        Some(row.iter().map(|&v| v >= threshold).collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GaussianMixtureStrategy {
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for GaussianMixtureStrategy {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: 1e-3,
        }
    }
}

impl BinarizationStrategy for GaussianMixtureStrategy {
    fn name(&self) -> &'static str {
        "GMM"
    }

    fn partition(&self, row: &[f64], min_n_samples: usize) -> Option<Vec<bool>> {
        if let Some(mask) = split_at_minimum(row, min_n_samples) {
            return Some(mask);
        }
        let model = fit_two_components(row, self.max_iter, self.tol)?;
        Some(row.iter().map(|&v| model.upper_posterior(v) > 0.5).collect())
    }
}

pub fn strategy_for(method: BinarizationMethod) -> Box<dyn BinarizationStrategy> {
    match method {
        BinarizationMethod::Jenks => Box::new(JenksStrategy),
        BinarizationMethod::Gmm => Box::new(GaussianMixtureStrategy::default()),
    }
}

/// Zero-inflated rows: when at least `min_n_samples` values sit at the row
/// minimum, those form the negative group and everything above is positive.
fn split_at_minimum(row: &[f64], min_n_samples: usize) -> Option<Vec<bool>> {
    let min = row.iter().copied().fold(f64::INFINITY, f64::min);
    let at_min = row.iter().filter(|&&v| v == min).count();
    if at_min >= min_n_samples {
        Some(row.iter().map(|&v| v > min).collect())
    } else {
        None
    }
}

/// Outcome for one significant gene.
#[derive(Debug, Clone, PartialEq)]
pub struct RowCall {
    pub snr: f64,
    pub size: usize,
    pub up_mask: Option<Vec<u8>>,
    pub down_mask: Option<Vec<u8>>,
    pub ambiguous: bool,
}

/// Tests one row against the calibrated threshold. Rows without a split,
/// with a group below `min_n_samples`, or with an undefined SNR yield `None`.
pub fn binarize_row(
    row: &[f64],
    threshold_fn: &ThresholdFunction,
    strategy: &dyn BinarizationStrategy,
    min_n_samples: usize,
) -> Option<RowCall> {
    let pos_mask = strategy.partition(row, min_n_samples)?;
    let mut up_group = Vec::new();
    let mut down_group = Vec::new();
    for (&v, &pos) in row.iter().zip(&pos_mask) {
        if pos {
            up_group.push(v);
        } else {
            down_group.push(v);
        }
    }
    let size = up_group.len().min(down_group.len());
    if size < min_n_samples {
        return None;
    }

    let value = snr(&up_group, &down_group);
    if value.is_nan() || value < threshold_fn.min_snr(size as f64) {
        return None;
    }

    let n_up = up_group.len() as isize;
    let n_down = down_group.len() as isize;
    let slack = min_n_samples as isize;
    // Near-balanced splits are emitted in both directions.
    let up_mask = (n_down - n_up >= -slack)
        .then(|| pos_mask.iter().map(|&p| u8::from(p)).collect());
    let down_mask = (n_up - n_down >= -slack)
        .then(|| pos_mask.iter().map(|&p| u8::from(!p)).collect());

    Some(RowCall {
        snr: value,
        size,
        up_mask,
        down_mask,
        ambiguous: (n_up - n_down).abs() <= slack,
    })
}

pub fn run_stage3(
    matrix: &ExpressionMatrix,
    threshold_fn: &ThresholdFunction,
    strategy: &dyn BinarizationStrategy,
    min_n_samples: usize,
) -> Binarization {
    let t0 = Instant::now();
    tracing::info!("{} binarization of {} features", strategy.name(), matrix.n_genes());

    let calls: Vec<Option<RowCall>> = (0..matrix.n_genes())
        .into_par_iter()
        .map(|idx| binarize_row(matrix.row(idx), threshold_fn, strategy, min_n_samples))
        .collect();

    let samples = matrix.samples().to_vec();
    let mut up = BinarizedCalls::empty(Direction::Up, samples.clone());
    let mut down = BinarizedCalls::empty(Direction::Down, samples);
    let mut stats = Vec::new();
    let mut n_ambiguous = 0usize;

    for (gene, call) in matrix.genes().iter().zip(calls) {
        let Some(call) = call else {
            continue;
        };
        if call.ambiguous {
            n_ambiguous += 1;
        }
        stats.push(FeatureStat {
            gene: gene.clone(),
            snr: call.snr,
            size: call.size,
            up: call.up_mask.is_some(),
            down: call.down_mask.is_some(),
        });
        if let Some(mask) = call.up_mask {
            up.push(gene.clone(), mask);
        }
        if let Some(mask) = call.down_mask {
            down.push(gene.clone(), mask);
        }
    }

    tracing::info!(
        "{} binarization for {} features completed in {:.2} s",
        strategy.name(),
        matrix.n_genes(),
        t0.elapsed().as_secs_f64()
    );
    tracing::info!("up-regulated features: {}", up.n_genes());
    tracing::info!("down-regulated features: {}", down.n_genes());
    tracing::info!("ambiguous features: {}", n_ambiguous);
    tracing::debug!(
        "features dropped as not significant: {}",
        matrix.n_genes() - stats.len()
    );

    Binarization {
        up,
        down,
        stats,
        n_processed: matrix.n_genes(),
        n_ambiguous,
        source: BinarizationSource::Computed,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_binarize.rs"]
mod tests;
