use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::model::config::ConfigError;
use crate::model::thresholds::ThresholdTable;
use crate::stats::{quantile_linear, snr};

/// Upper-tail quantile of the null SNR distribution taken as the threshold.
/// Fixed; `snr_pval` only sets the number of permutations.
pub const THRESHOLD_QUANTILE: f64 = 0.95;

#[derive(Debug, Clone, Copy)]
pub struct ThresholdParams {
    pub n_samples: usize,
    pub min_n_samples: usize,
    pub snr_pval: f64,
    pub seed: u64,
}

pub fn permutation_count(n_samples: usize, snr_pval: f64) -> usize {
    let by_pval = (5.0 / snr_pval).ceil() as usize;
    by_pval.max(100_000 / n_samples.max(1))
}

/// `min_n_samples ..= N/2 + min_n_samples`.
pub fn candidate_sizes(n_samples: usize, min_n_samples: usize) -> Vec<usize> {
    (min_n_samples..=n_samples / 2 + min_n_samples).collect()
}

/// Simulates the SNR of the best split of pure standard-normal noise for every
/// candidate size of the smaller group. Sizes run in parallel, each on its
/// own ChaCha stream, so results do not depend on scheduling.
pub fn run_stage1(params: &ThresholdParams) -> Result<ThresholdTable, ConfigError> {
    let n = params.n_samples;
    if params.snr_pval.is_nan() || params.snr_pval <= 0.0 || params.snr_pval > 1.0 {
        return Err(ConfigError::InvalidPValue(params.snr_pval));
    }
    if params.min_n_samples == 0 {
        return Err(ConfigError::ZeroMinSamples);
    }
    if params.min_n_samples >= n {
        return Err(ConfigError::MinSamplesTooLarge {
            min_n_samples: params.min_n_samples,
            n_samples: n,
        });
    }
    let max_size = n / 2 + params.min_n_samples;

    let n_perm = permutation_count(n, params.snr_pval);
    let sizes = candidate_sizes(n, params.min_n_samples);
    tracing::info!(
        "generating empirical SNR distribution: total samples {}, sizes {}-{}, permutations {}",
        n,
        params.min_n_samples,
        max_size,
        n_perm
    );

    let thresholds: Vec<f64> = sizes
        .par_iter()
        .map(|&size| size_threshold(n, size, n_perm, params.seed))
        .collect();

    Ok(ThresholdTable {
        n_samples: n,
        min_n_samples: params.min_n_samples,
        n_perm,
        sizes,
        thresholds,
    })
}

/// NaN when `size` leaves no background samples; the trend fit skips it.
fn size_threshold(n: usize, size: usize, n_perm: usize, seed: u64) -> f64 {
    if size >= n {
        return f64::NAN;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(size as u64);

    let mut draw = vec![0.0f64; n];
    let mut snrs = Vec::with_capacity(n_perm);
    for _ in 0..n_perm {
        for v in draw.iter_mut() {
            *v = rng.sample(StandardNormal);
        }
        draw.sort_by(f64::total_cmp);
        snrs.push(snr(&draw[size..], &draw[..size]));
    }
    snrs.sort_by(f64::total_cmp);
    quantile_linear(&snrs, THRESHOLD_QUANTILE)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_thresholds.rs"]
mod tests;
