use crate::model::thresholds::{ThresholdFunction, ThresholdTable};
use crate::stats::lowess::lowess;

pub const LOWESS_FRAC: f64 = 0.25;
pub const LOWESS_ITERATIONS: usize = 3;

pub fn run_stage2(table: &ThresholdTable) -> ThresholdFunction {
    fit_threshold_trend(&table.sizes_f64(), &table.thresholds)
}

/// Smooths size against threshold, then inverts the curve into a
/// size -> minimum SNR lookup.
pub fn fit_threshold_trend(sizes: &[f64], thresholds: &[f64]) -> ThresholdFunction {
    let fit = lowess(sizes, thresholds, LOWESS_FRAC, LOWESS_ITERATIONS);
    ThresholdFunction::from_points(fit.fitted, fit.x)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_trend.rs"]
mod tests;
