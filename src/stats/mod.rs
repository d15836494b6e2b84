pub mod gmm;
pub mod jenks;
pub mod lowess;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with `ddof` delta degrees of freedom. NaN when the
/// denominator is not positive.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    let n = values.len();
    if n <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|&v| (v - m) * (v - m)).sum();
    (ss / (n - ddof) as f64).sqrt()
}

/// Mean separation of two groups over the sum of their population standard
/// deviations. Infinite or NaN when both groups are constant; callers read
/// NaN as "no signal".
pub fn snr(group1: &[f64], group2: &[f64]) -> f64 {
    snr_ddof(group1, group2, 0)
}

/// Same as [`snr`] with sample (n - 1) standard deviations.
pub fn snr_sample(group1: &[f64], group2: &[f64]) -> f64 {
    snr_ddof(group1, group2, 1)
}

fn snr_ddof(group1: &[f64], group2: &[f64], ddof: usize) -> f64 {
    (mean(group1) - mean(group2)) / (std_dev(group1, ddof) + std_dev(group2, ddof))
}

/// Quantile with linear interpolation between order statistics.
/// `sorted` must be ascending.
pub fn quantile_linear(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

pub fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    quantile_linear(&sorted, 0.5)
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/tests.rs"]
mod tests;
