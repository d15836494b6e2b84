//! Locally weighted scatterplot smoothing.
//!
//! Each point is fitted by a weighted linear regression over its
//! `ceil(frac * n)` nearest neighbours (tricube weights on distance scaled by
//! the farthest neighbour). Robustifying passes down-weight points with large
//! residuals using bisquare weights on `residual / (6 * median |residual|)`.

#[derive(Debug, Clone, PartialEq)]
pub struct LowessFit {
    /// Exogenous values, ascending.
    pub x: Vec<f64>,
    /// Smoothed endogenous values aligned with `x`.
    pub fitted: Vec<f64>,
}

/// Smooths `endog` as a function of `exog`. Input order is irrelevant;
/// pairs with non-finite members are dropped.
pub fn lowess(endog: &[f64], exog: &[f64], frac: f64, iterations: usize) -> LowessFit {
    let mut pairs: Vec<(f64, f64)> = exog
        .iter()
        .copied()
        .zip(endog.iter().copied())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let x: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let y: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    let n = x.len();
    if n < 2 {
        return LowessFit { x, fitted: y };
    }

    let y_scale = y.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let k = ((frac * n as f64 + 1e-10) as usize).clamp(2, n);
    let mut robust = vec![1.0f64; n];
    let mut fitted = vec![0.0f64; n];

    for pass in 0..=iterations {
        let mut left = 0usize;
        for i in 0..n {
            let xi = x[i];
            while left + k < n && xi - x[left] > x[left + k] - xi {
                left += 1;
            }
            let right = left + k;
            let radius = (xi - x[left]).max(x[right - 1] - xi);
            fitted[i] = local_fit(&x[left..right], &y[left..right], &robust[left..right], xi, radius)
                .unwrap_or(y[i]);
        }

        if pass == iterations {
            break;
        }
        let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(a, b)| a - b).collect();
        let mut abs_res: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
        abs_res.sort_by(f64::total_cmp);
        let scale = 6.0 * crate::stats::quantile_linear(&abs_res, 0.5);
        if scale <= 1e-12 * y_scale {
            break;
        }
        for (w, r) in robust.iter_mut().zip(&residuals) {
            *w = bisquare(r / scale);
        }
    }

    LowessFit { x, fitted }
}

fn local_fit(x: &[f64], y: &[f64], robust: &[f64], xi: f64, radius: f64) -> Option<f64> {
    let mut weights = Vec::with_capacity(x.len());
    for (xj, rw) in x.iter().zip(robust) {
        let w = if radius > 0.0 {
            tricube((xj - xi).abs() / radius)
        } else {
            1.0
        };
        weights.push(w * rw);
    }
    let sum_w: f64 = weights.iter().sum();
    if sum_w <= 0.0 {
        return None;
    }
    let mx = weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() / sum_w;
    let my = weights.iter().zip(y).map(|(w, v)| w * v).sum::<f64>() / sum_w;
    let mut sxx = 0.0f64;
    let mut sxy = 0.0f64;
    for ((w, xv), yv) in weights.iter().zip(x).zip(y) {
        sxx += w * (xv - mx) * (xv - mx);
        sxy += w * (xv - mx) * (yv - my);
    }
    if sxx <= 1e-12 * sum_w * (radius * radius).max(f64::MIN_POSITIVE) {
        return Some(my);
    }
    Some(my + sxy / sxx * (xi - mx))
}

fn tricube(u: f64) -> f64 {
    if u >= 1.0 {
        return 0.0;
    }
    let t = 1.0 - u * u * u;
    t * t * t
}

fn bisquare(u: f64) -> f64 {
    if u.abs() >= 1.0 {
        return 0.0;
    }
    let t = 1.0 - u * u;
    t * t
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/lowess.rs"]
mod tests;
