use std::f64::consts::PI;

const VAR_FLOOR: f64 = 1e-6;

/// One-dimensional mixture of two Gaussians. Component 0 has the lower mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoComponentMixture {
    pub weights: [f64; 2],
    pub means: [f64; 2],
    pub variances: [f64; 2],
    pub iterations: usize,
    pub log_likelihood: f64,
}

impl TwoComponentMixture {
    /// Posterior probability that `x` belongs to the upper component.
    pub fn upper_posterior(&self, x: f64) -> f64 {
        let l0 = log_weighted_density(x, self.weights[0], self.means[0], self.variances[0]);
        let l1 = log_weighted_density(x, self.weights[1], self.means[1], self.variances[1]);
        let m = l0.max(l1);
        let e0 = (l0 - m).exp();
        let e1 = (l1 - m).exp();
        e1 / (e0 + e1)
    }
}

/// Fits by expectation-maximization. The two natural-breaks classes seed
/// weights, means and variances, which keeps the fit deterministic. `None`
/// for fewer than two values or a constant input.
pub fn fit_two_components(
    values: &[f64],
    max_iter: usize,
    tol: f64,
) -> Option<TwoComponentMixture> {
    let n = values.len();
    let border = crate::stats::jenks::jenks_break(values)?;
    let lower: Vec<f64> = values.iter().copied().filter(|&v| v <= border).collect();
    let upper: Vec<f64> = values.iter().copied().filter(|&v| v > border).collect();
    if lower.is_empty() || upper.is_empty() {
        return None;
    }

    let mut model = TwoComponentMixture {
        weights: [
            lower.len() as f64 / n as f64,
            upper.len() as f64 / n as f64,
        ],
        means: [crate::stats::mean(&lower), crate::stats::mean(&upper)],
        variances: [
            crate::stats::std_dev(&lower, 0).powi(2) + VAR_FLOOR,
            crate::stats::std_dev(&upper, 0).powi(2) + VAR_FLOOR,
        ],
        iterations: 0,
        log_likelihood: f64::NEG_INFINITY,
    };

    let mut resp = vec![0.0f64; n];
    for iter in 1..=max_iter {
        // E-step
        let mut ll = 0.0f64;
        for (r, &x) in resp.iter_mut().zip(values) {
            let l0 = log_weighted_density(x, model.weights[0], model.means[0], model.variances[0]);
            let l1 = log_weighted_density(x, model.weights[1], model.means[1], model.variances[1]);
            let m = l0.max(l1);
            let e0 = (l0 - m).exp();
            let e1 = (l1 - m).exp();
            *r = e1 / (e0 + e1);
            ll += m + (e0 + e1).ln();
        }
        ll /= n as f64;

        // M-step
        let n1: f64 = resp.iter().sum();
        let n0 = n as f64 - n1;
        if n0 <= f64::EPSILON || n1 <= f64::EPSILON {
            return None;
        }
        let mean1 = resp.iter().zip(values).map(|(r, x)| r * x).sum::<f64>() / n1;
        let mean0 = resp.iter().zip(values).map(|(r, x)| (1.0 - r) * x).sum::<f64>() / n0;
        let var1 = resp
            .iter()
            .zip(values)
            .map(|(r, x)| r * (x - mean1) * (x - mean1))
            .sum::<f64>()
            / n1;
        let var0 = resp
            .iter()
            .zip(values)
            .map(|(r, x)| (1.0 - r) * (x - mean0) * (x - mean0))
            .sum::<f64>()
            / n0;
        model.weights = [n0 / n as f64, n1 / n as f64];
        model.means = [mean0, mean1];
        model.variances = [var0 + VAR_FLOOR, var1 + VAR_FLOOR];
        model.iterations = iter;

        let converged = (ll - model.log_likelihood).abs() < tol;
        model.log_likelihood = ll;
        if converged {
            break;
        }
    }

    if model.means[0] > model.means[1] {
        model.weights.swap(0, 1);
        model.means.swap(0, 1);
        model.variances.swap(0, 1);
    }
    Some(model)
}

fn log_weighted_density(x: f64, weight: f64, mean: f64, variance: f64) -> f64 {
    let d = x - mean;
    weight.ln() - 0.5 * (2.0 * PI * variance).ln() - d * d / (2.0 * variance)
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/gmm.rs"]
mod tests;
