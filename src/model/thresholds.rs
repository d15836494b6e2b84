use serde::Serialize;

/// Empirical SNR thresholds, one per candidate size of the smaller group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdTable {
    pub n_samples: usize,
    pub min_n_samples: usize,
    pub n_perm: usize,
    pub sizes: Vec<usize>,
    pub thresholds: Vec<f64>,
}

impl ThresholdTable {
    pub fn sizes_f64(&self) -> Vec<f64> {
        self.sizes.iter().map(|&s| s as f64).collect()
    }
}

/// Group size -> minimum significant SNR. Nearest-knot lookup; values outside
/// the knot range take the nearest endpoint.
#[derive(Debug, Clone)]
pub struct ThresholdFunction {
    values: Vec<f64>,
    midpoints: Vec<f64>,
}

impl ThresholdFunction {
    pub fn from_points(knots: Vec<f64>, values: Vec<f64>) -> Self {
        let mut pairs: Vec<(f64, f64)> = knots
            .into_iter()
            .zip(values)
            .filter(|(x, y)| x.is_finite() && !y.is_nan())
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let knots: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let values: Vec<f64> = pairs.iter().map(|p| p.1).collect();
        let midpoints = knots.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
        Self {
            values,
            midpoints,
        }
    }

    pub fn min_snr(&self, size: f64) -> f64 {
        if self.values.is_empty() {
            return f64::INFINITY;
        }
        // A point exactly on a midpoint resolves to the lower knot.
        let idx = self.midpoints.partition_point(|&m| m < size);
        self.values[idx]
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/thresholds.rs"]
mod tests;
