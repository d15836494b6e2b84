use serde::{Serialize, Serializer};

use crate::model::Direction;
use crate::model::binarized::BinarizationSource;
use crate::model::config::BiclusterConfig;
use crate::stats;

pub mod json;
pub mod text;

#[derive(Debug, Clone, Serialize)]
pub struct BinarizationSummary {
    pub source: BinarizationSource,
    pub n_processed: usize,
    pub n_significant: usize,
    pub n_up: usize,
    pub n_down: usize,
    pub n_ambiguous: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdSummary {
    pub n_perm: usize,
    pub min_size: usize,
    pub max_size: usize,
    pub threshold_at_min_size: f64,
    pub threshold_at_max_size: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectionSummary {
    pub direction: Direction,
    pub table: String,
    pub n_modules: usize,
    pub n_biclusters: usize,
    pub n_clustered_genes: usize,
    pub n_not_clustered: usize,
    /// `"inf"` when the best bicluster separates constant groups.
    #[serde(serialize_with = "serialize_snr")]
    pub max_avg_snr: Option<f64>,
    pub median_n_genes: Option<f64>,
    pub median_n_samples: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub clustering: String,
    pub n_genes: usize,
    pub n_samples: usize,
    pub config: BiclusterConfig,
    pub binarization: BinarizationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdSummary>,
    pub directions: Vec<DirectionSummary>,
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

/// JSON has no infinity; non-finite values are written as strings so they
/// stay distinct from `null` (no biclusters).
fn serialize_snr<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if !v.is_finite() => serializer.serialize_str(&v.to_string()),
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_none(),
    }
}

pub fn median_count(values: &[usize]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let values: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    Some(stats::median(&values))
}
