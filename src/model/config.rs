use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Direction;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown binarization method '{0}' (use Jenks|GMM)")]
    UnknownMethod(String),
    #[error("snr p-value must be in (0, 1], got {0}")]
    InvalidPValue(f64),
    #[error("min_n_samples must be at least 1")]
    ZeroMinSamples,
    #[error("min_n_samples={min_n_samples} leaves no background group in {n_samples} samples")]
    MinSamplesTooLarge {
        min_n_samples: usize,
        n_samples: usize,
    },
    #[error("no directions selected")]
    NoDirections,
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BinarizationMethod {
    Jenks,
    Gmm,
}

impl BinarizationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            BinarizationMethod::Jenks => "Jenks",
            BinarizationMethod::Gmm => "GMM",
        }
    }
}

impl fmt::Display for BinarizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BinarizationMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jenks" => Ok(BinarizationMethod::Jenks),
            "gmm" => Ok(BinarizationMethod::Gmm),
            _ => Err(ConfigError::UnknownMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for BinarizationMethod {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BinarizationMethod> for String {
    fn from(value: BinarizationMethod) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiclusterConfig {
    pub method: BinarizationMethod,
    pub min_n_samples: usize,
    pub snr_pval: f64,
    pub min_snr: f64,
    pub seed: u64,
    pub directions: Vec<Direction>,
}

impl Default for BiclusterConfig {
    fn default() -> Self {
        Self::default_v1()
    }
}

impl BiclusterConfig {
    pub fn default_v1() -> Self {
        Self {
            method: BinarizationMethod::Jenks,
            min_n_samples: 10,
            snr_pval: 0.01,
            min_snr: 0.0,
            seed: 42,
            directions: Direction::ALL.to_vec(),
        }
    }

    pub fn load_json(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self, n_samples: usize) -> Result<(), ConfigError> {
        if self.snr_pval.is_nan() || self.snr_pval <= 0.0 || self.snr_pval > 1.0 {
            return Err(ConfigError::InvalidPValue(self.snr_pval));
        }
        if self.min_n_samples == 0 {
            return Err(ConfigError::ZeroMinSamples);
        }
        if self.directions.is_empty() {
            return Err(ConfigError::NoDirections);
        }
        if self.min_n_samples >= n_samples {
            return Err(ConfigError::MinSamplesTooLarge {
                min_n_samples: self.min_n_samples,
                n_samples,
            });
        }
        Ok(())
    }
}
