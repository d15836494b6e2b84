use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::input::{InputError, find_column, read_delimited, split_ids};

/// Bicluster reported by any tool, reduced to its sample and gene sets.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredBicluster {
    pub samples: BTreeSet<String>,
    pub genes: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    /// Our own bicluster table with a header.
    Kira,
    /// Headerless `samples<TAB>genes` rows (isa2, fabia, qubic).
    TwoColumn,
    /// Three-line records; line 2 samples, line 3 genes.
    Debi,
}

impl FromStr for ResultFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kira" | "unpast" => Ok(ResultFormat::Kira),
            "isa2" | "fabia" | "qubic" => Ok(ResultFormat::TwoColumn),
            "debi" => Ok(ResultFormat::Debi),
            other => Err(format!(
                "unsupported result format '{other}' (use kira|isa2|fabia|qubic|debi)"
            )),
        }
    }
}

impl fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultFormat::Kira => "kira",
            ResultFormat::TwoColumn => "two-column",
            ResultFormat::Debi => "debi",
        };
        f.write_str(name)
    }
}

pub fn load_results(format: ResultFormat, path: &Path) -> Result<Vec<DiscoveredBicluster>, InputError> {
    match format {
        ResultFormat::Kira => load_kira_table(path),
        ResultFormat::TwoColumn => load_two_column(path),
        ResultFormat::Debi => load_debi(path),
    }
}

fn load_kira_table(path: &Path) -> Result<Vec<DiscoveredBicluster>, InputError> {
    let rows = read_delimited(path)?;
    let mut iter = rows.into_iter();
    let Some((_, header)) = iter.next() else {
        return Ok(Vec::new());
    };
    let samples_col = find_column(path, &header, "samples")?;
    let genes_col = find_column(path, &header, "genes")?;
    Ok(iter
        .map(|(_, fields)| DiscoveredBicluster {
            samples: field_set(&fields, samples_col),
            genes: field_set(&fields, genes_col),
        })
        .collect())
}

fn load_two_column(path: &Path) -> Result<Vec<DiscoveredBicluster>, InputError> {
    let rows = read_delimited(path)?;
    Ok(rows
        .into_iter()
        .map(|(_, fields)| DiscoveredBicluster {
            samples: field_set(&fields, 0),
            genes: field_set(&fields, 1),
        })
        .collect())
}

fn load_debi(path: &Path) -> Result<Vec<DiscoveredBicluster>, InputError> {
    let text = std::fs::read_to_string(path).map_err(|e| InputError::io(path, e))?;
    let mut out = Vec::new();
    let mut samples: Option<BTreeSet<String>> = None;
    for (idx, line) in text.lines().enumerate() {
        match (idx + 1) % 3 {
            2 => samples = Some(split_ids(line).into_iter().collect()),
            0 => {
                let genes = split_ids(line).into_iter().collect();
                let samples = samples.take().ok_or_else(|| {
                    InputError::parse(path, idx + 1, "gene line without a sample line")
                })?;
                out.push(DiscoveredBicluster { samples, genes });
            }
            _ => {}
        }
    }
    Ok(out)
}

fn field_set(fields: &[String], col: usize) -> BTreeSet<String> {
    fields
        .get(col)
        .map(|f| split_ids(f).into_iter().collect())
        .unwrap_or_default()
}
