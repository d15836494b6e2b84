use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::input::{InputError, read_delimited};
use crate::model::Direction;
use crate::model::binarized::BinarizedCalls;
use crate::model::config::BinarizationMethod;

/// Identifies one stored binarization artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheKey {
    pub snr_pval: f64,
    pub method: BinarizationMethod,
    pub direction: Direction,
}

impl CacheKey {
    pub fn suffix(&self) -> String {
        format!(
            ".pv={},method={},direction={}",
            self.snr_pval, self.method, self.direction
        )
    }
}

/// Storage for binarized calls, keyed by (p-value, method, direction).
/// `load` returns `Ok(None)` on a miss.
pub trait BinarizedCache {
    fn load(&self, key: &CacheKey, samples: &[String]) -> Result<Option<BinarizedCalls>, InputError>;
    fn store(&self, key: &CacheKey, calls: &BinarizedCalls) -> Result<(), InputError>;
}

/// One `<prefix>.pv=..,method=..,direction=...bin_exprs.tsv` per key.
#[derive(Debug, Clone)]
pub struct FileCache {
    prefix: PathBuf,
}

impl FileCache {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        let mut name = self.prefix.as_os_str().to_os_string();
        name.push(key.suffix());
        name.push(".bin_exprs.tsv");
        PathBuf::from(name)
    }
}

impl BinarizedCache for FileCache {
    fn load(&self, key: &CacheKey, samples: &[String]) -> Result<Option<BinarizedCalls>, InputError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let calls = read_binarized_tsv(&path, key.direction)?;
        if calls.samples() != samples {
            tracing::warn!(
                "cached binarization {} was built for different samples; recomputing",
                path.display()
            );
            return Ok(None);
        }
        tracing::info!("loaded binarized expressions from {}", path.display());
        Ok(Some(calls))
    }

    fn store(&self, key: &CacheKey, calls: &BinarizedCalls) -> Result<(), InputError> {
        let path = self.path_for(key);
        write_binarized_tsv(&path, calls)?;
        tracing::info!("binarized expressions saved to {}", path.display());
        Ok(())
    }
}

/// Samples x genes table of 0/1. The header starts with `sample` so a file
/// without significant genes still has a non-empty header line.
pub fn write_binarized_tsv(path: &Path, calls: &BinarizedCalls) -> Result<(), InputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| InputError::io(parent, e))?;
        }
    }
    let file = File::create(path).map_err(|e| InputError::io(path, e))?;
    let mut w = BufWriter::new(file);
    let mut line = String::from("sample");
    for gene in calls.genes() {
        line.push('\t');
        line.push_str(gene);
    }
    line.push('\n');
    let masks: Vec<&[u8]> = calls.masks().map(|(_, m)| m).collect();
    for (col, sample) in calls.samples().iter().enumerate() {
        line.push_str(sample);
        for mask in &masks {
            line.push('\t');
            line.push(if mask[col] != 0 { '1' } else { '0' });
        }
        line.push('\n');
    }
    w.write_all(line.as_bytes())
        .and_then(|_| w.flush())
        .map_err(|e| InputError::io(path, e))
}

pub fn read_binarized_tsv(path: &Path, direction: Direction) -> Result<BinarizedCalls, InputError> {
    let rows = read_delimited(path)?;
    let mut iter = rows.into_iter();
    let (_, header) = iter
        .next()
        .ok_or_else(|| InputError::parse(path, 1, "binarized file is empty"))?;
    let genes: Vec<String> = header.into_iter().skip(1).collect();

    let mut samples = Vec::new();
    let mut columns: Vec<Vec<u8>> = vec![Vec::new(); genes.len()];
    for (line_no, fields) in iter {
        if fields.len() != genes.len() + 1 {
            return Err(InputError::parse(
                path,
                line_no,
                format!("expected {} fields, found {}", genes.len() + 1, fields.len()),
            ));
        }
        samples.push(fields[0].clone());
        for (gene_idx, raw) in fields[1..].iter().enumerate() {
            let bit = match raw.as_str() {
                "0" => 0u8,
                "1" => 1u8,
                other => {
                    return Err(InputError::parse(
                        path,
                        line_no,
                        format!("expected 0 or 1, found '{other}'"),
                    ));
                }
            };
            columns[gene_idx].push(bit);
        }
    }

    let mut calls = BinarizedCalls::empty(direction, samples);
    for (gene, mask) in genes.into_iter().zip(columns) {
        calls.push(gene, mask);
    }
    Ok(calls)
}
