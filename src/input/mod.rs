use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use thiserror::Error;

use crate::model::matrix::MatrixError;

pub mod cache;
pub mod expression;
pub mod ground_truth;
pub mod modules;
pub mod results;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse error in {path} line {line}: {msg}")]
    Parse {
        path: PathBuf,
        line: usize,
        msg: String,
    },
    #[error("{path}: missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
    #[error("{path}: {source}")]
    Matrix {
        path: PathBuf,
        source: MatrixError,
    },
}

impl InputError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        InputError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn parse(path: &Path, line: usize, msg: impl Into<String>) -> Self {
        InputError::Parse {
            path: path.to_path_buf(),
            line,
            msg: msg.into(),
        }
    }
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path).map_err(|e| InputError::io(path, e))?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Comma for `.csv` / `.csv.gz`, tab otherwise.
pub fn delimiter_for(path: &Path) -> char {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if name.ends_with(".csv") || name.ends_with(".csv.gz") {
        ','
    } else {
        '\t'
    }
}

/// Reads non-empty lines, yielding `(line_no, fields)` with 1-based numbers.
pub fn read_delimited(path: &Path) -> Result<Vec<(usize, Vec<String>)>, InputError> {
    let delim = delimiter_for(path);
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    let mut rows = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_line(&mut buf)
            .map_err(|e| InputError::io(path, e))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        rows.push((line_no, split_fields(line, delim)));
    }
    Ok(rows)
}

pub fn split_fields(line: &str, delim: char) -> Vec<String> {
    line.split(delim).map(|s| unquote(s.trim()).to_string()).collect()
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

/// Splits a space-separated ID list, dropping empty tokens.
pub fn split_ids(field: &str) -> Vec<String> {
    field.split_whitespace().map(str::to_string).collect()
}

pub fn find_column(path: &Path, header: &[String], name: &str) -> Result<usize, InputError> {
    header
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| InputError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
