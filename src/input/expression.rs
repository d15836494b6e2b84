use std::io::BufRead;
use std::path::Path;

use crate::input::{InputError, delimiter_for, open_maybe_gz, read_delimited, split_fields};
use crate::model::matrix::ExpressionMatrix;

/// Genes x samples table: first row sample IDs (first cell ignored), first
/// column gene IDs.
pub fn load_expression_matrix(path: &Path) -> Result<ExpressionMatrix, InputError> {
    let rows = read_delimited(path)?;
    let mut iter = rows.into_iter();
    let (_, header) = iter
        .next()
        .ok_or_else(|| InputError::parse(path, 1, "expression file is empty"))?;
    if header.len() < 2 {
        return Err(InputError::parse(path, 1, "header has no sample columns"));
    }
    let samples: Vec<String> = header[1..].to_vec();
    let n_samples = samples.len();

    let mut genes = Vec::new();
    let mut values = Vec::new();
    for (line_no, fields) in iter {
        if fields.len() != n_samples + 1 {
            return Err(InputError::parse(
                path,
                line_no,
                format!("expected {} fields, found {}", n_samples + 1, fields.len()),
            ));
        }
        genes.push(fields[0].clone());
        for (col, raw) in fields[1..].iter().enumerate() {
            let v = parse_value(raw).ok_or_else(|| {
                InputError::parse(
                    path,
                    line_no,
                    format!("invalid value '{}' for sample {}", raw, samples[col]),
                )
            })?;
            values.push(v);
        }
    }
    if genes.is_empty() {
        return Err(InputError::parse(path, 1, "expression file has no genes"));
    }

    let matrix = ExpressionMatrix::new(genes, samples, values).map_err(|source| {
        InputError::Matrix {
            path: path.to_path_buf(),
            source,
        }
    })?;
    tracing::info!(
        "loaded expression matrix {}: {} genes x {} samples",
        path.display(),
        matrix.n_genes(),
        matrix.n_samples()
    );
    Ok(matrix)
}

/// Reads only the header line and returns the sample IDs.
pub fn read_sample_ids(path: &Path) -> Result<Vec<String>, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut header = String::new();
    reader
        .read_line(&mut header)
        .map_err(|e| InputError::io(path, e))?;
    let header = header.trim_end_matches(['\n', '\r']);
    if header.trim().is_empty() {
        return Err(InputError::parse(path, 1, "expression file is empty"));
    }
    Ok(split_fields(header, delimiter_for(path))
        .into_iter()
        .skip(1)
        .collect())
}

fn parse_value(raw: &str) -> Option<f64> {
    match raw {
        "NA" | "NaN" | "nan" | "" => None,
        _ => raw.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}
