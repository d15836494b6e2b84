use std::path::Path;

use crate::input::{InputError, find_column, read_delimited, split_ids};

/// Gene modules produced by the external clustering step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusteringResult {
    pub modules: Vec<Vec<String>>,
    pub not_clustered: Vec<String>,
}

/// Index column holds the module id, `genes` a space-separated list. Module
/// `0` is the pool of genes the clustering left unassigned.
pub fn load_module_table(path: &Path) -> Result<ClusteringResult, InputError> {
    let rows = read_delimited(path)?;
    let mut iter = rows.into_iter();
    let (_, header) = iter
        .next()
        .ok_or_else(|| InputError::parse(path, 1, "module table is empty"))?;
    let genes_col = find_column(path, &header, "genes")?;

    let mut result = ClusteringResult::default();
    for (line_no, fields) in iter {
        let id = fields.first().map(String::as_str).unwrap_or("");
        let genes = fields.get(genes_col).map(|f| split_ids(f)).unwrap_or_default();
        if is_unclustered_id(id) {
            result.not_clustered.extend(genes);
        } else if genes.is_empty() {
            tracing::warn!(
                "empty module '{}' in {} (line {}); skipping",
                id,
                path.display(),
                line_no
            );
        } else {
            result.modules.push(genes);
        }
    }
    Ok(result)
}

fn is_unclustered_id(id: &str) -> bool {
    id.parse::<f64>().is_ok_and(|v| v == 0.0)
}
