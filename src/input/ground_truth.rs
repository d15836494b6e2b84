use std::collections::BTreeSet;
use std::path::Path;

use crate::input::{InputError, find_column, read_delimited, split_ids};

/// A known sample group, optionally with its genes.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownGroup {
    pub name: String,
    pub samples: BTreeSet<String>,
    pub genes: Option<BTreeSet<String>>,
}

pub fn load_ground_truth(path: &Path) -> Result<Vec<KnownGroup>, InputError> {
    let rows = read_delimited(path)?;
    let mut iter = rows.into_iter();
    let (_, header) = iter
        .next()
        .ok_or_else(|| InputError::parse(path, 1, "ground truth file is empty"))?;
    let samples_col = find_column(path, &header, "samples")?;
    let genes_col = find_column(path, &header, "genes").ok();

    let mut groups = Vec::new();
    for (line_no, fields) in iter {
        let name = fields
            .first()
            .cloned()
            .ok_or_else(|| InputError::parse(path, line_no, "missing group name"))?;
        let samples = fields
            .get(samples_col)
            .map(|f| split_ids(f))
            .ok_or_else(|| InputError::parse(path, line_no, "missing samples field"))?;
        let genes = genes_col.map(|col| {
            fields
                .get(col)
                .map(|f| split_ids(f).into_iter().collect())
                .unwrap_or_default()
        });
        groups.push(KnownGroup {
            name,
            samples: samples.into_iter().collect(),
            genes,
        });
    }
    Ok(groups)
}
