use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::Direction;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bicluster {
    pub direction: Direction,
    pub genes: BTreeSet<String>,
    pub samples: BTreeSet<String>,
    pub avg_snr: f64,
}

impl Bicluster {
    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }
}

/// Descending by (avgSNR, n_genes, n_samples). Stable for full ties.
pub fn rank_order(a: &Bicluster, b: &Bicluster) -> Ordering {
    b.avg_snr
        .partial_cmp(&a.avg_snr)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.n_genes().cmp(&a.n_genes()))
        .then_with(|| b.n_samples().cmp(&a.n_samples()))
}

pub fn sort_biclusters(biclusters: &mut [Bicluster]) {
    biclusters.sort_by(rank_order);
}
