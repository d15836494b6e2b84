use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("matrix has {got} values but {n_genes} genes x {n_samples} samples were declared")]
    DimensionMismatch {
        got: usize,
        n_genes: usize,
        n_samples: usize,
    },
    #[error("duplicate gene identifier: {0}")]
    DuplicateGene(String),
    #[error("duplicate sample identifier: {0}")]
    DuplicateSample(String),
}

/// Genes x samples, row-major. Immutable once built.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    genes: Vec<String>,
    samples: Vec<String>,
    values: Vec<f64>,
    gene_lookup: HashMap<String, usize>,
}

impl ExpressionMatrix {
    pub fn new(
        genes: Vec<String>,
        samples: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self, MatrixError> {
        if values.len() != genes.len() * samples.len() {
            return Err(MatrixError::DimensionMismatch {
                got: values.len(),
                n_genes: genes.len(),
                n_samples: samples.len(),
            });
        }
        let mut seen_samples = HashMap::with_capacity(samples.len());
        for (idx, sample) in samples.iter().enumerate() {
            if seen_samples.insert(sample.as_str(), idx).is_some() {
                return Err(MatrixError::DuplicateSample(sample.clone()));
            }
        }
        let mut gene_lookup = HashMap::with_capacity(genes.len());
        for (idx, gene) in genes.iter().enumerate() {
            if gene_lookup.insert(gene.clone(), idx).is_some() {
                return Err(MatrixError::DuplicateGene(gene.clone()));
            }
        }
        Ok(Self {
            genes,
            samples,
            values,
            gene_lookup,
        })
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn row(&self, gene_idx: usize) -> &[f64] {
        let n = self.samples.len();
        &self.values[gene_idx * n..(gene_idx + 1) * n]
    }

    pub fn gene_index(&self, gene: &str) -> Option<usize> {
        self.gene_lookup.get(gene).copied()
    }
}
