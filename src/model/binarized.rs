use std::collections::HashMap;

use serde::Serialize;

use crate::model::Direction;

/// Significant genes of one direction, each with a 0/1 indicator over samples.
#[derive(Debug, Clone, PartialEq)]
pub struct BinarizedCalls {
    direction: Direction,
    samples: Vec<String>,
    genes: Vec<String>,
    masks: Vec<Vec<u8>>,
    lookup: HashMap<String, usize>,
}

impl BinarizedCalls {
    pub fn empty(direction: Direction, samples: Vec<String>) -> Self {
        Self {
            direction,
            samples,
            genes: Vec::new(),
            masks: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Appends a gene. A repeated gene replaces the earlier mask.
    pub fn push(&mut self, gene: String, mask: Vec<u8>) {
        debug_assert_eq!(mask.len(), self.samples.len());
        if let Some(&idx) = self.lookup.get(&gene) {
            self.masks[idx] = mask;
            return;
        }
        self.lookup.insert(gene.clone(), self.genes.len());
        self.genes.push(gene);
        self.masks.push(mask);
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn mask(&self, gene: &str) -> Option<&[u8]> {
        self.lookup.get(gene).map(|&idx| self.masks[idx].as_slice())
    }

    pub fn masks(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.genes
            .iter()
            .zip(self.masks.iter())
            .map(|(g, m)| (g.as_str(), m.as_slice()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStat {
    pub gene: String,
    pub snr: f64,
    pub size: usize,
    pub up: bool,
    pub down: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinarizationSource {
    Computed,
    Cache,
}

#[derive(Debug, Clone)]
pub struct Binarization {
    pub up: BinarizedCalls,
    pub down: BinarizedCalls,
    /// Empty when loaded from cache.
    pub stats: Vec<FeatureStat>,
    pub n_processed: usize,
    pub n_ambiguous: usize,
    pub source: BinarizationSource,
}

impl Binarization {
    pub fn calls(&self, direction: Direction) -> &BinarizedCalls {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }
}
