use std::collections::HashSet;

use crate::input::modules::ClusteringResult;
use crate::model::Direction;
use crate::model::bicluster::{Bicluster, sort_biclusters};
use crate::model::binarized::BinarizedCalls;
use crate::model::matrix::ExpressionMatrix;
use crate::pipeline::PipelineError;
use crate::stats::jenks::jenks_break;
use crate::stats::snr_sample;

#[derive(Debug, Clone, Copy)]
pub struct RefineParams {
    /// Genes below this |SNR| are pruned; 0 disables pruning.
    pub min_snr: f64,
    pub min_n_samples: usize,
}

/// One assembly pass. `bicluster` is `None` for a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct BiclusterAttempt {
    pub bicluster: Option<Bicluster>,
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefineOutcome {
    pub bicluster: Option<Bicluster>,
    pub not_clustered: Vec<String>,
    pub iterations: usize,
}

#[derive(Debug, Clone)]
pub struct DirectionResult {
    pub direction: Direction,
    /// Sorted by descending (avgSNR, n_genes, n_samples).
    pub biclusters: Vec<Bicluster>,
    pub not_clustered: Vec<String>,
    pub n_modules: usize,
}

/// Locates a module's genes in the matrix and in the binarized calls.
struct ModuleView<'a> {
    rows: Vec<&'a [f64]>,
    masks: Vec<&'a [u8]>,
}

fn module_view<'a>(
    matrix: &'a ExpressionMatrix,
    calls: &'a BinarizedCalls,
    genes: &[String],
    module: usize,
) -> Result<ModuleView<'a>, PipelineError> {
    let mut rows = Vec::with_capacity(genes.len());
    let mut masks = Vec::with_capacity(genes.len());
    for gene in genes {
        let idx = matrix
            .gene_index(gene)
            .ok_or_else(|| PipelineError::UnknownGene {
                gene: gene.clone(),
                direction: calls.direction(),
                module,
                missing_from: "expression matrix",
            })?;
        let mask = calls.mask(gene).ok_or_else(|| PipelineError::UnknownGene {
            gene: gene.clone(),
            direction: calls.direction(),
            module,
            missing_from: "binarized calls",
        })?;
        rows.push(matrix.row(idx));
        masks.push(mask);
    }
    Ok(ModuleView { rows, masks })
}

/// Builds a bicluster from a gene module: samples carrying many calls form the
/// bicluster, genes whose |SNR| between bicluster and background samples falls
/// below `min_snr` are excluded.
pub fn make_bicluster(
    matrix: &ExpressionMatrix,
    calls: &BinarizedCalls,
    genes: &[String],
    module: usize,
    params: &RefineParams,
) -> Result<BiclusterAttempt, PipelineError> {
    let failed = |excluded: Vec<String>| BiclusterAttempt {
        bicluster: None,
        excluded,
    };
    let view = module_view(matrix, calls, genes, module)?;
    let n_samples = matrix.n_samples();

    let mut ones_per_sample = vec![0.0f64; n_samples];
    for mask in &view.masks {
        for (acc, &bit) in ones_per_sample.iter_mut().zip(mask.iter()) {
            *acc += f64::from(bit);
        }
    }
    let Some(border) = jenks_break(&ones_per_sample) else {
        return Ok(failed(genes.to_vec()));
    };

    let in_bic: Vec<usize> = (0..n_samples)
        .filter(|&j| ones_per_sample[j] > border)
        .collect();
    if in_bic.len() < params.min_n_samples {
        return Ok(failed(genes.to_vec()));
    }
    let background: Vec<usize> = (0..n_samples)
        .filter(|&j| ones_per_sample[j] <= border)
        .collect();

    let mut kept = Vec::with_capacity(genes.len());
    let mut kept_snr = Vec::with_capacity(genes.len());
    let mut excluded = Vec::new();
    let mut bic_vals = Vec::with_capacity(in_bic.len());
    let mut bg_vals = Vec::with_capacity(background.len());
    for (gene, row) in genes.iter().zip(&view.rows) {
        bic_vals.clear();
        bg_vals.clear();
        bic_vals.extend(in_bic.iter().map(|&j| row[j]));
        bg_vals.extend(background.iter().map(|&j| row[j]));
        let value = snr_sample(&bic_vals, &bg_vals).abs();
        // Undefined separation counts as no signal.
        let value = if value.is_nan() { 0.0 } else { value };
        if params.min_snr > 0.0 && value < params.min_snr {
            excluded.push(gene.clone());
        } else {
            kept.push(gene.clone());
            kept_snr.push(value);
        }
    }

    if kept.len() < 2 {
        let mut all = kept;
        all.extend(excluded);
        return Ok(failed(all));
    }

    let avg_snr = kept_snr.iter().sum::<f64>() / kept_snr.len() as f64;
    let samples = in_bic
        .iter()
        .map(|&j| matrix.samples()[j].clone())
        .collect();
    tracing::debug!(
        "{} x {} avgSNR: {:.2}, dropped {}",
        kept.len(),
        in_bic.len(),
        avg_snr,
        excluded.len()
    );
    Ok(BiclusterAttempt {
        bicluster: Some(Bicluster {
            direction: calls.direction(),
            genes: kept.into_iter().collect(),
            samples,
            avg_snr,
        }),
        excluded,
    })
}

/// Re-assembles a module until no gene is pruned or it collapses. Every
/// repeat runs on a strictly smaller gene set, so the loop terminates.
pub fn assemble_and_refine(
    matrix: &ExpressionMatrix,
    calls: &BinarizedCalls,
    genes: &[String],
    module: usize,
    params: &RefineParams,
) -> Result<RefineOutcome, PipelineError> {
    let mut attempt = make_bicluster(matrix, calls, genes, module, params)?;
    let mut not_clustered = attempt.excluded.clone();
    let mut iterations = 1usize;

    loop {
        let survivors: Vec<String> = match &attempt.bicluster {
            Some(b) if !attempt.excluded.is_empty() && b.n_genes() > 1 => {
                b.genes.iter().cloned().collect()
            }
            _ => break,
        };
        attempt = make_bicluster(matrix, calls, &survivors, module, params)?;
        not_clustered.extend(attempt.excluded.iter().cloned());
        iterations += 1;
    }

    Ok(RefineOutcome {
        bicluster: attempt.bicluster,
        not_clustered,
        iterations,
    })
}

pub fn run_stage5(
    matrix: &ExpressionMatrix,
    calls: &BinarizedCalls,
    clustering: &ClusteringResult,
    params: &RefineParams,
) -> Result<DirectionResult, PipelineError> {
    let direction = calls.direction();
    let mut biclusters = Vec::new();
    let mut not_clustered = clustering.not_clustered.clone();

    for (module_idx, module) in clustering.modules.iter().enumerate() {
        let genes = dedup_preserving_order(module);
        if genes.len() != module.len() {
            tracing::warn!(
                "{} module {} lists {} duplicate genes; using unique genes",
                direction,
                module_idx,
                module.len() - genes.len()
            );
        }
        let outcome = assemble_and_refine(matrix, calls, &genes, module_idx, params)?;
        not_clustered.extend(outcome.not_clustered);
        if let Some(bicluster) = outcome.bicluster {
            biclusters.push(bicluster);
        }
    }

    sort_biclusters(&mut biclusters);
    let n_clustered: usize = biclusters.iter().map(Bicluster::n_genes).sum();
    tracing::info!(
        "{}: {} features clustered into {} modules, {} - not clustered.",
        direction,
        n_clustered,
        biclusters.len(),
        not_clustered.len()
    );

    Ok(DirectionResult {
        direction,
        biclusters,
        not_clustered,
        n_modules: clustering.modules.len(),
    })
}

fn dedup_preserving_order(genes: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(genes.len());
    genes
        .iter()
        .filter(|g| seen.insert(g.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_biclusters.rs"]
mod tests;
