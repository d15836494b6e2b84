use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::input::cache::write_binarized_tsv;
use crate::model::Direction;
use crate::model::bicluster::{Bicluster, rank_order};
use crate::model::binarized::{Binarization, FeatureStat};
use crate::model::config::BiclusterConfig;
use crate::model::thresholds::{ThresholdFunction, ThresholdTable};
use crate::pipeline::stage5_biclusters::DirectionResult;
use crate::pipeline::{BinarizeRun, PipelineError};
use crate::report::json::render_summary_json;
use crate::report::text::render_report_text;
use crate::report::{
    BinarizationSummary, DirectionSummary, RunSummary, ThresholdSummary, median_count,
};

pub const BICLUSTER_COLUMNS: [&str; 7] = [
    "id",
    "avgSNR",
    "n_genes",
    "n_samples",
    "direction",
    "genes",
    "samples",
];

#[derive(Debug, Clone)]
pub struct Stage6Input<'a> {
    pub n_genes: usize,
    pub n_samples: usize,
    pub config: &'a BiclusterConfig,
    pub run: &'a BinarizeRun,
    pub results: &'a [DirectionResult],
    pub clustering: &'a str,
    pub tool_name: String,
    pub tool_version: String,
}

pub fn bicluster_table_name(
    config: &BiclusterConfig,
    direction: Direction,
    clustering: &str,
) -> String {
    format!(
        "pv={},method={},direction={}.{}.biclusters.tsv",
        config.snr_pval, config.method, direction, clustering
    )
}

pub fn binarized_file_name(config: &BiclusterConfig, direction: Direction) -> String {
    format!(
        "pv={},method={},direction={}.bin_exprs.tsv",
        config.snr_pval, config.method, direction
    )
}

/// Biclusters ranked by (avgSNR, n_genes, n_samples) descending, re-indexed
/// from 0. Header only when there are none.
pub fn render_bicluster_table(biclusters: &[Bicluster]) -> String {
    let mut ranked: Vec<&Bicluster> = biclusters.iter().collect();
    ranked.sort_by(|a, b| rank_order(a, b));

    let mut out = BICLUSTER_COLUMNS.join("\t");
    out.push('\n');
    for (id, b) in ranked.iter().enumerate() {
        let genes = b.genes.iter().map(String::as_str).collect::<Vec<_>>();
        let samples = b.samples.iter().map(String::as_str).collect::<Vec<_>>();
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            id,
            b.avg_snr,
            b.n_genes(),
            b.n_samples(),
            b.direction,
            genes.join(" "),
            samples.join(" ")
        ));
    }
    out
}

pub fn write_bicluster_table(path: &Path, biclusters: &[Bicluster]) -> Result<(), PipelineError> {
    if biclusters.is_empty() {
        tracing::warn!("No biclusters found");
    }
    write_text(path, &render_bicluster_table(biclusters))
}

pub fn render_feature_stats(stats: &[FeatureStat]) -> String {
    let mut out = String::from("gene\tSNR\tsize\tup\tdown\n");
    for s in stats {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            s.gene,
            s.snr,
            s.size,
            u8::from(s.up),
            u8::from(s.down)
        ));
    }
    out
}

pub fn render_threshold_table(table: &ThresholdTable, function: &ThresholdFunction) -> String {
    let mut out = String::from("size\tthreshold\tsmoothed\n");
    for (&size, &threshold) in table.sizes.iter().zip(&table.thresholds) {
        out.push_str(&format!(
            "{}\t{}\t{}\n",
            size,
            threshold,
            function.min_snr(size as f64)
        ));
    }
    out
}

/// Per-direction binarized matrices, feature statistics and, when the calls
/// were computed in this run, the threshold table.
pub fn write_binarization_outputs(
    run: &BinarizeRun,
    config: &BiclusterConfig,
    out_dir: &Path,
) -> Result<(), PipelineError> {
    create_dir(out_dir)?;
    for direction in Direction::ALL {
        let path = out_dir.join(binarized_file_name(config, direction));
        write_binarized_tsv(&path, run.binarization.calls(direction))?;
    }
    write_text(
        &out_dir.join("feature_stats.tsv"),
        &render_feature_stats(&run.binarization.stats),
    )?;
    if let Some((table, function)) = &run.thresholds {
        write_text(
            &out_dir.join("snr_thresholds.tsv"),
            &render_threshold_table(table, function),
        )?;
    }
    Ok(())
}

pub fn write_reports(input: &Stage6Input<'_>, out_dir: &Path) -> Result<(), PipelineError> {
    write_binarization_outputs(input.run, input.config, out_dir)?;

    let mut tables = Vec::with_capacity(input.results.len());
    for result in input.results {
        let name = bicluster_table_name(input.config, result.direction, input.clustering);
        write_bicluster_table(&out_dir.join(&name), &result.biclusters)?;
        tables.push(name);
    }

    let summary = build_summary(input, &tables);
    let json = render_summary_json(&summary).map_err(|e| PipelineError::Write {
        path: out_dir.join("summary.json").display().to_string(),
        source: std::io::Error::other(e),
    })?;
    write_text(&out_dir.join("summary.json"), &json)?;
    write_text(&out_dir.join("report.txt"), &render_report_text(&summary))?;

    tracing::info!("reports written to {}", out_dir.display());
    Ok(())
}

pub fn build_summary(input: &Stage6Input<'_>, tables: &[String]) -> RunSummary {
    let directions = input
        .results
        .iter()
        .zip(tables)
        .map(|(result, table)| direction_summary(result, table))
        .collect();

    RunSummary {
        tool: input.tool_name.clone(),
        version: input.tool_version.clone(),
        clustering: input.clustering.to_string(),
        n_genes: input.n_genes,
        n_samples: input.n_samples,
        config: input.config.clone(),
        binarization: binarization_summary(&input.run.binarization),
        thresholds: input
            .run
            .thresholds
            .as_ref()
            .and_then(|(table, _)| threshold_summary(table)),
        directions,
    }
}

fn binarization_summary(b: &Binarization) -> BinarizationSummary {
    BinarizationSummary {
        source: b.source,
        n_processed: b.n_processed,
        n_significant: b.stats.len(),
        n_up: b.up.n_genes(),
        n_down: b.down.n_genes(),
        n_ambiguous: b.n_ambiguous,
    }
}

/// Range of sizes that produced a usable threshold.
fn threshold_summary(table: &ThresholdTable) -> Option<ThresholdSummary> {
    let mut usable = table
        .sizes
        .iter()
        .zip(&table.thresholds)
        .filter(|(_, t)| t.is_finite());
    let (&min_size, &threshold_at_min_size) = usable.next()?;
    let (max_size, threshold_at_max_size) = usable
        .last()
        .map_or((min_size, threshold_at_min_size), |(&s, &t)| (s, t));
    Some(ThresholdSummary {
        n_perm: table.n_perm,
        min_size,
        max_size,
        threshold_at_min_size,
        threshold_at_max_size,
    })
}

fn direction_summary(result: &DirectionResult, table: &str) -> DirectionSummary {
    let n_genes: Vec<usize> = result.biclusters.iter().map(Bicluster::n_genes).collect();
    let n_samples: Vec<usize> = result.biclusters.iter().map(Bicluster::n_samples).collect();
    DirectionSummary {
        direction: result.direction,
        table: table.to_string(),
        n_modules: result.n_modules,
        n_biclusters: result.biclusters.len(),
        n_clustered_genes: n_genes.iter().sum(),
        n_not_clustered: result.not_clustered.len(),
        max_avg_snr: result
            .biclusters
            .iter()
            .map(|b| b.avg_snr)
            .reduce(f64::max),
        median_n_genes: median_count(&n_genes),
        median_n_samples: median_count(&n_samples),
    }
}

fn create_dir(dir: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(dir).map_err(|source| PipelineError::Write {
        path: dir.display().to_string(),
        source,
    })
}

fn write_text(path: &Path, contents: &str) -> Result<(), PipelineError> {
    let write = || -> std::io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        w.write_all(contents.as_bytes())?;
        w.flush()
    };
    write().map_err(|source| PipelineError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_report.rs"]
mod tests;
