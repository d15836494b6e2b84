use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::input::ground_truth::KnownGroup;
use crate::input::results::DiscoveredBicluster;
use crate::pipeline::PipelineError;

pub const DEFAULT_FDR: f64 = 0.05;
pub const SCORE_COLUMN: &str = "J_weighted";

/// Best match of one known group among the discovered biclusters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScore {
    pub group: String,
    /// NaN when the group has no significant match.
    pub j_weighted: f64,
}

/// External scoring of discovered biclusters against known sample groups.
pub trait BiclusterMatcher {
    fn best_matches(
        &self,
        found: &[DiscoveredBicluster],
        known: &[KnownGroup],
        n_samples: usize,
        fdr: f64,
    ) -> Result<Vec<MatchScore>, PipelineError>;
}

/// Runs `<program> [args..] <found.tsv> <known.tsv> <N> <FDR>` and reads a
/// match table with a `J_weighted` column from its stdout.
#[derive(Debug, Clone)]
pub struct CommandMatcher {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub work_dir: PathBuf,
}

impl CommandMatcher {
    fn external(message: String) -> PipelineError {
        PipelineError::External {
            collaborator: "matcher",
            message,
        }
    }
}

impl BiclusterMatcher for CommandMatcher {
    fn best_matches(
        &self,
        found: &[DiscoveredBicluster],
        known: &[KnownGroup],
        n_samples: usize,
        fdr: f64,
    ) -> Result<Vec<MatchScore>, PipelineError> {
        fs::create_dir_all(&self.work_dir).map_err(|source| PipelineError::Write {
            path: self.work_dir.display().to_string(),
            source,
        })?;
        let found_path = self.work_dir.join("found_biclusters.tsv");
        let known_path = self.work_dir.join("known_groups.tsv");
        write_file(&found_path, &render_found(found))?;
        write_file(&known_path, &render_known(known))?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&found_path)
            .arg(&known_path)
            .arg(n_samples.to_string())
            .arg(fdr.to_string())
            .output()
            .map_err(|e| {
                Self::external(format!("could not start {}: {e}", self.program.display()))
            })?;
        if !output.status.success() {
            return Err(Self::external(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_match_table(&String::from_utf8_lossy(&output.stdout)).map_err(Self::external)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), PipelineError> {
    fs::write(path, contents).map_err(|source| PipelineError::Write {
        path: path.display().to_string(),
        source,
    })
}

pub fn render_found(found: &[DiscoveredBicluster]) -> String {
    let mut out = String::from("id\tsamples\tgenes\n");
    for (id, b) in found.iter().enumerate() {
        out.push_str(&format!(
            "{}\t{}\t{}\n",
            id,
            join_ids(b.samples.iter()),
            join_ids(b.genes.iter())
        ));
    }
    out
}

pub fn render_known(known: &[KnownGroup]) -> String {
    let mut out = String::from("group\tsamples\n");
    for g in known {
        out.push_str(&format!("{}\t{}\n", g.name, join_ids(g.samples.iter())));
    }
    out
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a String>) -> String {
    ids.map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Tab-separated table, first column the known group. Empty or `nan`
/// scores mean no match.
pub fn parse_match_table(text: &str) -> Result<Vec<MatchScore>, String> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| "matcher printed no match table".to_string())?;
    let col = header
        .split('\t')
        .position(|c| c.trim() == SCORE_COLUMN)
        .ok_or_else(|| format!("match table has no {SCORE_COLUMN} column"))?;

    let mut out = Vec::new();
    for (i, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split('\t').collect();
        let group = fields.first().map(|s| s.trim()).unwrap_or_default();
        let raw = fields.get(col).map(|s| s.trim()).unwrap_or_default();
        let j_weighted = if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
            f64::NAN
        } else {
            raw.parse::<f64>()
                .map_err(|_| format!("row {}: invalid {SCORE_COLUMN} '{raw}'", i + 2))?
        };
        out.push(MatchScore {
            group: group.to_string(),
            j_weighted,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub n_found: usize,
    pub n_known: usize,
    pub n_samples: usize,
    pub fdr: f64,
    pub n_matched: usize,
    /// Sum of `J_weighted` over matched groups.
    pub score: f64,
    pub matches: Vec<MatchScore>,
}

pub fn run_stage7(
    found: &[DiscoveredBicluster],
    known: &[KnownGroup],
    n_samples: usize,
    fdr: f64,
    matcher: &dyn BiclusterMatcher,
) -> Result<EvaluationSummary, PipelineError> {
    tracing::info!(
        "matching {} biclusters against {} known groups (N={}, FDR={})",
        found.len(),
        known.len(),
        n_samples,
        fdr
    );
    let matches = matcher.best_matches(found, known, n_samples, fdr)?;
    let matched: Vec<f64> = matches
        .iter()
        .map(|m| m.j_weighted)
        .filter(|j| !j.is_nan())
        .collect();
    let score = matched.iter().sum();
    tracing::info!("performance score: {:.4}", score);

    Ok(EvaluationSummary {
        n_found: found.len(),
        n_known: known.len(),
        n_samples,
        fdr,
        n_matched: matched.len(),
        score,
        matches,
    })
}

pub fn write_evaluation(summary: &EvaluationSummary, path: &Path) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(summary).map_err(|e| PipelineError::Write {
        path: path.display().to_string(),
        source: std::io::Error::other(e),
    })?;
    write_file(path, &json)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage7_evaluate.rs"]
mod tests;
