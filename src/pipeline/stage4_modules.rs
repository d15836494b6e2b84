use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use crate::input::cache::write_binarized_tsv;
use crate::input::modules::{ClusteringResult, load_module_table};
use crate::model::Direction;
use crate::model::binarized::BinarizedCalls;
use crate::pipeline::PipelineError;

/// External gene-module detection over one direction's binarized calls.
pub trait ModuleClusterer {
    /// Short label used in output file names.
    fn name(&self) -> &str;

    fn cluster(&self, calls: &BinarizedCalls) -> Result<ClusteringResult, PipelineError>;
}

/// Modules computed earlier and stored as module tables, one per direction.
#[derive(Debug, Clone)]
pub struct ModuleFileClusterer {
    pub up: Option<PathBuf>,
    pub down: Option<PathBuf>,
}

impl ModuleClusterer for ModuleFileClusterer {
    fn name(&self) -> &str {
        "modules"
    }

    fn cluster(&self, calls: &BinarizedCalls) -> Result<ClusteringResult, PipelineError> {
        let path = match calls.direction() {
            Direction::Up => self.up.as_deref(),
            Direction::Down => self.down.as_deref(),
        };
        let Some(path) = path else {
            return Err(PipelineError::External {
                collaborator: "module table",
                message: format!("no module table given for direction {}", calls.direction()),
            });
        };
        let result = load_module_table(path)?;
        log_clustering(calls.direction(), &result);
        Ok(result)
    }
}

/// Runs an R script as `Rscript <script> <p1> <p2> <binarized.tsv>`; the
/// script prints the path of the module table it wrote.
#[derive(Debug, Clone)]
pub struct RscriptClusterer {
    pub rscript: PathBuf,
    pub script: PathBuf,
    pub work_dir: PathBuf,
    pub p1: u32,
    pub p2: u32,
}

impl RscriptClusterer {
    pub fn new(script: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            rscript: PathBuf::from("Rscript"),
            script,
            work_dir,
            p1: 10,
            p2: 10,
        }
    }

    fn input_path(&self, direction: Direction) -> PathBuf {
        self.work_dir
            .join(format!("direction={direction}.bin_exprs.tsv"))
    }
}

impl ModuleClusterer for RscriptClusterer {
    fn name(&self) -> &str {
        "WGCNA"
    }

    fn cluster(&self, calls: &BinarizedCalls) -> Result<ClusteringResult, PipelineError> {
        let t0 = Instant::now();
        let input = self.input_path(calls.direction());
        write_binarized_tsv(&input, calls)?;
        tracing::info!("running {} for {}", self.script.display(), input.display());

        let output = Command::new(&self.rscript)
            .arg(&self.script)
            .arg(self.p1.to_string())
            .arg(self.p2.to_string())
            .arg(&input)
            .output()
            .map_err(|e| PipelineError::External {
                collaborator: "Rscript",
                message: format!("could not start {}: {e}", self.rscript.display()),
            })?;
        if !output.status.success() {
            return Err(PipelineError::External {
                collaborator: "Rscript",
                message: format!(
                    "{} exited with {} for {}: {}",
                    self.script.display(),
                    output.status,
                    input.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        let module_file = module_path_from_stdout(&output.stdout).ok_or_else(|| {
            PipelineError::External {
                collaborator: "Rscript",
                message: format!("{} printed no module file path", self.script.display()),
            }
        })?;
        let result = load_module_table(&module_file)?;
        tracing::info!(
            "modules detected in {:.2} s",
            t0.elapsed().as_secs_f64()
        );
        log_clustering(calls.direction(), &result);
        Ok(result)
    }
}

/// Last non-empty stdout line.
pub fn module_path_from_stdout(stdout: &[u8]) -> Option<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .rev()
        .find(|l| !l.is_empty())
        .map(|l| Path::new(l).to_path_buf())
}

fn log_clustering(direction: Direction, result: &ClusteringResult) {
    tracing::info!(
        "{}: {} modules and {} not clustered genes",
        direction,
        result.modules.len(),
        result.not_clustered.len()
    );
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_modules.rs"]
mod tests;
