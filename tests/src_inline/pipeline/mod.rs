use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::stage4_modules::ModuleClusterer;
use super::*;
use crate::input::cache::{BinarizedCache, FileCache};
use crate::input::modules::ClusteringResult;
use crate::model::binarized::BinarizedCalls;
use crate::model::config::BinarizationMethod;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_biclust_pipeline_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// 20 samples; gA and gB separate s0..s9 from s10..s19, gC is constant.
/// The break value itself (s19, top of the low class) lands in the up group.
fn fixture_matrix() -> ExpressionMatrix {
    let n = 20;
    let samples: Vec<String> = (0..n).map(|j| format!("s{j}")).collect();
    let genes = vec!["gA".to_string(), "gB".to_string(), "gC".to_string()];
    let mut values = Vec::with_capacity(3 * n);
    for j in 0..n {
        let x = j as f64;
        values.push(if j < 10 { 10.0 + 0.01 * x } else { 0.01 * x });
    }
    for j in 0..n {
        let x = j as f64;
        values.push(if j < 10 { 5.0 + 0.02 * x } else { -1.0 + 0.02 * x });
    }
    values.extend(std::iter::repeat_n(1.0, n));
    ExpressionMatrix::new(genes, samples, values).unwrap()
}

fn config() -> BiclusterConfig {
    BiclusterConfig {
        min_n_samples: 3,
        ..BiclusterConfig::default_v1()
    }
}

struct FixedClusterer(Vec<Vec<String>>);

impl ModuleClusterer for FixedClusterer {
    fn name(&self) -> &str {
        "fixed"
    }

    fn cluster(&self, _calls: &BinarizedCalls) -> Result<ClusteringResult, PipelineError> {
        Ok(ClusteringResult {
            modules: self.0.clone(),
            not_clustered: Vec::new(),
        })
    }
}

fn module(genes: &[&str]) -> Vec<String> {
    genes.iter().map(|g| g.to_string()).collect()
}

#[test]
fn test_binarize_without_cache() {
    let matrix = fixture_matrix();
    let run = binarize(&matrix, &config(), None).unwrap();
    let b = &run.binarization;

    assert_eq!(b.source, BinarizationSource::Computed);
    assert_eq!(b.n_processed, 3);
    assert_eq!(b.stats.len(), 2);
    assert_eq!(b.n_ambiguous, 2);
    for gene in ["gA", "gB"] {
        let up = b.up.mask(gene).unwrap();
        let down = b.down.mask(gene).unwrap();
        assert!(up[..10].iter().all(|&v| v == 1));
        assert!(up[10..19].iter().all(|&v| v == 0));
        assert_eq!(up[19], 1);
        assert!(up.iter().zip(down).all(|(u, d)| u + d == 1));
    }
    assert!(b.up.mask("gC").is_none());
    assert!(b.down.mask("gC").is_none());

    let (table, _) = run.thresholds.as_ref().unwrap();
    assert_eq!(table.len(), 20 / 2 + 1);
}

#[test]
fn test_binarize_cache_roundtrip() {
    let dir = make_temp_dir();
    let cache = FileCache::new(dir.join("fixture"));
    let matrix = fixture_matrix();
    let cfg = config();

    let cache_ref = Some(&cache as &dyn BinarizedCache);

    let first = binarize(&matrix, &cfg, cache_ref).unwrap();
    assert_eq!(first.binarization.source, BinarizationSource::Computed);
    assert!(cache.path_for(&cache_key(&cfg, Direction::Up)).exists());
    assert!(cache.path_for(&cache_key(&cfg, Direction::Down)).exists());

    let second = binarize(&matrix, &cfg, cache_ref).unwrap();
    assert_eq!(second.binarization.source, BinarizationSource::Cache);
    assert!(second.thresholds.is_none());
    assert_eq!(second.binarization.up, first.binarization.up);
    assert_eq!(second.binarization.down, first.binarization.down);

    let gmm = BiclusterConfig {
        method: BinarizationMethod::Gmm,
        ..cfg
    };
    let third = binarize(&matrix, &gmm, cache_ref).unwrap();
    assert_eq!(third.binarization.source, BinarizationSource::Computed);
}

#[test]
fn test_default_min_samples_on_small_cohort() {
    // Ten samples at the floor, ten above it: a balanced 10/10 split.
    let n = 20;
    let samples: Vec<String> = (0..n).map(|j| format!("s{j}")).collect();
    let values: Vec<f64> = (0..n)
        .map(|j| if j < 10 { 0.0 } else { 5.0 + 0.1 * (j - 10) as f64 })
        .collect();
    let matrix = ExpressionMatrix::new(vec!["gA".to_string()], samples, values).unwrap();

    let run = binarize(&matrix, &BiclusterConfig::default_v1(), None).unwrap();
    let (table, _) = run.thresholds.as_ref().unwrap();
    assert_eq!(table.sizes.last(), Some(&20));
    assert!(table.thresholds.last().unwrap().is_nan());

    let b = &run.binarization;
    assert_eq!(b.stats.len(), 1);
    assert_eq!(b.stats[0].size, 10);
    let up: Vec<u8> = (0..n).map(|j| u8::from(j >= 10)).collect();
    assert_eq!(b.up.mask("gA"), Some(&up[..]));
    assert_eq!(b.down.mask("gA").map(|m| m[0]), Some(1));
}

#[test]
fn test_binarize_rejects_bad_config() {
    let matrix = fixture_matrix();
    let too_large = BiclusterConfig {
        min_n_samples: 20,
        ..config()
    };
    assert!(matches!(
        binarize(&matrix, &too_large, None),
        Err(PipelineError::Config(ConfigError::MinSamplesTooLarge { .. }))
    ));

    let err: PipelineError = "kmeans"
        .parse::<BinarizationMethod>()
        .map_err(PipelineError::from)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Config(ConfigError::UnknownMethod(_))));
}

#[test]
fn test_discover_both_directions() {
    let matrix = fixture_matrix();
    let cfg = config();
    let run = binarize(&matrix, &cfg, None).unwrap();
    let clusterer = FixedClusterer(vec![module(&["gA", "gB"])]);

    let results = discover(&matrix, &cfg, &run.binarization, &clusterer).unwrap();
    assert_eq!(results.len(), 2);

    let up = &results[0];
    assert_eq!(up.direction, Direction::Up);
    assert_eq!(up.biclusters.len(), 1);
    let bic = &up.biclusters[0];
    assert_eq!(bic.n_genes(), 2);
    assert_eq!(bic.n_samples(), 11);
    assert!(bic.samples.contains("s0") && bic.samples.contains("s9"));
    assert!(bic.samples.contains("s19"));
    assert!(bic.avg_snr > 0.0);
    assert!(up.not_clustered.is_empty());

    let down = &results[1];
    assert_eq!(down.direction, Direction::Down);
    let bic = &down.biclusters[0];
    assert_eq!(bic.n_samples(), 9);
    assert!(bic.samples.contains("s10") && bic.samples.contains("s18"));
    assert!(!bic.samples.contains("s0") && !bic.samples.contains("s19"));
    assert!(bic.avg_snr > 0.0);
}

#[test]
fn test_discover_unknown_gene() {
    let matrix = fixture_matrix();
    let cfg = BiclusterConfig {
        directions: vec![Direction::Up],
        ..config()
    };
    let run = binarize(&matrix, &cfg, None).unwrap();
    let clusterer = FixedClusterer(vec![module(&["gA", "gZ"])]);

    let err = discover(&matrix, &cfg, &run.binarization, &clusterer).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::UnknownGene { ref gene, module: 0, .. } if gene == "gZ"
    ));
}
