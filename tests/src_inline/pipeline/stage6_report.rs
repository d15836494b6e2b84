use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::model::binarized::{BinarizationSource, BinarizedCalls};
use crate::model::config::BinarizationMethod;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_biclust_report_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn bic(avg_snr: f64, genes: &[&str], samples: &[&str]) -> Bicluster {
    Bicluster {
        direction: Direction::Up,
        genes: set(genes),
        samples: set(samples),
        avg_snr,
    }
}

fn binarize_run() -> BinarizeRun {
    let samples: Vec<String> = ["s1", "s2", "s3"].iter().map(|s| s.to_string()).collect();
    let mut up = BinarizedCalls::empty(Direction::Up, samples.clone());
    up.push("g1".to_string(), vec![1, 1, 0]);
    let down = BinarizedCalls::empty(Direction::Down, samples);
    let table = ThresholdTable {
        n_samples: 3,
        min_n_samples: 1,
        n_perm: 100,
        sizes: vec![1, 2],
        thresholds: vec![2.5, 1.5],
    };
    let function = ThresholdFunction::from_points(vec![1.0, 2.0], vec![2.4, 1.6]);
    BinarizeRun {
        binarization: Binarization {
            up,
            down,
            stats: vec![FeatureStat {
                gene: "g1".to_string(),
                snr: 3.25,
                size: 1,
                up: true,
                down: false,
            }],
            n_processed: 4,
            n_ambiguous: 0,
            source: BinarizationSource::Computed,
        },
        thresholds: Some((table, function)),
    }
}

#[test]
fn test_bicluster_table_format() {
    let table = render_bicluster_table(&[
        bic(1.5, &["b", "a"], &["s2", "s1"]),
        bic(2.5, &["c", "d", "e"], &["s3", "s1", "s2"]),
        bic(1.5, &["x", "y", "z"], &["s1", "s2"]),
    ]);
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0], "id\tavgSNR\tn_genes\tn_samples\tdirection\tgenes\tsamples");
    assert_eq!(lines[1], "0\t2.5\t3\t3\tUP\tc d e\ts1 s2 s3");
    assert_eq!(lines[2], "1\t1.5\t3\t2\tUP\tx y z\ts1 s2");
    assert_eq!(lines[3], "2\t1.5\t2\t2\tUP\ta b\ts1 s2");
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_empty_table_has_header() {
    let dir = make_temp_dir();
    let path = dir.join("empty.tsv");
    write_bicluster_table(&path, &[]).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, format!("{}\n", BICLUSTER_COLUMNS.join("\t")));
}

#[test]
fn test_file_names() {
    let config = BiclusterConfig {
        method: BinarizationMethod::Gmm,
        snr_pval: 0.05,
        ..BiclusterConfig::default_v1()
    };
    assert_eq!(
        bicluster_table_name(&config, Direction::Down, "WGCNA"),
        "pv=0.05,method=GMM,direction=DOWN.WGCNA.biclusters.tsv"
    );
    assert_eq!(
        binarized_file_name(&config, Direction::Up),
        "pv=0.05,method=GMM,direction=UP.bin_exprs.tsv"
    );
}

#[test]
fn test_auxiliary_tables() {
    let run = binarize_run();
    assert_eq!(
        render_feature_stats(&run.binarization.stats),
        "gene\tSNR\tsize\tup\tdown\ng1\t3.25\t1\t1\t0\n"
    );
    let (table, function) = run.thresholds.as_ref().unwrap();
    assert_eq!(
        render_threshold_table(table, function),
        "size\tthreshold\tsmoothed\n1\t2.5\t2.4\n2\t1.5\t1.6\n"
    );
}

#[test]
fn test_write_reports() {
    let dir = make_temp_dir().join("out");
    let config = BiclusterConfig::default_v1();
    let run = binarize_run();
    let results = vec![
        DirectionResult {
            direction: Direction::Up,
            biclusters: vec![bic(2.0, &["g1", "g2"], &["s1", "s2"])],
            not_clustered: vec!["g3".to_string()],
            n_modules: 2,
        },
        DirectionResult {
            direction: Direction::Down,
            biclusters: Vec::new(),
            not_clustered: Vec::new(),
            n_modules: 0,
        },
    ];
    let input = Stage6Input {
        n_genes: 4,
        n_samples: 3,
        config: &config,
        run: &run,
        results: &results,
        clustering: "modules",
        tool_name: "kira-biclust".to_string(),
        tool_version: "0.1.0".to_string(),
    };
    write_reports(&input, &dir).unwrap();

    for name in [
        "pv=0.01,method=Jenks,direction=UP.modules.biclusters.tsv",
        "pv=0.01,method=Jenks,direction=DOWN.modules.biclusters.tsv",
        "pv=0.01,method=Jenks,direction=UP.bin_exprs.tsv",
        "pv=0.01,method=Jenks,direction=DOWN.bin_exprs.tsv",
        "feature_stats.tsv",
        "snr_thresholds.tsv",
        "summary.json",
        "report.txt",
    ] {
        assert!(dir.join(name).exists(), "missing {name}");
    }

    let json = fs::read_to_string(dir.join("summary.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["binarization"]["n_up"], 1);
    assert_eq!(value["thresholds"]["max_size"], 2);
    assert_eq!(value["directions"][0]["n_biclusters"], 1);
    assert_eq!(value["directions"][0]["n_clustered_genes"], 2);
    assert_eq!(value["directions"][1]["n_biclusters"], 0);

    let report = fs::read_to_string(dir.join("report.txt")).unwrap();
    assert!(report.contains("UP: 1 biclusters from 2 modules"));
    assert!(report.contains("DOWN: no biclusters"));
}

#[test]
fn test_summary_skips_unusable_sizes() {
    let config = BiclusterConfig::default_v1();
    let mut run = binarize_run();
    if let Some((table, _)) = run.thresholds.as_mut() {
        table.sizes.push(3);
        table.thresholds.push(f64::NAN);
    }
    let input = Stage6Input {
        n_genes: 4,
        n_samples: 3,
        config: &config,
        run: &run,
        results: &[],
        clustering: "modules",
        tool_name: "kira-biclust".to_string(),
        tool_version: "0.1.0".to_string(),
    };
    let thresholds = build_summary(&input, &[]).thresholds.unwrap();
    assert_eq!(thresholds.min_size, 1);
    assert_eq!(thresholds.max_size, 2);
    assert_eq!(thresholds.threshold_at_max_size, 1.5);
}
