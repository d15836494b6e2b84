use crate::model::binarized::BinarizationSource;
use crate::report::{DirectionSummary, RunSummary, format_f64_6};

pub fn render_report_text(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("Bicluster Discovery Report\n");
    out.push_str("==========================\n\n");

    out.push_str("1. Input and configuration\n");
    out.push_str(&format!(
        "Matrix: {} features x {} samples\n",
        summary.n_genes, summary.n_samples
    ));
    out.push_str(&format!(
        "Binarization: {} (snr p-value {}, min samples {}, seed {})\n",
        summary.config.method,
        summary.config.snr_pval,
        summary.config.min_n_samples,
        summary.config.seed
    ));
    out.push_str(&format!("Module detection: {}\n", summary.clustering));
    out.push_str(&format!(
        "Minimum bicluster SNR: {}\n\n",
        format_f64_6(summary.config.min_snr)
    ));

    out.push_str("2. Binarization\n");
    let b = &summary.binarization;
    match b.source {
        BinarizationSource::Cache => {
            out.push_str("Binarized calls loaded from cache.\n");
        }
        BinarizationSource::Computed => {
            out.push_str(&format!(
                "Significant features: {} of {} ({} ambiguous)\n",
                b.n_significant, b.n_processed, b.n_ambiguous
            ));
        }
    }
    out.push_str(&format!("UP calls: {}\nDOWN calls: {}\n", b.n_up, b.n_down));
    if let Some(t) = &summary.thresholds {
        out.push_str(&format!(
            "SNR threshold: {} at size {}, {} at size {} ({} permutations)\n",
            format_f64_6(t.threshold_at_min_size),
            t.min_size,
            format_f64_6(t.threshold_at_max_size),
            t.max_size,
            t.n_perm
        ));
    }
    out.push('\n');

    out.push_str("3. Biclusters\n");
    for d in &summary.directions {
        out.push_str(&direction_line(d));
        out.push('\n');
    }

    out
}

fn direction_line(d: &DirectionSummary) -> String {
    if d.n_biclusters == 0 {
        return format!(
            "{}: no biclusters from {} modules, {} not clustered",
            d.direction, d.n_modules, d.n_not_clustered
        );
    }
    let mut line = format!(
        "{}: {} biclusters from {} modules, {} features clustered, {} not clustered",
        d.direction, d.n_biclusters, d.n_modules, d.n_clustered_genes, d.n_not_clustered
    );
    if let Some(max) = d.max_avg_snr {
        line.push_str(&format!(", best avgSNR {}", format_f64_6(max)));
    }
    if let (Some(g), Some(s)) = (d.median_n_genes, d.median_n_samples) {
        line.push_str(&format!(", median size {g} x {s}"));
    }
    line.push_str(&format!(" ({})", d.table));
    line
}
