/// Two-class natural breaks (Fisher-Jenks with k = 2).
///
/// Returns the largest value of the lower class, i.e. the inner break of
/// `[min, break, max]`. Among equally good splits the smallest lower class
/// wins. `None` for fewer than two values.
pub fn jenks_break(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    // Centering keeps the prefix-sum variance free of large cancellations.
    let center = sorted.iter().sum::<f64>() / n as f64;
    let mut prefix = Vec::with_capacity(n + 1);
    let mut prefix_sq = Vec::with_capacity(n + 1);
    prefix.push(0.0f64);
    prefix_sq.push(0.0f64);
    for &v in &sorted {
        let c = v - center;
        prefix.push(prefix[prefix.len() - 1] + c);
        prefix_sq.push(prefix_sq[prefix_sq.len() - 1] + c * c);
    }
    let total = prefix[n];
    let total_sq = prefix_sq[n];

    let mut best_k = 1usize;
    let mut best_cost = f64::INFINITY;
    for k in 1..n {
        let lower = prefix[k];
        let lower_sq = prefix_sq[k];
        let upper = total - lower;
        let upper_sq = total_sq - lower_sq;
        let ssd_lower = lower_sq - lower * lower / k as f64;
        let ssd_upper = upper_sq - upper * upper / (n - k) as f64;
        let cost = ssd_lower.max(0.0) + ssd_upper.max(0.0);
        if cost < best_cost {
            best_cost = cost;
            best_k = k;
        }
    }
    Some(sorted[best_k - 1])
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/jenks.rs"]
mod tests;
