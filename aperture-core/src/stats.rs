//! Statistical signals used by the match scorer: Pearson correlation
//! and the two-sided Mann-Whitney U test.
//!
//! The Mann-Whitney implementation follows the normal approximation
//! with average ranks for ties, tie-corrected variance, and a 0.5
//! continuity correction, matching the conventional two-sided test
//! on large samples. Histograms always have 256 samples per side, so
//! the normal approximation is appropriate.

/// Pearson correlation coefficient of two equal-length samples.
///
/// Returns 0.0 when either side has zero variance, except when both
/// sides are element-wise identical (correlation of an image with
/// itself must be perfect even for degenerate input), which returns
/// 1.0.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "samples must have equal length");
    let n = x.len() as f64;
    if n == 0.0 {
        return 0.0;
    }

    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom < 1e-12 {
        if x == y {
            return 1.0;
        }
        return 0.0;
    }
    cov / denom
}

/// Two-sided Mann-Whitney U test p-value with continuity correction.
///
/// Fully tied input (every value equal across both samples) carries
/// no location information and yields p = 1.0.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> f64 {
    let n1 = x.len() as f64;
    let n2 = y.len() as f64;
    if n1 == 0.0 || n2 == 0.0 {
        return 1.0;
    }
    let n = n1 + n2;

    // Rank the pooled samples, averaging ranks within tie groups.
    let mut pooled: Vec<(f64, usize)> = x
        .iter()
        .map(|&v| (v, 0usize))
        .chain(y.iter().map(|&v| (v, 1usize)))
        .collect();
    pooled.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("histogram bins are finite"));

    let mut rank_sum_x = 0.0;
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < pooled.len() {
        let mut j = i;
        while j < pooled.len() && pooled[j].0 == pooled[i].0 {
            j += 1;
        }
        // Ranks are 1-based; all members of the tie group share the
        // average rank of positions i..j.
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        let t = (j - i) as f64;
        tie_term += t * t * t - t;
        for entry in &pooled[i..j] {
            if entry.1 == 0 {
                rank_sum_x += avg_rank;
            }
        }
        i = j;
    }

    let u1 = rank_sum_x - n1 * (n1 + 1.0) / 2.0;
    let mean_u = n1 * n2 / 2.0;
    let variance = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if variance <= 0.0 {
        return 1.0;
    }

    let numerator = ((u1 - mean_u).abs() - 0.5).max(0.0);
    let z = numerator / variance.sqrt();
    (2.0 * (1.0 - standard_normal_cdf(z))).clamp(0.0, 1.0)
}

/// Standard normal CDF via the Abramowitz & Stegun erf approximation
/// (maximum absolute error ~1.5e-7).
fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}
