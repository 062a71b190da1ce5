//! Pure statistics helpers shared by the metric derivers.
//!
//! Every function is total over its input: empty or undersized samples yield
//! `None` (or an empty vector) instead of NaN/Infinity leaking into the
//! output.

/// Arithmetic mean.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Median over an unsorted sample set.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Interpolated percentile, `p` in [0, 100].
pub fn percentile(samples: &[f64], p: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// First, second, and third quartiles.
pub fn quartiles(samples: &[f64]) -> Option<(f64, f64, f64)> {
    Some((
        percentile(samples, 25.0)?,
        percentile(samples, 50.0)?,
        percentile(samples, 75.0)?,
    ))
}

/// Drop samples outside `[Q1 - k*IQR, Q3 + k*IQR]`. Sets too small to carry
/// quartiles pass through unchanged.
pub fn iqr_filter(samples: &[f64], multiplier: f64) -> Vec<f64> {
    if samples.len() < 4 {
        return samples.to_vec();
    }
    let (q1, _, q3) = match quartiles(samples) {
        Some(q) => q,
        None => return samples.to_vec(),
    };
    let iqr = q3 - q1;
    let lo = q1 - multiplier * iqr;
    let hi = q3 + multiplier * iqr;
    samples
        .iter()
        .copied()
        .filter(|&x| x >= lo && x <= hi)
        .collect()
}

/// Mean after trimming `fraction` of samples from each tail.
pub fn trimmed_mean(samples: &[f64], fraction: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let trim = (sorted.len() as f64 * fraction.clamp(0.0, 0.49)).floor() as usize;
    let kept = &sorted[trim..sorted.len() - trim];
    mean(kept)
}

/// Population standard deviation.
pub fn std_dev(samples: &[f64]) -> Option<f64> {
    let m = mean(samples)?;
    if samples.len() < 2 {
        return Some(0.0);
    }
    let var = samples.iter().map(|x| (x - m).powi(2)).sum::<f64>() / samples.len() as f64;
    Some(var.sqrt())
}

/// Pearson's second skewness coefficient, `3 * (mean - median) / std_dev`.
/// Zero for degenerate distributions.
pub fn pearson_skewness(samples: &[f64]) -> Option<f64> {
    let m = mean(samples)?;
    let med = median(samples)?;
    let sd = std_dev(samples)?;
    if sd == 0.0 {
        return Some(0.0);
    }
    Some(3.0 * (m - med) / sd)
}

/// Least-squares slope of `ys` over x = 0..n. Needs at least two points.
pub fn linear_slope(ys: &[f64]) -> Option<f64> {
    let n = ys.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n_f;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    if den == 0.0 {
        return Some(0.0);
    }
    Some(num / den)
}

/// Place `value` on a percentile scale against ascending reference anchors.
/// Anchors are treated as evenly spaced percentile steps; the result is
/// clamped to [0, 100].
pub fn percentile_rank(reference: &[f64], value: f64) -> f64 {
    if reference.is_empty() {
        return 50.0;
    }
    let step = 100.0 / (reference.len() + 1) as f64;
    let mut below = 0usize;
    for (i, &anchor) in reference.iter().enumerate() {
        if value < anchor {
            // Interpolate inside the band this anchor closes.
            let band_lo = if i == 0 { 0.0 } else { reference[i - 1] };
            let span = anchor - band_lo;
            let frac = if span > 0.0 {
                ((value - band_lo) / span).clamp(0.0, 1.0)
            } else {
                0.5
            };
            return ((below as f64 + frac) * step).clamp(0.0, 100.0);
        }
        below = i + 1;
    }
    (below as f64 * step + step / 2.0).clamp(0.0, 100.0)
}

/// Cosine similarity between two equal-length vectors, 0 for zero vectors.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na * nb)).clamp(0.0, 1.0)
}

/// Balance of two non-negative magnitudes on [0, 1]; 1.0 means equal.
pub fn balance(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum <= 0.0 {
        return 0.0;
    }
    1.0 - ((a - b).abs() / sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_samples_yield_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(percentile(&[], 90.0), None);
        assert_eq!(trimmed_mean(&[], 0.1), None);
        assert_eq!(pearson_skewness(&[]), None);
        assert_eq!(linear_slope(&[]), None);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn iqr_filter_drops_extreme_outlier() {
        let mut samples: Vec<f64> = (0..20).map(|i| 60_000.0 + (i as f64) * 1_000.0).collect();
        samples.push(2_592_000_000.0); // a 30-day gap among sub-hour gaps
        let filtered = iqr_filter(&samples, 1.5);
        assert_eq!(filtered.len(), 20);
        assert!(filtered.iter().all(|&x| x < 100_000.0));
    }

    #[test]
    fn iqr_filter_passes_small_sets_through() {
        let samples = [1.0, 2.0, 1e9];
        assert_eq!(iqr_filter(&samples, 1.5), samples.to_vec());
    }

    #[test]
    fn trimmed_mean_ignores_tails() {
        let samples = [1.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 1000.0];
        assert_eq!(trimmed_mean(&samples, 0.10), Some(10.0));
    }

    #[test]
    fn slope_of_linear_series_is_exact() {
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!((linear_slope(&ys).unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(linear_slope(&[5.0, 5.0, 5.0]), Some(0.0));
    }

    #[test]
    fn percentile_rank_is_monotonic_over_anchors() {
        let refs = [1.0, 5.0, 20.0];
        let low = percentile_rank(&refs, 0.5);
        let mid = percentile_rank(&refs, 10.0);
        let high = percentile_rank(&refs, 50.0);
        assert!(low < mid && mid < high);
        assert!(high <= 100.0);
    }

    #[test]
    fn balance_bounds() {
        assert_eq!(balance(10.0, 10.0), 1.0);
        assert_eq!(balance(10.0, 0.0), 0.0);
        assert_eq!(balance(0.0, 0.0), 0.0);
    }

    proptest! {
        #[test]
        fn percentiles_are_ordered(samples in prop::collection::vec(0.0f64..1e6, 1..200)) {
            let p25 = percentile(&samples, 25.0).unwrap();
            let p75 = percentile(&samples, 75.0).unwrap();
            let p95 = percentile(&samples, 95.0).unwrap();
            prop_assert!(p25 <= p75);
            prop_assert!(p75 <= p95);
        }

        #[test]
        fn trimmed_mean_stays_within_range(samples in prop::collection::vec(0.0f64..1e6, 1..200)) {
            let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let tm = trimmed_mean(&samples, 0.10).unwrap();
            prop_assert!(tm >= min && tm <= max);
        }

        #[test]
        fn iqr_filter_never_grows(samples in prop::collection::vec(0.0f64..1e6, 0..200)) {
            prop_assert!(iqr_filter(&samples, 1.5).len() <= samples.len());
        }
    }
}
