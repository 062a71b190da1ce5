//! Outlier-robust response-time statistics.
//!
//! Raw samples are IQR-filtered before the trimmed mean and percentiles so a
//! single vacation-length gap cannot drag the headline numbers; the raw
//! extremes stay visible through `fastest_response_ms`/`slowest_response_ms`.
//! Monthly trend points are the median of each month's filtered samples,
//! median over mean for robustness to spam bursts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accumulate::AccumulatorSet;
use crate::config::AnalysisConfig;
use crate::stats;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonTiming {
    pub name: String,
    pub sample_count: usize,
    /// Set when the sample count is below the configured minimum.
    pub low_confidence: bool,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub trimmed_mean_ms: f64,
    pub std_dev_ms: f64,
    pub p75_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub skewness: f64,
    pub fastest_response_ms: f64,
    pub slowest_response_ms: f64,
    /// Median of the IQR-filtered samples per calendar month.
    pub monthly_median_ms: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimingStats {
    pub per_person: Vec<PersonTiming>,
}

pub fn derive(acc: &AccumulatorSet, config: &AnalysisConfig) -> Option<TimingStats> {
    let mut per_person = Vec::new();

    for person in acc.persons.values() {
        let raw = &person.response_times_ms;
        if raw.is_empty() {
            continue;
        }

        let filtered = stats::iqr_filter(raw, config.timing.iqr_multiplier);
        let basis = if filtered.is_empty() { raw } else { &filtered };

        let monthly_median_ms = person
            .monthly_response_ms
            .iter()
            .filter_map(|(month, samples)| {
                let month_filtered = stats::iqr_filter(samples, config.timing.iqr_multiplier);
                stats::median(&month_filtered).map(|m| (month.clone(), m))
            })
            .collect();

        per_person.push(PersonTiming {
            name: person.name.clone(),
            sample_count: raw.len(),
            low_confidence: raw.len() < config.timing.min_samples,
            mean_ms: stats::mean(raw).unwrap_or(0.0),
            median_ms: stats::median(raw).unwrap_or(0.0),
            trimmed_mean_ms: stats::trimmed_mean(basis, config.timing.trim_fraction)
                .unwrap_or(0.0),
            std_dev_ms: stats::std_dev(basis).unwrap_or(0.0),
            p75_ms: stats::percentile(basis, 75.0).unwrap_or(0.0),
            p90_ms: stats::percentile(basis, 90.0).unwrap_or(0.0),
            p95_ms: stats::percentile(basis, 95.0).unwrap_or(0.0),
            skewness: stats::pearson_skewness(basis).unwrap_or(0.0),
            fastest_response_ms: raw.iter().cloned().fold(f64::INFINITY, f64::min),
            slowest_response_ms: raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            monthly_median_ms,
        });
    }

    if per_person.is_empty() {
        return None;
    }
    Some(TimingStats { per_person })
}

impl TimingStats {
    pub fn person(&self, name: &str) -> Option<&PersonTiming> {
        self.per_person.iter().find(|p| p.name == name)
    }
}
