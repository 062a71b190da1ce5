//! Monthly trend lines for response speed and message length, with a
//! direction classification used by the composite scorers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accumulate::AccumulatorSet;
use crate::config::AnalysisConfig;
use crate::stats;

/// Relative slope (per month, as a fraction of the series mean) below which
/// a series counts as stable.
const STABLE_BAND: f64 = 0.05;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonTrends {
    pub name: String,
    /// Median response time per month, IQR-filtered (ms).
    pub response_medians: BTreeMap<String, f64>,
    pub response_direction: TrendDirection,
    /// Relative slope of the response series, fraction of mean per month.
    pub response_relative_slope: f64,
    /// Mean words per message per month.
    pub length_means: BTreeMap<String, f64>,
    pub length_direction: TrendDirection,
    pub length_relative_slope: f64,
    /// Initiations per month.
    pub initiation_counts: BTreeMap<String, usize>,
    pub initiation_direction: TrendDirection,
    pub initiation_relative_slope: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrendStats {
    pub per_person: Vec<PersonTrends>,
}

pub fn derive(acc: &AccumulatorSet, config: &AnalysisConfig) -> Option<TrendStats> {
    let mut per_person = Vec::new();

    for person in acc.persons.values() {
        if person.total_messages == 0 {
            continue;
        }

        let response_medians: BTreeMap<String, f64> = person
            .monthly_response_ms
            .iter()
            .filter_map(|(month, samples)| {
                let filtered = stats::iqr_filter(samples, config.timing.iqr_multiplier);
                stats::median(&filtered).map(|m| (month.clone(), m))
            })
            .collect();

        let length_means: BTreeMap<String, f64> = person
            .monthly_lengths
            .iter()
            .filter_map(|(month, samples)| stats::mean(samples).map(|m| (month.clone(), m)))
            .collect();

        let (response_direction, response_relative_slope) =
            classify(&series(&response_medians));
        let (length_direction, length_relative_slope) = classify(&series(&length_means));
        let initiation_series: Vec<f64> = person
            .monthly_initiations
            .values()
            .map(|&c| c as f64)
            .collect();
        let (initiation_direction, initiation_relative_slope) = classify(&initiation_series);

        per_person.push(PersonTrends {
            name: person.name.clone(),
            response_medians,
            response_direction,
            response_relative_slope,
            length_means,
            length_direction,
            length_relative_slope,
            initiation_counts: person.monthly_initiations.clone(),
            initiation_direction,
            initiation_relative_slope,
        });
    }

    if per_person.is_empty() {
        return None;
    }
    Some(TrendStats { per_person })
}

fn series(map: &BTreeMap<String, f64>) -> Vec<f64> {
    map.values().copied().collect()
}

/// Direction from the least-squares slope scaled by the series mean; short
/// or flat series are stable.
fn classify(series: &[f64]) -> (TrendDirection, f64) {
    let slope = match stats::linear_slope(series) {
        Some(s) => s,
        None => return (TrendDirection::Stable, 0.0),
    };
    let mean = stats::mean(series).unwrap_or(0.0);
    if mean == 0.0 {
        return (TrendDirection::Stable, 0.0);
    }
    let relative = slope / mean;
    let direction = if relative > STABLE_BAND {
        TrendDirection::Rising
    } else if relative < -STABLE_BAND {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    };
    (direction, relative)
}

impl TrendStats {
    pub fn person(&self, name: &str) -> Option<&PersonTrends> {
        self.per_person.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::PersonAccumulator;

    fn acc_with_monthly_responses(months: &[(&str, Vec<f64>)]) -> AccumulatorSet {
        let mut person = PersonAccumulator::default();
        person.name = "A".to_string();
        person.total_messages = 10;
        for (month, samples) in months {
            person
                .monthly_response_ms
                .insert(month.to_string(), samples.clone());
        }
        let mut acc = AccumulatorSet::default();
        acc.total_counted = 10;
        acc.persons.insert("A".to_string(), person);
        acc
    }

    #[test]
    fn steadily_slowing_responses_classify_as_rising() {
        let acc = acc_with_monthly_responses(&[
            ("2024-01", vec![60_000.0, 70_000.0]),
            ("2024-02", vec![120_000.0, 130_000.0]),
            ("2024-03", vec![600_000.0, 700_000.0]),
        ]);
        let trends = derive(&acc, &AnalysisConfig::default()).unwrap();
        let a = trends.person("A").unwrap();
        assert_eq!(a.response_direction, TrendDirection::Rising);
        assert!(a.response_relative_slope > 0.0);
    }

    #[test]
    fn flat_series_is_stable() {
        let acc = acc_with_monthly_responses(&[
            ("2024-01", vec![60_000.0]),
            ("2024-02", vec![60_000.0]),
            ("2024-03", vec![61_000.0]),
        ]);
        let trends = derive(&acc, &AnalysisConfig::default()).unwrap();
        assert_eq!(
            trends.person("A").unwrap().response_direction,
            TrendDirection::Stable
        );
    }

    #[test]
    fn single_month_is_stable_by_default() {
        let acc = acc_with_monthly_responses(&[("2024-01", vec![60_000.0])]);
        let trends = derive(&acc, &AnalysisConfig::default()).unwrap();
        assert_eq!(
            trends.person("A").unwrap().response_direction,
            TrendDirection::Stable
        );
    }
}
