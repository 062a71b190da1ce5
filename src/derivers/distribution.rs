//! Response-time distribution histograms.
//!
//! Buckets are bounded above by the session gap: anything 6h or longer was
//! never attributed as a response in the first place.

use serde::{Deserialize, Serialize};

use crate::accumulate::AccumulatorSet;
use crate::config::{AnalysisConfig, RESPONSE_BUCKETS_MS};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResponseBucket {
    pub label: String,
    pub count: usize,
    /// Share of the person's samples, 0-100.
    pub share: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonDistribution {
    pub name: String,
    pub sample_count: usize,
    pub low_confidence: bool,
    pub buckets: Vec<ResponseBucket>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DistributionStats {
    pub per_person: Vec<PersonDistribution>,
}

pub fn derive(acc: &AccumulatorSet, config: &AnalysisConfig) -> Option<DistributionStats> {
    let mut per_person = Vec::new();

    for person in acc.persons.values() {
        let samples = &person.response_times_ms;
        if samples.is_empty() {
            continue;
        }

        let mut counts = vec![0usize; RESPONSE_BUCKETS_MS.len()];
        for &sample in samples {
            let bucket = RESPONSE_BUCKETS_MS
                .iter()
                .position(|&(upper, _)| sample < upper as f64)
                .unwrap_or(RESPONSE_BUCKETS_MS.len() - 1);
            counts[bucket] += 1;
        }

        let total = samples.len() as f64;
        let buckets = RESPONSE_BUCKETS_MS
            .iter()
            .zip(&counts)
            .map(|(&(_, label), &count)| ResponseBucket {
                label: label.to_string(),
                count,
                share: count as f64 / total * 100.0,
            })
            .collect();

        per_person.push(PersonDistribution {
            name: person.name.clone(),
            sample_count: samples.len(),
            low_confidence: samples.len() < config.timing.min_samples,
            buckets,
        });
    }

    if per_person.is_empty() {
        return None;
    }
    Some(DistributionStats { per_person })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::PersonAccumulator;
    use crate::core::time::{MS_PER_HOUR, MS_PER_MINUTE};

    #[test]
    fn samples_land_in_the_right_buckets() {
        let mut person = PersonAccumulator::default();
        person.name = "A".to_string();
        person.response_times_ms = vec![
            30_000.0,                       // under 1m
            (3 * MS_PER_MINUTE) as f64,     // 1-5m
            (10 * MS_PER_MINUTE) as f64,    // 5-30m
            MS_PER_HOUR as f64,             // 30m-2h
            (3 * MS_PER_HOUR) as f64,       // 2-6h
        ];
        let mut acc = AccumulatorSet::default();
        acc.persons.insert("A".to_string(), person);

        let dist = derive(&acc, &AnalysisConfig::default()).unwrap();
        let a = &dist.per_person[0];
        assert!(a.buckets.iter().all(|b| b.count == 1));
        assert!((a.buckets[0].share - 20.0).abs() < 1e-9);
        assert_eq!(a.sample_count, 5);
        assert!(!a.low_confidence);
    }

    #[test]
    fn no_samples_means_no_bundle() {
        assert!(derive(&AccumulatorSet::default(), &AnalysisConfig::default()).is_none());
    }
}
