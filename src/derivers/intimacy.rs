//! Intimacy progression from the affection lexicon, month by month.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accumulate::AccumulatorSet;
use crate::stats;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntimacyStage {
    Distant,
    Warming,
    Close,
    Intimate,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntimacyStats {
    /// Affection hits per 100 messages, per month, both sides combined.
    pub monthly_score: BTreeMap<String, f64>,
    pub current_stage: IntimacyStage,
    /// Least-squares slope of the monthly scores.
    pub trend_slope: f64,
    pub peak_month: Option<String>,
}

pub fn derive(acc: &AccumulatorSet) -> Option<IntimacyStats> {
    if acc.total_counted == 0 {
        return None;
    }

    let mut monthly_affection: BTreeMap<String, usize> = BTreeMap::new();
    let mut monthly_messages: BTreeMap<String, usize> = BTreeMap::new();
    for person in acc.persons.values() {
        for (month, count) in &person.monthly_affection {
            *monthly_affection.entry(month.clone()).or_insert(0) += count;
        }
        for (month, count) in &person.monthly_messages {
            *monthly_messages.entry(month.clone()).or_insert(0) += count;
        }
    }

    let monthly_score: BTreeMap<String, f64> = monthly_messages
        .iter()
        .map(|(month, &messages)| {
            let hits = monthly_affection.get(month).copied().unwrap_or(0);
            let score = if messages == 0 {
                0.0
            } else {
                hits as f64 / messages as f64 * 100.0
            };
            (month.clone(), score)
        })
        .collect();

    let series: Vec<f64> = monthly_score.values().copied().collect();
    let trend_slope = stats::linear_slope(&series).unwrap_or(0.0);

    // Stage from the last three months, so an old honeymoon phase doesn't
    // mask a cooled-off present.
    let recent: Vec<f64> = monthly_score.values().rev().take(3).copied().collect();
    let recent_mean = stats::mean(&recent).unwrap_or(0.0);

    let peak_month = monthly_score
        .iter()
        .max_by(|a, b| {
            a.1.partial_cmp(b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(a.0))
        })
        .filter(|(_, &score)| score > 0.0)
        .map(|(month, _)| month.clone());

    Some(IntimacyStats {
        monthly_score,
        current_stage: stage_for(recent_mean),
        trend_slope,
        peak_month,
    })
}

fn stage_for(score: f64) -> IntimacyStage {
    if score >= 8.0 {
        IntimacyStage::Intimate
    } else if score >= 3.0 {
        IntimacyStage::Close
    } else if score >= 0.5 {
        IntimacyStage::Warming
    } else {
        IntimacyStage::Distant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::PersonAccumulator;

    fn acc(months: &[(&str, usize, usize)]) -> AccumulatorSet {
        let mut person = PersonAccumulator::default();
        person.name = "A".to_string();
        for &(month, messages, affection) in months {
            person.monthly_messages.insert(month.to_string(), messages);
            if affection > 0 {
                person.monthly_affection.insert(month.to_string(), affection);
            }
            person.total_messages += messages;
        }
        let mut set = AccumulatorSet::default();
        set.total_counted = person.total_messages;
        set.persons.insert("A".to_string(), person);
        set
    }

    #[test]
    fn warming_trajectory_has_positive_slope() {
        let stats = derive(&acc(&[
            ("2024-01", 100, 0),
            ("2024-02", 100, 2),
            ("2024-03", 100, 6),
            ("2024-04", 100, 12),
        ]))
        .unwrap();
        assert!(stats.trend_slope > 0.0);
        assert_eq!(stats.peak_month.as_deref(), Some("2024-04"));
        assert_eq!(stats.current_stage, IntimacyStage::Close);
    }

    #[test]
    fn no_affection_at_all_is_distant() {
        let stats = derive(&acc(&[("2024-01", 100, 0), ("2024-02", 100, 0)])).unwrap();
        assert_eq!(stats.current_stage, IntimacyStage::Distant);
        assert_eq!(stats.peak_month, None);
    }
}
