//! Volume patterns: monthly series, weekday/weekend split, trend slope,
//! burst days.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accumulate::{trailing_daily_rate, AccumulatorSet};
use crate::config::AnalysisConfig;
use crate::stats;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BurstDay {
    pub person: String,
    /// ISO calendar date.
    pub date: String,
    pub message_count: u32,
    pub trailing_daily_rate: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PatternStats {
    /// Total message count per calendar month.
    pub monthly_total: BTreeMap<String, usize>,
    /// Per-person monthly counts.
    pub monthly_per_person: BTreeMap<String, BTreeMap<String, usize>>,
    pub weekday_messages: u64,
    pub weekend_messages: u64,
    /// Least-squares slope of the monthly totals (messages per month).
    pub monthly_trend_slope: f64,
    pub bursts: Vec<BurstDay>,
}

pub fn derive(acc: &AccumulatorSet, config: &AnalysisConfig) -> Option<PatternStats> {
    if acc.total_counted == 0 {
        return None;
    }

    let mut monthly_total: BTreeMap<String, usize> = BTreeMap::new();
    let mut monthly_per_person: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    let mut weekday_messages: u64 = 0;
    let mut weekend_messages: u64 = 0;

    for person in acc.persons.values() {
        for (month, count) in &person.monthly_messages {
            *monthly_total.entry(month.clone()).or_insert(0) += count;
        }
        monthly_per_person.insert(person.name.clone(), person.monthly_messages.clone());
        weekday_messages += person.workday_hour_histogram.iter().map(|&c| c as u64).sum::<u64>();
        weekend_messages += person.weekend_hour_histogram.iter().map(|&c| c as u64).sum::<u64>();
    }

    let monthly_series: Vec<f64> = monthly_total.values().map(|&c| c as f64).collect();
    let monthly_trend_slope = stats::linear_slope(&monthly_series).unwrap_or(0.0);

    let bursts = detect_bursts(acc, config);

    Some(PatternStats {
        monthly_total,
        monthly_per_person,
        weekday_messages,
        weekend_messages,
        monthly_trend_slope,
        bursts,
    })
}

/// A burst is a day whose count exceeds `burst_factor` times the person's
/// trailing average daily rate. Days without an established baseline (zero
/// trailing rate) never qualify.
fn detect_bursts(acc: &AccumulatorSet, config: &AnalysisConfig) -> Vec<BurstDay> {
    let mut bursts = Vec::new();
    for person in acc.persons.values() {
        for (&date, &count) in &person.daily_counts {
            let baseline =
                trailing_daily_rate(&person.daily_counts, date, config.session.burst_trailing_days);
            if baseline > 0.0 && count as f64 > config.session.burst_factor * baseline {
                bursts.push(BurstDay {
                    person: person.name.clone(),
                    date: date.to_string(),
                    message_count: count,
                    trailing_daily_rate: baseline,
                });
            }
        }
    }
    bursts.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.person.cmp(&b.person)));
    bursts
}
