//! Chronotype and social jet-lag from message-timing histograms.
//!
//! The activity midpoint is the circular mean of the hourly histogram, the
//! same trick mid-sleep-point methods use so a distribution straddling
//! midnight doesn't average out to noon. Social jet-lag is the circular
//! distance between the workday and weekend midpoints.

use serde::{Deserialize, Serialize};

use crate::accumulate::AccumulatorSet;
use crate::config::MIN_CHRONOTYPE_MESSAGES;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChronotypeLabel {
    MorningLark,
    Intermediate,
    NightOwl,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonChronotype {
    pub name: String,
    pub peak_hour: u32,
    /// Circular mean of the full hourly histogram, hours [0, 24).
    pub midpoint_hour: f64,
    pub workday_midpoint: Option<f64>,
    pub weekend_midpoint: Option<f64>,
    /// Circular distance between workday and weekend midpoints, hours [0, 12].
    pub social_jet_lag_hours: Option<f64>,
    pub label: ChronotypeLabel,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChronotypeMatch {
    pub a: String,
    pub b: String,
    pub midpoint_delta_hours: f64,
    /// 100 at identical midpoints, 0 at the 12-hour antipode.
    pub match_score: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChronotypeStats {
    pub per_person: Vec<PersonChronotype>,
    pub matches: Vec<ChronotypeMatch>,
}

pub fn derive(acc: &AccumulatorSet) -> Option<ChronotypeStats> {
    let mut per_person = Vec::new();

    for person in acc.persons.values() {
        if person.total_messages < MIN_CHRONOTYPE_MESSAGES {
            continue;
        }
        let midpoint = match circular_mean_hour(&person.hour_histogram) {
            Some(m) => m,
            None => continue,
        };
        let workday = circular_mean_hour(&person.workday_hour_histogram);
        let weekend = circular_mean_hour(&person.weekend_hour_histogram);
        let jet_lag = match (workday, weekend) {
            (Some(w), Some(e)) => Some(circular_distance(w, e)),
            _ => None,
        };

        per_person.push(PersonChronotype {
            name: person.name.clone(),
            peak_hour: peak_hour(&person.hour_histogram),
            midpoint_hour: midpoint,
            workday_midpoint: workday,
            weekend_midpoint: weekend,
            social_jet_lag_hours: jet_lag,
            label: label_for(midpoint),
        });
    }

    if per_person.is_empty() {
        return None;
    }

    let mut matches = Vec::new();
    for (i, a) in per_person.iter().enumerate() {
        for b in per_person.iter().skip(i + 1) {
            let delta = circular_distance(a.midpoint_hour, b.midpoint_hour);
            matches.push(ChronotypeMatch {
                a: a.name.clone(),
                b: b.name.clone(),
                midpoint_delta_hours: delta,
                match_score: ((1.0 - delta / 12.0) * 100.0).clamp(0.0, 100.0),
            });
        }
    }

    Some(ChronotypeStats { per_person, matches })
}

fn peak_hour(histogram: &[u32; 24]) -> u32 {
    histogram
        .iter()
        .enumerate()
        .max_by_key(|&(hour, &count)| (count, std::cmp::Reverse(hour)))
        .map(|(hour, _)| hour as u32)
        .unwrap_or(0)
}

/// Circular mean over hour bins, each bin centered on its half hour.
fn circular_mean_hour(histogram: &[u32; 24]) -> Option<f64> {
    let total: u64 = histogram.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return None;
    }
    let mut sin_sum = 0.0;
    let mut cos_sum = 0.0;
    for (hour, &count) in histogram.iter().enumerate() {
        let angle = (hour as f64 + 0.5) / 24.0 * std::f64::consts::TAU;
        sin_sum += count as f64 * angle.sin();
        cos_sum += count as f64 * angle.cos();
    }
    if sin_sum == 0.0 && cos_sum == 0.0 {
        return None;
    }
    let mean_angle = sin_sum.atan2(cos_sum);
    let hours = mean_angle / std::f64::consts::TAU * 24.0;
    Some(hours.rem_euclid(24.0))
}

/// Shortest way around the 24-hour clock, [0, 12].
fn circular_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(24.0);
    diff.min(24.0 - diff)
}

fn label_for(midpoint: f64) -> ChronotypeLabel {
    if (5.0..14.0).contains(&midpoint) {
        ChronotypeLabel::MorningLark
    } else if (14.0..20.0).contains(&midpoint) {
        ChronotypeLabel::Intermediate
    } else {
        ChronotypeLabel::NightOwl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::PersonAccumulator;

    fn person_with_hours(name: &str, hours: &[(usize, u32)]) -> PersonAccumulator {
        let mut person = PersonAccumulator::default();
        person.name = name.to_string();
        for &(hour, count) in hours {
            person.hour_histogram[hour] = count;
            person.workday_hour_histogram[hour] = count;
            person.weekend_hour_histogram[(hour + 2) % 24] = count;
            person.total_messages += count as usize;
        }
        person
    }

    #[test]
    fn midnight_straddling_activity_keeps_a_night_midpoint() {
        let mut acc = AccumulatorSet::default();
        acc.persons.insert(
            "A".to_string(),
            person_with_hours("A", &[(23, 10), (0, 10), (1, 10)]),
        );
        let stats = derive(&acc).unwrap();
        let a = &stats.per_person[0];
        // The circular mean lands near midnight, not at noon.
        assert!(a.midpoint_hour > 22.0 || a.midpoint_hour < 2.0);
        assert_eq!(a.label, ChronotypeLabel::NightOwl);
    }

    #[test]
    fn jet_lag_is_the_circular_midpoint_distance() {
        let mut acc = AccumulatorSet::default();
        acc.persons
            .insert("A".to_string(), person_with_hours("A", &[(20, 30)]));
        let stats = derive(&acc).unwrap();
        let a = &stats.per_person[0];
        let lag = a.social_jet_lag_hours.unwrap();
        assert!((lag - 2.0).abs() < 0.1);
    }

    #[test]
    fn match_score_decreases_with_midpoint_delta() {
        let mut acc = AccumulatorSet::default();
        acc.persons
            .insert("A".to_string(), person_with_hours("A", &[(9, 30)]));
        acc.persons
            .insert("B".to_string(), person_with_hours("B", &[(10, 30)]));
        acc.persons
            .insert("C".to_string(), person_with_hours("C", &[(21, 30)]));
        let stats = derive(&acc).unwrap();

        let ab = stats
            .matches
            .iter()
            .find(|m| m.a == "A" && m.b == "B")
            .unwrap();
        let ac = stats
            .matches
            .iter()
            .find(|m| m.a == "A" && m.b == "C")
            .unwrap();
        assert!(ab.match_score > ac.match_score);
        assert!(ab.match_score > 90.0);
    }

    #[test]
    fn sparse_participants_are_excluded() {
        let mut acc = AccumulatorSet::default();
        acc.persons
            .insert("A".to_string(), person_with_hours("A", &[(9, 5)]));
        assert!(derive(&acc).is_none());
    }
}
