//! Conflict event detection from daily negative-message clusters.
//!
//! An event needs both sides firing: a calendar day where at least two
//! participants each produced a negative-scoring message and the day's
//! combined negative count reaches the minimum. One-sided venting is not a
//! conflict.

use serde::{Deserialize, Serialize};

use crate::accumulate::AccumulatorSet;

const MIN_NEGATIVE_MESSAGES: u32 = 3;
const MIN_NEGATIVE_PARTICIPANTS: usize = 2;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConflictEvent {
    /// ISO calendar date.
    pub date: String,
    pub negative_messages: u32,
    pub participants: Vec<String>,
    /// Negative messages per participant involved, a rough intensity.
    pub intensity: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConflictStats {
    pub events: Vec<ConflictEvent>,
    pub total_events: usize,
    /// Events per active month of the conversation.
    pub events_per_month: f64,
}

pub fn derive(acc: &AccumulatorSet) -> Option<ConflictStats> {
    if acc.total_counted == 0 {
        return None;
    }

    let mut events = Vec::new();
    for (date, by_person) in &acc.daily_negative {
        let involved: Vec<String> = by_person
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(name, _)| name.clone())
            .collect();
        let total: u32 = by_person.values().sum();
        if involved.len() >= MIN_NEGATIVE_PARTICIPANTS && total >= MIN_NEGATIVE_MESSAGES {
            events.push(ConflictEvent {
                date: date.to_string(),
                negative_messages: total,
                intensity: total as f64 / involved.len() as f64,
                participants: involved,
            });
        }
    }

    let months = active_months(acc).max(1);
    Some(ConflictStats {
        total_events: events.len(),
        events_per_month: events.len() as f64 / months as f64,
        events,
    })
}

fn active_months(acc: &AccumulatorSet) -> usize {
    let mut months: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    for person in acc.persons.values() {
        months.extend(person.monthly_messages.keys().cloned());
    }
    months.len()
}
