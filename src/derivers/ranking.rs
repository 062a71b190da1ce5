//! Percentile placement against fixed reference distributions.
//!
//! The anchors live in configuration; they are empirically chosen tunables,
//! not derived values. Placement is interpolated, so a metric between two
//! anchors lands between their percentile steps.

use serde::{Deserialize, Serialize};

use crate::accumulate::AccumulatorSet;
use crate::config::AnalysisConfig;
use crate::core::time::MS_PER_MINUTE;
use crate::core::ParsedConversation;
use crate::stats;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonRanking {
    pub name: String,
    pub messages_per_day: f64,
    /// Percentile vs the reference population, 0-100 (higher = chattier).
    pub volume_percentile: f64,
    pub median_response_minutes: Option<f64>,
    /// Higher = faster than more of the reference population.
    pub speed_percentile: Option<f64>,
    /// Share of sessions this person opened, 0-100.
    pub initiation_share: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RankingStats {
    pub per_person: Vec<PersonRanking>,
}

pub fn derive(
    conversation: &ParsedConversation,
    acc: &AccumulatorSet,
    config: &AnalysisConfig,
) -> Option<RankingStats> {
    if acc.total_counted == 0 {
        return None;
    }
    let duration_days = conversation.metadata.duration_days.max(1) as f64;
    let total_initiations: usize = acc.persons.values().map(|p| p.initiations).sum();

    let per_person = acc
        .by_activity()
        .into_iter()
        .filter(|p| p.total_messages > 0)
        .map(|person| {
            let messages_per_day = person.total_messages as f64 / duration_days;
            let median_response_minutes = stats::median(&person.response_times_ms)
                .map(|ms| ms / MS_PER_MINUTE as f64);
            let speed_percentile = median_response_minutes.map(|minutes| {
                // Fast responders sit low in the reference; flip so higher
                // means faster.
                100.0 - stats::percentile_rank(&config.rankings.median_response_minutes, minutes)
            });
            PersonRanking {
                name: person.name.clone(),
                messages_per_day,
                volume_percentile: stats::percentile_rank(
                    &config.rankings.messages_per_day,
                    messages_per_day,
                ),
                median_response_minutes,
                speed_percentile,
                initiation_share: if total_initiations == 0 {
                    0.0
                } else {
                    person.initiations as f64 / total_initiations as f64 * 100.0
                },
            }
        })
        .collect();

    Some(RankingStats { per_person })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::accumulate;
    use crate::core::{MessageKind, Platform, UnifiedMessage};
    use crate::decoders::finalize;

    const T0: i64 = 1_717_236_000_000;

    #[test]
    fn faster_responders_rank_higher_on_speed() {
        let messages = vec![
            UnifiedMessage::new("A", "hey", T0, MessageKind::Text),
            // B answers in one minute.
            UnifiedMessage::new("B", "hello", T0 + 60_000, MessageKind::Text),
            // A answers in two hours.
            UnifiedMessage::new("A", "sorry, busy day", T0 + 60_000 + 7_200_000, MessageKind::Text),
            UnifiedMessage::new("B", "all good", T0 + 60_000 + 7_260_000, MessageKind::Text),
        ];
        let conv = finalize(Platform::Messenger, "t".into(), vec![], messages, 1).unwrap();
        let acc = accumulate(&conv, &AnalysisConfig::default());
        let rankings = derive(&conv, &acc, &AnalysisConfig::default()).unwrap();

        let a = rankings.per_person.iter().find(|p| p.name == "A").unwrap();
        let b = rankings.per_person.iter().find(|p| p.name == "B").unwrap();
        assert!(b.speed_percentile.unwrap() > a.speed_percentile.unwrap());
    }

    #[test]
    fn initiation_shares_sum_to_one_hundred() {
        let messages = vec![
            UnifiedMessage::new("A", "day one", T0, MessageKind::Text),
            UnifiedMessage::new("B", "hi", T0 + 1_000, MessageKind::Text),
            // Next day, B opens.
            UnifiedMessage::new("B", "day two", T0 + 86_400_000, MessageKind::Text),
            UnifiedMessage::new("A", "hello", T0 + 86_401_000, MessageKind::Text),
        ];
        let conv = finalize(Platform::Messenger, "t".into(), vec![], messages, 1).unwrap();
        let acc = accumulate(&conv, &AnalysisConfig::default());
        let rankings = derive(&conv, &acc, &AnalysisConfig::default()).unwrap();
        let total: f64 = rankings.per_person.iter().map(|p| p.initiation_share).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }
}
