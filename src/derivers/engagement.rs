//! Engagement metrics: message balance, double-texting, reaction rates,
//! session shape.

use serde::{Deserialize, Serialize};

use crate::accumulate::{ngrams, AccumulatorSet};
use crate::stats;

const TOP_PHRASES: usize = 10;
const TOP_EMOJI: usize = 5;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonEngagement {
    pub name: String,
    pub total_messages: usize,
    /// Share of all counted messages, 0-1.
    pub message_share: f64,
    pub total_words: usize,
    pub avg_words_per_message: f64,
    pub double_text_runs: usize,
    pub longest_double_text_run: usize,
    pub questions_asked: usize,
    pub media_sent: usize,
    pub links_shared: usize,
    pub initiations: usize,
    pub endings: usize,
    pub reaction_give_rate: f64,
    pub reaction_receive_rate: f64,
    pub top_phrases: Vec<(String, u32)>,
    pub top_emoji: Vec<(String, u32)>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EngagementStats {
    pub per_person: Vec<PersonEngagement>,
    pub total_sessions: usize,
    pub avg_session_messages: f64,
    pub longest_session_messages: u32,
}

pub fn derive(acc: &AccumulatorSet) -> Option<EngagementStats> {
    if acc.total_counted == 0 {
        return None;
    }
    let total = acc.total_counted as f64;

    let per_person = acc
        .by_activity()
        .into_iter()
        .map(|person| {
            let own = person.total_messages as f64;
            PersonEngagement {
                name: person.name.clone(),
                total_messages: person.total_messages,
                message_share: own / total,
                total_words: person.total_words,
                avg_words_per_message: person.avg_words_per_message(),
                double_text_runs: person.double_text_runs,
                longest_double_text_run: person.longest_double_text_run,
                questions_asked: person.question_count,
                media_sent: person.media_count,
                links_shared: person.link_count,
                initiations: person.initiations,
                endings: person.endings,
                reaction_give_rate: rate(person.reactions_given, own),
                reaction_receive_rate: rate(person.reactions_received, own),
                top_phrases: ngrams::top_ngrams(&person.ngram_counts, TOP_PHRASES),
                top_emoji: top_emoji(person),
            }
        })
        .collect();

    let session_lengths: Vec<f64> = acc.session_lengths.iter().map(|&l| l as f64).collect();
    Some(EngagementStats {
        per_person,
        total_sessions: acc.total_sessions,
        avg_session_messages: stats::mean(&session_lengths).unwrap_or(0.0),
        longest_session_messages: acc.session_lengths.iter().copied().max().unwrap_or(0),
    })
}

fn rate(count: usize, own_messages: f64) -> f64 {
    if own_messages == 0.0 {
        return 0.0;
    }
    count as f64 / own_messages
}

fn top_emoji(person: &crate::accumulate::PersonAccumulator) -> Vec<(String, u32)> {
    let mut entries: Vec<(String, u32)> = person
        .emoji_usage
        .iter()
        .map(|(e, c)| (e.clone(), *c))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(TOP_EMOJI);
    entries
}

impl EngagementStats {
    pub fn person(&self, name: &str) -> Option<&PersonEngagement> {
        self.per_person.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::accumulate;
    use crate::config::AnalysisConfig;
    use crate::core::{MessageKind, Platform, UnifiedMessage};
    use crate::decoders::finalize;

    const T0: i64 = 1_717_236_000_000;

    #[test]
    fn shares_and_rates_are_balanced() {
        let messages = vec![
            UnifiedMessage::new("A", "one two three", T0, MessageKind::Text),
            UnifiedMessage::new("B", "four", T0 + 1_000, MessageKind::Text),
            UnifiedMessage::new("A", "five six", T0 + 2_000, MessageKind::Text),
            UnifiedMessage::new("A", "seven", T0 + 3_000, MessageKind::Text),
        ];
        let conv = finalize(Platform::Messenger, "t".into(), vec![], messages, 1).unwrap();
        let acc = accumulate(&conv, &AnalysisConfig::default());
        let engagement = derive(&acc).unwrap();

        let a = engagement.person("A").unwrap();
        let b = engagement.person("B").unwrap();
        assert!((a.message_share - 0.75).abs() < 1e-9);
        assert!((b.message_share - 0.25).abs() < 1e-9);
        assert_eq!(a.double_text_runs, 1);
        assert_eq!(engagement.total_sessions, 1);
        assert!((engagement.avg_session_messages - 4.0).abs() < 1e-9);
    }

    #[test]
    fn empty_conversation_yields_no_bundle() {
        assert!(derive(&AccumulatorSet::default()).is_none());
    }
}
