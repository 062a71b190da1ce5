//! The single-pass accumulation over a sorted conversation.
//!
//! One forward O(n) scan builds every per-person running aggregate the
//! metric derivers read: monthly buckets, session boundaries, response-time
//! samples, streaks, histograms. This is the only place cross-message state
//! is mutated; the returned `AccumulatorSet` is frozen by ownership — every
//! deriver takes it by shared reference. Derivers must not re-scan the
//! message list for anything captured here, so metrics that should agree do.

pub mod ngrams;
pub mod text;

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::config::AnalysisConfig;
use crate::core::time;
use crate::core::{MessageKind, ParsedConversation, UnifiedMessage};
use crate::derivers::sentiment::{score_text, NEGATIVE_MESSAGE_THRESHOLD};

/// Running aggregates for one participant.
#[derive(Clone, Debug, Default)]
pub struct PersonAccumulator {
    pub name: String,

    pub total_messages: usize,
    pub total_words: usize,
    pub total_chars: usize,
    pub emoji_count: usize,
    pub question_count: usize,
    pub media_count: usize,
    pub link_count: usize,
    pub unsent_count: usize,
    pub late_night_count: usize,
    pub morning_count: usize,
    pub reactions_given: usize,
    pub reactions_received: usize,

    pub initiations: usize,
    pub endings: usize,
    pub double_text_runs: usize,
    pub longest_double_text_run: usize,

    /// Response-time samples in milliseconds, attributed to the responder.
    pub response_times_ms: Vec<f64>,
    pub monthly_response_ms: BTreeMap<String, Vec<f64>>,

    pub monthly_messages: BTreeMap<String, usize>,
    pub monthly_words: BTreeMap<String, usize>,
    /// Words-per-message samples bucketed by month.
    pub monthly_lengths: BTreeMap<String, Vec<f64>>,
    pub monthly_sentiment: BTreeMap<String, Vec<f64>>,
    pub monthly_affection: BTreeMap<String, usize>,
    pub monthly_initiations: BTreeMap<String, usize>,
    pub sentiment_samples: Vec<f64>,

    pub hour_histogram: [u32; 24],
    pub workday_hour_histogram: [u32; 24],
    pub weekend_hour_histogram: [u32; 24],
    /// Day-of-week (Monday = 0) by hour-of-day.
    pub heatmap: [[u32; 24]; 7],
    pub daily_counts: BTreeMap<NaiveDate, u32>,

    pub ngram_counts: HashMap<String, u32>,
    pub emoji_usage: HashMap<String, u32>,
}

impl PersonAccumulator {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn avg_words_per_message(&self) -> f64 {
        if self.total_messages == 0 {
            return 0.0;
        }
        self.total_words as f64 / self.total_messages as f64
    }
}

/// The frozen output of the accumulation pass.
#[derive(Clone, Debug, Default)]
pub struct AccumulatorSet {
    /// Keyed by participant name; BTreeMap for deterministic iteration.
    pub persons: BTreeMap<String, PersonAccumulator>,

    pub total_sessions: usize,
    /// Messages per session, in chronological session order.
    pub session_lengths: Vec<u32>,

    pub combined_heatmap: [[u32; 24]; 7],
    pub combined_daily: BTreeMap<NaiveDate, u32>,

    /// Directed reply counts: (responder, original sender) -> count.
    pub reply_pairs: BTreeMap<(String, String), u32>,

    /// Negative-message counts per day per person, for conflict detection.
    pub daily_negative: BTreeMap<NaiveDate, BTreeMap<String, u32>>,

    pub total_counted: usize,
}

impl AccumulatorSet {
    pub fn person(&self, name: &str) -> Option<&PersonAccumulator> {
        self.persons.get(name)
    }

    /// Participant names ordered by descending message count, then name.
    pub fn by_activity(&self) -> Vec<&PersonAccumulator> {
        let mut persons: Vec<&PersonAccumulator> = self.persons.values().collect();
        persons.sort_by(|a, b| {
            b.total_messages
                .cmp(&a.total_messages)
                .then_with(|| a.name.cmp(&b.name))
        });
        persons
    }

    /// Distinct calendar days spanned by the daily counts.
    pub fn active_days(&self) -> usize {
        self.combined_daily.len()
    }
}

/// Run the single forward scan. Messages are already chronological; system
/// messages are skipped entirely.
pub fn accumulate(conversation: &ParsedConversation, config: &AnalysisConfig) -> AccumulatorSet {
    let offset = time::local_offset(config.utc_offset_minutes);
    let gap_threshold = config.session.session_gap_ms;
    let affection_terms: Vec<String> = config
        .lexicons
        .affection_terms
        .iter()
        .map(|t| t.to_lowercase())
        .collect();

    let mut set = AccumulatorSet::default();
    for participant in &conversation.participants {
        set.persons
            .entry(participant.name.clone())
            .or_insert_with(|| PersonAccumulator::new(&participant.name));
    }

    let mut prev: Option<&UnifiedMessage> = None;
    let mut session_len: u32 = 0;
    let mut same_sender_run: usize = 1;

    for message in conversation.messages.iter() {
        if message.kind == MessageKind::System {
            continue;
        }
        set.total_counted += 1;

        let month = time::month_key(message.timestamp_ms, offset);
        let date = time::local_date(message.timestamp_ms, offset);
        let hour = time::local_hour(message.timestamp_ms, offset);
        let weekday = time::local_weekday(message.timestamp_ms, offset);

        // Session, streak, and response bookkeeping against the previous
        // counted message.
        match prev {
            None => {
                record_initiation(&mut set, &message.sender, &month);
                session_len = 1;
                same_sender_run = 1;
            }
            Some(previous) => {
                let gap = message.timestamp_ms - previous.timestamp_ms;
                if gap >= gap_threshold {
                    close_session(&mut set, previous, session_len);
                    record_initiation(&mut set, &message.sender, &month);
                    session_len = 1;
                    same_sender_run = 1;
                } else {
                    session_len += 1;
                    if previous.sender == message.sender {
                        same_sender_run += 1;
                        let person = person_mut(&mut set, &message.sender);
                        if same_sender_run == 2 {
                            person.double_text_runs += 1;
                        }
                        if same_sender_run > person.longest_double_text_run {
                            person.longest_double_text_run = same_sender_run;
                        }
                    } else {
                        same_sender_run = 1;
                        let person = person_mut(&mut set, &message.sender);
                        person.response_times_ms.push(gap as f64);
                        person
                            .monthly_response_ms
                            .entry(month.clone())
                            .or_default()
                            .push(gap as f64);
                        *set
                            .reply_pairs
                            .entry((message.sender.clone(), previous.sender.clone()))
                            .or_insert(0) += 1;
                    }
                }
            }
        }

        // Reactions credit the actor and the message author.
        for reaction in &message.reactions {
            if !reaction.actor.is_empty() {
                person_mut(&mut set, &reaction.actor).reactions_given += 1;
            }
        }

        let words = text::word_count(&message.content);
        let sentiment = match message.kind {
            MessageKind::Text | MessageKind::Link => score_text(&message.content),
            _ => None,
        };
        let lowered = message.content.to_lowercase();
        let affection_hits = affection_terms
            .iter()
            .filter(|term| lowered.contains(term.as_str()))
            .count();

        let is_late = config.session.is_late_night(hour);
        let is_morning = (5..9).contains(&hour);
        let is_weekend = weekday >= 5;

        let person = person_mut(&mut set, &message.sender);
        person.total_messages += 1;
        person.total_words += words;
        person.total_chars += message.content.chars().count();
        person.reactions_received += message.reactions.len();
        *person.monthly_messages.entry(month.clone()).or_insert(0) += 1;
        *person.monthly_words.entry(month.clone()).or_insert(0) += words;
        person
            .monthly_lengths
            .entry(month.clone())
            .or_default()
            .push(words as f64);
        if affection_hits > 0 {
            *person.monthly_affection.entry(month.clone()).or_insert(0) += affection_hits;
        }

        if let Some(score) = sentiment {
            person.sentiment_samples.push(score);
            person
                .monthly_sentiment
                .entry(month.clone())
                .or_default()
                .push(score);
        }

        person.hour_histogram[hour as usize] += 1;
        if is_weekend {
            person.weekend_hour_histogram[hour as usize] += 1;
        } else {
            person.workday_hour_histogram[hour as usize] += 1;
        }
        person.heatmap[weekday][hour as usize] += 1;
        *person.daily_counts.entry(date).or_insert(0) += 1;
        if is_late {
            person.late_night_count += 1;
        }
        if is_morning {
            person.morning_count += 1;
        }

        if message.is_unsent {
            person.unsent_count += 1;
        }
        if message.has_media {
            person.media_count += 1;
        }
        if message.has_link {
            person.link_count += 1;
        }
        if message.kind == MessageKind::Text || message.kind == MessageKind::Link {
            if text::contains_question(&message.content) {
                person.question_count += 1;
            }
            for emoji in text::emojis(&message.content) {
                person.emoji_count += 1;
                *person.emoji_usage.entry(emoji.to_string()).or_insert(0) += 1;
            }
            ngrams::count_ngrams(&message.content, &mut person.ngram_counts);
        }

        if let Some(score) = sentiment {
            if score <= NEGATIVE_MESSAGE_THRESHOLD {
                *set
                    .daily_negative
                    .entry(date)
                    .or_default()
                    .entry(message.sender.clone())
                    .or_insert(0) += 1;
            }
        }

        set.combined_heatmap[weekday][hour as usize] += 1;
        *set.combined_daily.entry(date).or_insert(0) += 1;

        prev = Some(message);
    }

    if let Some(last) = prev {
        close_session(&mut set, last, session_len);
    }

    log::debug!(
        "accumulated {} messages into {} person aggregates over {} sessions",
        set.total_counted,
        set.persons.len(),
        set.total_sessions
    );

    set
}

fn person_mut<'a>(set: &'a mut AccumulatorSet, name: &str) -> &'a mut PersonAccumulator {
    set.persons
        .entry(name.to_string())
        .or_insert_with(|| PersonAccumulator::new(name))
}

fn record_initiation(set: &mut AccumulatorSet, sender: &str, month: &str) {
    let person = person_mut(set, sender);
    person.initiations += 1;
    *person
        .monthly_initiations
        .entry(month.to_string())
        .or_insert(0) += 1;
}

fn close_session(set: &mut AccumulatorSet, last_message: &UnifiedMessage, session_len: u32) {
    set.total_sessions += 1;
    set.session_lengths.push(session_len);
    person_mut(set, &last_message.sender).endings += 1;
}

/// Average daily message rate over a trailing window ending the day before
/// `date`, used by burst detection.
pub fn trailing_daily_rate(
    daily: &BTreeMap<NaiveDate, u32>,
    date: NaiveDate,
    trailing_days: i64,
) -> f64 {
    if trailing_days <= 0 {
        return 0.0;
    }
    let window_start = date - chrono::Duration::days(trailing_days);
    let total: u64 = daily
        .range(window_start..date)
        .map(|(_, &count)| count as u64)
        .sum();
    total as f64 / trailing_days as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::core::time::{MS_PER_DAY, MS_PER_HOUR, MS_PER_MINUTE};
    use crate::core::{Platform, Reaction};
    use crate::decoders::finalize;

    fn conversation(rows: &[(&str, &str, i64)]) -> ParsedConversation {
        let messages = rows
            .iter()
            .map(|(sender, content, ts)| {
                UnifiedMessage::new(*sender, *content, *ts, MessageKind::Text)
            })
            .collect();
        finalize(Platform::Messenger, "t".into(), vec![], messages, 1).unwrap()
    }

    const T0: i64 = 1_717_236_000_000; // 2024-06-01 10:00:00 UTC

    #[test]
    fn responses_and_sessions_follow_the_gap_threshold() {
        let conv = conversation(&[
            ("A", "hello", T0),
            ("B", "hi", T0 + 2 * MS_PER_MINUTE),
            ("A", "how are you", T0 + 3 * MS_PER_MINUTE),
            // Seven hours later: a new session begins.
            ("B", "new topic", T0 + 7 * MS_PER_HOUR),
        ]);
        let acc = accumulate(&conv, &AnalysisConfig::default());

        assert_eq!(acc.total_sessions, 2);
        assert_eq!(acc.session_lengths, vec![3, 1]);

        let a = acc.person("A").unwrap();
        let b = acc.person("B").unwrap();
        assert_eq!(a.initiations, 1);
        assert_eq!(b.initiations, 1);
        assert_eq!(a.endings, 1);
        assert_eq!(b.endings, 1);
        // B replied once within a session; the 7h gap is not a response.
        assert_eq!(b.response_times_ms, vec![(2 * MS_PER_MINUTE) as f64]);
        assert_eq!(a.response_times_ms, vec![MS_PER_MINUTE as f64]);
    }

    #[test]
    fn double_text_runs_count_once_per_run() {
        let conv = conversation(&[
            ("A", "one", T0),
            ("A", "two", T0 + 1_000),
            ("A", "three", T0 + 2_000),
            ("B", "reply", T0 + 3_000),
            ("A", "four", T0 + 4_000),
            ("A", "five", T0 + 5_000),
        ]);
        let acc = accumulate(&conv, &AnalysisConfig::default());
        let a = acc.person("A").unwrap();
        assert_eq!(a.double_text_runs, 2);
        assert_eq!(a.longest_double_text_run, 3);
    }

    #[test]
    fn conservation_of_message_counts() {
        let conv = conversation(&[
            ("A", "x", T0),
            ("B", "y", T0 + 1_000),
            ("A", "z", T0 + 2_000),
        ]);
        let acc = accumulate(&conv, &AnalysisConfig::default());
        let sum: usize = acc.persons.values().map(|p| p.total_messages).sum();
        assert_eq!(sum, conv.metadata.total_messages);
        assert_eq!(acc.total_counted, conv.metadata.total_messages);
    }

    #[test]
    fn reactions_credit_actor_and_author() {
        let mut msg = UnifiedMessage::new("A", "funny", T0, MessageKind::Text);
        msg.reactions.push(Reaction {
            emoji: "😂".to_string(),
            actor: "B".to_string(),
            timestamp_ms: None,
        });
        let conv = finalize(Platform::Messenger, "t".into(), vec![], vec![msg], 1).unwrap();
        let acc = accumulate(&conv, &AnalysisConfig::default());
        assert_eq!(acc.person("A").unwrap().reactions_received, 1);
        assert_eq!(acc.person("B").unwrap().reactions_given, 1);
    }

    #[test]
    fn monthly_buckets_use_calendar_months() {
        let june = T0;
        let july = T0 + 35 * MS_PER_DAY;
        let conv = conversation(&[("A", "in june", june), ("A", "in july", july)]);
        let acc = accumulate(&conv, &AnalysisConfig::default());
        let a = acc.person("A").unwrap();
        assert_eq!(a.monthly_messages.get("2024-06"), Some(&1));
        assert_eq!(a.monthly_messages.get("2024-07"), Some(&1));
    }

    #[test]
    fn trailing_rate_windows_exclude_the_day_itself() {
        let mut daily = BTreeMap::new();
        let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        for i in 1..=14 {
            daily.insert(day - chrono::Duration::days(i), 7);
        }
        daily.insert(day, 100);
        assert!((trailing_daily_rate(&daily, day, 14) - 7.0).abs() < 1e-9);
    }
}
