//! Deterministic lexicon-based sentiment.
//!
//! Scores are computed once per message during the accumulation pass and
//! aggregated here. The lexicon covers English and Polish plus emoji
//! valence; a 2-token negation lookbehind flips polarity. No AI calls, no
//! randomness.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::accumulate::text::{emojis, tokenize};
use crate::accumulate::AccumulatorSet;
use crate::stats;

/// Message scores at or below this count as negative messages for the
/// conflict deriver.
pub const NEGATIVE_MESSAGE_THRESHOLD: f64 = -0.25;

const POSITIVE_SHARE_CUTOFF: f64 = 0.2;
const NEGATIVE_SHARE_CUTOFF: f64 = -0.2;

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "love", "great", "awesome", "amazing", "happy", "glad", "good", "nice", "cool", "best",
        "wonderful", "perfect", "beautiful", "fun", "funny", "thanks", "thank", "excited",
        "sweet", "haha", "lol", "super", "kocham", "świetnie", "swietnie", "wspaniale",
        "cudownie", "dobrze", "fajnie", "dzięki", "dzieki", "dziękuję", "dziekuje", "pięknie",
        "pieknie", "ekstra", "spoko", "miło", "milo", "cieszę", "ciesze",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "hate", "angry", "mad", "sad", "awful", "terrible", "horrible", "bad", "worst", "annoyed",
        "annoying", "upset", "disappointed", "sorry", "cry", "crying", "stupid", "ugh", "wtf",
        "nienawidzę", "nienawidze", "zły", "zly", "zła", "zla", "smutny", "smutna", "okropnie",
        "strasznie", "źle", "zle", "przykro", "wkurzony", "wkurzona", "głupi", "glupi", "masakra",
        "tragedia",
    ]
    .into_iter()
    .collect()
});

static NEGATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["not", "no", "never", "don't", "dont", "didn't", "didnt", "isn't", "isnt", "nie", "nigdy"]
        .into_iter()
        .collect()
});

static EMOJI_VALENCE: Lazy<HashMap<char, f64>> = Lazy::new(|| {
    [
        ('😂', 0.8),
        ('😊', 0.8),
        ('😍', 1.0),
        ('🥰', 1.0),
        ('😘', 0.9),
        ('👍', 0.6),
        ('🎉', 0.8),
        ('😭', -0.6),
        ('😢', -0.7),
        ('😠', -0.9),
        ('😡', -1.0),
        ('💔', -0.9),
        ('👎', -0.6),
        ('😞', -0.7),
    ]
    .into_iter()
    .collect()
});

/// Score a message body in [-1, 1]. `None` when no lexicon token or valenced
/// emoji is present; messages without signal contribute no sample.
pub fn score_text(text: &str) -> Option<f64> {
    let tokens = tokenize(text);
    let mut total = 0.0;
    let mut hits = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        let polarity = if POSITIVE_WORDS.contains(token.as_str()) {
            1.0
        } else if NEGATIVE_WORDS.contains(token.as_str()) {
            -1.0
        } else {
            continue;
        };
        let negated = tokens[i.saturating_sub(2)..i]
            .iter()
            .any(|t| NEGATIONS.contains(t.as_str()));
        total += if negated { -polarity } else { polarity };
        hits += 1;
    }

    for emoji in emojis(text) {
        if let Some(valence) = EMOJI_VALENCE.get(&emoji) {
            total += valence;
            hits += 1;
        }
    }

    if hits == 0 {
        return None;
    }
    Some((total / hits as f64).clamp(-1.0, 1.0))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonSentiment {
    pub name: String,
    pub sample_count: usize,
    pub mean_score: f64,
    pub positive_share: f64,
    pub negative_share: f64,
    pub monthly_mean: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SentimentStats {
    pub per_person: Vec<PersonSentiment>,
    pub overall_mean: f64,
    pub tone: String,
}

/// Aggregate the per-message samples collected during the accumulation pass.
pub fn derive(acc: &AccumulatorSet) -> Option<SentimentStats> {
    let mut per_person = Vec::new();
    let mut all_samples: Vec<f64> = Vec::new();

    for person in acc.persons.values() {
        if person.sentiment_samples.is_empty() {
            continue;
        }
        let samples = &person.sentiment_samples;
        all_samples.extend_from_slice(samples);

        let monthly_mean = person
            .monthly_sentiment
            .iter()
            .filter_map(|(month, scores)| {
                stats::mean(scores).map(|m| (month.clone(), m))
            })
            .collect();

        per_person.push(PersonSentiment {
            name: person.name.clone(),
            sample_count: samples.len(),
            mean_score: stats::mean(samples).unwrap_or(0.0),
            positive_share: share(samples, |s| s > POSITIVE_SHARE_CUTOFF),
            negative_share: share(samples, |s| s < NEGATIVE_SHARE_CUTOFF),
            monthly_mean,
        });
    }

    if all_samples.is_empty() {
        return None;
    }
    let overall_mean = stats::mean(&all_samples).unwrap_or(0.0);
    Some(SentimentStats {
        per_person,
        tone: interpret_tone(overall_mean),
        overall_mean,
    })
}

fn share(samples: &[f64], predicate: impl Fn(f64) -> bool) -> f64 {
    samples.iter().filter(|&&s| predicate(s)).count() as f64 / samples.len() as f64
}

fn interpret_tone(mean: f64) -> String {
    let label = if mean >= 0.4 {
        "overwhelmingly warm"
    } else if mean >= 0.15 {
        "mostly positive"
    } else if mean >= -0.15 {
        "mixed and even"
    } else if mean >= -0.4 {
        "leaning tense"
    } else {
        "predominantly negative"
    };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_and_negative_words_score() {
        assert!(score_text("this is awesome, love it").unwrap() > 0.5);
        assert!(score_text("that was terrible and sad").unwrap() < -0.5);
    }

    #[test]
    fn negation_flips_polarity() {
        assert!(score_text("not good at all").unwrap() < 0.0);
        assert!(score_text("nie jest źle").unwrap() > 0.0);
    }

    #[test]
    fn messages_without_signal_yield_no_sample() {
        assert_eq!(score_text("spotkamy się jutro o 18"), None);
        assert_eq!(score_text(""), None);
    }

    #[test]
    fn emoji_valence_counts() {
        assert!(score_text("😂😂").unwrap() > 0.0);
        assert!(score_text("💔").unwrap() < 0.0);
    }

    #[test]
    fn score_is_bounded() {
        let s = score_text("love love love love hate").unwrap();
        assert!((-1.0..=1.0).contains(&s));
    }
}
