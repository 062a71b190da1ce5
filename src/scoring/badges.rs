//! Threshold badges over the derived bundles.
//!
//! Every badge has an eligibility rule and a ranking score; it goes to the
//! single top-scoring eligible participant, with name order breaking ties
//! so reruns are byte-identical. When nobody clears the threshold the badge
//! is omitted entirely, never handed to a runner-up. The minimums exist to
//! suppress statistically meaningless awards on sparse data.

use serde::{Deserialize, Serialize};

use crate::accumulate::AccumulatorSet;
use crate::config::AnalysisConfig;
use crate::derivers::engagement::EngagementStats;
use crate::derivers::timing::TimingStats;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Badge {
    pub id: String,
    pub title: String,
    pub holder: String,
    /// The metric value that won the badge.
    pub value: f64,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BadgeSet {
    pub badges: Vec<Badge>,
}

struct Candidate {
    name: String,
    score: f64,
    value: f64,
}

pub fn award(
    acc: &AccumulatorSet,
    timing: Option<&TimingStats>,
    engagement: &EngagementStats,
    config: &AnalysisConfig,
) -> Option<BadgeSet> {
    let thresholds = &config.badges;
    let mut badges = Vec::new();

    push_badge(&mut badges, "night-owl", "Night Owl", "most active long after midnight-adjacent hours", {
        acc.persons
            .values()
            .filter(|p| {
                p.late_night_count >= thresholds.night_owl_min_late_night
                    && p.total_messages >= thresholds.night_owl_min_messages
                    && share(p.late_night_count, p.total_messages) >= thresholds.night_owl_min_share
            })
            .map(|p| Candidate {
                name: p.name.clone(),
                score: share(p.late_night_count, p.total_messages),
                value: p.late_night_count as f64,
            })
            .collect()
    });

    push_badge(&mut badges, "early-bird", "Early Bird", "consistently up and typing before 9am", {
        acc.persons
            .values()
            .filter(|p| {
                p.morning_count >= thresholds.early_bird_min_morning
                    && p.total_messages >= thresholds.early_bird_min_messages
                    && share(p.morning_count, p.total_messages) >= thresholds.early_bird_min_share
            })
            .map(|p| Candidate {
                name: p.name.clone(),
                score: share(p.morning_count, p.total_messages),
                value: p.morning_count as f64,
            })
            .collect()
    });

    push_badge(&mut badges, "double-texter", "Double Texter", "keeps the thread going without waiting", {
        engagement
            .per_person
            .iter()
            .filter(|p| p.double_text_runs >= thresholds.double_text_min_runs)
            .map(|p| Candidate {
                name: p.name.clone(),
                score: p.double_text_runs as f64,
                value: p.double_text_runs as f64,
            })
            .collect()
    });

    if let Some(timing) = timing {
        push_badge(&mut badges, "speed-demon", "Speed Demon", "replies before you can lock your phone", {
            timing
                .per_person
                .iter()
                .filter(|p| {
                    p.sample_count >= thresholds.responder_min_samples
                        && p.median_ms <= thresholds.speed_demon_max_median_ms
                })
                .map(|p| Candidate {
                    name: p.name.clone(),
                    // Fastest median wins.
                    score: -p.median_ms,
                    value: p.median_ms,
                })
                .collect()
        });

        push_badge(&mut badges, "slow-burner", "Slow Burner", "answers on a geological timescale", {
            timing
                .per_person
                .iter()
                .filter(|p| {
                    p.sample_count >= thresholds.responder_min_samples
                        && p.median_ms >= thresholds.slow_burner_min_median_ms
                })
                .map(|p| Candidate {
                    name: p.name.clone(),
                    score: p.median_ms,
                    value: p.median_ms,
                })
                .collect()
        });
    }

    let total_initiations: usize = acc.persons.values().map(|p| p.initiations).sum();
    push_badge(&mut badges, "conversation-starter", "Conversation Starter", "opens most of the sessions", {
        acc.persons
            .values()
            .filter(|p| {
                p.initiations >= thresholds.starter_min_initiations
                    && total_initiations > 0
                    && share(p.initiations, total_initiations) >= thresholds.starter_min_share
            })
            .map(|p| Candidate {
                name: p.name.clone(),
                score: share(p.initiations, total_initiations),
                value: p.initiations as f64,
            })
            .collect()
    });

    push_badge(&mut badges, "question-master", "Question Master", "never runs out of things to ask", {
        acc.persons
            .values()
            .filter(|p| {
                p.question_count >= thresholds.question_min_count
                    && share(p.question_count, p.total_messages) >= thresholds.question_min_rate
            })
            .map(|p| Candidate {
                name: p.name.clone(),
                score: share(p.question_count, p.total_messages),
                value: p.question_count as f64,
            })
            .collect()
    });

    push_badge(&mut badges, "emoji-artist", "Emoji Artist", "speaks fluent emoji", {
        acc.persons
            .values()
            .filter(|p| {
                p.emoji_count >= thresholds.emoji_min_count
                    && share(p.emoji_count, p.total_messages) >= thresholds.emoji_min_rate
            })
            .map(|p| Candidate {
                name: p.name.clone(),
                score: share(p.emoji_count, p.total_messages),
                value: p.emoji_count as f64,
            })
            .collect()
    });

    push_badge(&mut badges, "novelist", "Novelist", "writes paragraphs where others send fragments", {
        acc.persons
            .values()
            .filter(|p| {
                p.total_messages >= thresholds.novelist_min_messages
                    && p.avg_words_per_message() >= thresholds.novelist_min_avg_words
            })
            .map(|p| Candidate {
                name: p.name.clone(),
                score: p.avg_words_per_message(),
                value: p.avg_words_per_message(),
            })
            .collect()
    });

    push_badge(&mut badges, "reactor", "Reactor", "hands out reactions like confetti", {
        acc.persons
            .values()
            .filter(|p| {
                p.reactions_given >= thresholds.reactor_min_given
                    && p.total_messages > 0
                    && share(p.reactions_given, p.total_messages) >= thresholds.reactor_min_rate
            })
            .map(|p| Candidate {
                name: p.name.clone(),
                score: share(p.reactions_given, p.total_messages),
                value: p.reactions_given as f64,
            })
            .collect()
    });

    if badges.is_empty() {
        return None;
    }
    Some(BadgeSet { badges })
}

fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}

/// Award to the single top-scoring eligible candidate, name order breaking
/// ties; no candidates, no badge.
fn push_badge(
    badges: &mut Vec<Badge>,
    id: &str,
    title: &str,
    description: &str,
    mut candidates: Vec<Candidate>,
) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    if let Some(winner) = candidates.first() {
        badges.push(Badge {
            id: id.to_string(),
            title: title.to_string(),
            holder: winner.name.clone(),
            value: winner.value,
            description: description.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::PersonAccumulator;
    use crate::derivers::engagement;

    fn base_person(name: &str, total: usize) -> PersonAccumulator {
        let mut p = PersonAccumulator::default();
        p.name = name.to_string();
        p.total_messages = total;
        p
    }

    fn acc_of(persons: Vec<PersonAccumulator>) -> AccumulatorSet {
        let mut acc = AccumulatorSet::default();
        for p in persons {
            acc.total_counted += p.total_messages;
            acc.persons.insert(p.name.clone(), p);
        }
        acc.total_sessions = 1;
        acc.session_lengths = vec![acc.total_counted as u32];
        acc
    }

    fn badge<'a>(set: &'a BadgeSet, id: &str) -> Option<&'a Badge> {
        set.badges.iter().find(|b| b.id == id)
    }

    #[test]
    fn night_owl_goes_to_the_top_scoring_eligible_person() {
        let mut a = base_person("A", 100);
        a.late_night_count = 30;
        let mut b = base_person("B", 100);
        b.late_night_count = 20;

        let acc = acc_of(vec![a, b]);
        let engagement = engagement::derive(&acc).unwrap();
        let set = award(&acc, None, &engagement, &AnalysisConfig::default()).unwrap();
        let night_owl = badge(&set, "night-owl").unwrap();
        assert_eq!(night_owl.holder, "A");
        assert_eq!(night_owl.value, 30.0);
    }

    #[test]
    fn below_threshold_badge_is_omitted_not_reassigned() {
        // B is the best late-night candidate but still under the minimums.
        let mut a = base_person("A", 100);
        a.late_night_count = 5;
        let mut b = base_person("B", 100);
        b.late_night_count = 9;

        let acc = acc_of(vec![a, b]);
        let engagement = engagement::derive(&acc).unwrap();
        let set = award(&acc, None, &engagement, &AnalysisConfig::default());
        if let Some(set) = set {
            assert!(badge(&set, "night-owl").is_none());
        }
    }

    #[test]
    fn sparse_conversations_earn_nothing() {
        let mut a = base_person("A", 10);
        a.late_night_count = 10;
        a.question_count = 10;
        let acc = acc_of(vec![a]);
        let engagement = engagement::derive(&acc).unwrap();
        // 10 messages is under every per-badge message minimum.
        let set = award(&acc, None, &engagement, &AnalysisConfig::default());
        if let Some(set) = set {
            assert!(badge(&set, "night-owl").is_none());
        }
    }

    #[test]
    fn ties_break_deterministically_by_name() {
        let mut a = base_person("Zed", 100);
        a.late_night_count = 30;
        let mut b = base_person("Ann", 100);
        b.late_night_count = 30;

        let acc = acc_of(vec![a, b]);
        let engagement = engagement::derive(&acc).unwrap();
        let set = award(&acc, None, &engagement, &AnalysisConfig::default()).unwrap();
        assert_eq!(badge(&set, "night-owl").unwrap().holder, "Ann");
    }
}
