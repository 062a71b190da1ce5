//! Shift/support response classification ("conversational narcissism",
//! after Derber's shift-response / support-response distinction).
//!
//! Each within-session response is classified lexically: a support-response
//! engages the previous speaker's topic (question back, topic-word overlap);
//! a shift-response opens with self-reference and drops the topic. CNI is
//! the shift rate scaled 0-100. Heuristic, explicitly non-diagnostic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accumulate::text;
use crate::config::{AnalysisConfig, MIN_SHIFT_SUPPORT_RESPONSES};
use crate::core::{MessageKind, ParsedConversation};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonShiftSupport {
    pub name: String,
    pub responses_classified: usize,
    pub shift_responses: usize,
    pub support_responses: usize,
    /// Shift-response rate scaled 0-100.
    pub cni: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NarcissismStats {
    pub per_person: Vec<PersonShiftSupport>,
    /// Absolute CNI difference between the two most classified persons.
    pub cni_gap: Option<f64>,
}

#[derive(Default)]
struct Tally {
    shifts: usize,
    supports: usize,
}

pub fn derive(conversation: &ParsedConversation, config: &AnalysisConfig) -> Option<NarcissismStats> {
    let gap_threshold = config.session.session_gap_ms;
    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();

    let counted: Vec<_> = conversation
        .messages
        .iter()
        .filter(|m| m.is_counted())
        .collect();

    for pair in counted.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        if previous.sender == current.sender {
            continue;
        }
        if current.timestamp_ms - previous.timestamp_ms >= gap_threshold {
            continue;
        }
        if current.kind != MessageKind::Text && current.kind != MessageKind::Link {
            continue;
        }
        if previous.content.trim().is_empty() || current.content.trim().is_empty() {
            continue;
        }

        let tally = tallies.entry(current.sender.clone()).or_default();
        match classify(&previous.content, &current.content, config) {
            Some(Classification::Shift) => tally.shifts += 1,
            Some(Classification::Support) => tally.supports += 1,
            None => {}
        }
    }

    let per_person: Vec<PersonShiftSupport> = tallies
        .iter()
        .filter_map(|(name, tally)| {
            let classified = tally.shifts + tally.supports;
            if classified < MIN_SHIFT_SUPPORT_RESPONSES {
                return None;
            }
            Some(PersonShiftSupport {
                name: name.clone(),
                responses_classified: classified,
                shift_responses: tally.shifts,
                support_responses: tally.supports,
                cni: tally.shifts as f64 / classified as f64 * 100.0,
            })
        })
        .collect();

    if per_person.is_empty() {
        return None;
    }

    let cni_gap = if per_person.len() >= 2 {
        let mut by_volume = per_person.clone();
        by_volume.sort_by(|a, b| {
            b.responses_classified
                .cmp(&a.responses_classified)
                .then_with(|| a.name.cmp(&b.name))
        });
        Some((by_volume[0].cni - by_volume[1].cni).abs())
    } else {
        None
    };

    Some(NarcissismStats { per_person, cni_gap })
}

enum Classification {
    Shift,
    Support,
}

/// Support beats shift when both signals appear: engaging the topic while
/// talking about yourself is still engagement.
fn classify(
    previous_content: &str,
    response: &str,
    config: &AnalysisConfig,
) -> Option<Classification> {
    let overlap = text::shared_non_trivial_words(previous_content, response);
    let asks_back = text::contains_question(response);
    if asks_back || overlap >= 1 {
        return Some(Classification::Support);
    }

    let lowered = response.trim().to_lowercase();
    let self_opener = config
        .lexicons
        .self_referential_openers
        .iter()
        .any(|opener| lowered.starts_with(opener.as_str()));
    if self_opener {
        return Some(Classification::Shift);
    }

    // No topic overlap and no self-reference: ambiguous, leave unclassified.
    None
}
