//! Bid-for-connection classifier after Gottman's bid/response model.
//!
//! A bid is a question (URL query strings stripped first), a disclosure
//! opener, or a shared link. Each bid is matched against the first reply
//! from a different sender inside both a message-count window (the bidder's
//! own double-texts don't consume it) and a hard time window; replies outside
//! either window turn away regardless of content.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accumulate::text;
use crate::config::AnalysisConfig;
use crate::core::{MessageKind, ParsedConversation, UnifiedMessage};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonBids {
    pub name: String,
    pub bids_made: usize,
    pub turned_toward: usize,
    pub turned_away: usize,
    /// turnedToward / bidsMade * 100.
    pub bid_success_rate: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecipientBids {
    pub name: String,
    pub bids_received: usize,
    /// Counts only "toward" responses.
    pub bids_responded_to: usize,
    pub response_rate: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BidStats {
    /// Only persons with enough bids appear here.
    pub per_person: Vec<PersonBids>,
    pub per_recipient: Vec<RecipientBids>,
    pub total_bids: usize,
    pub overall_response_rate: f64,
    /// Signed gap to the Gottman benchmark, percentage points.
    pub benchmark_gap: f64,
    pub interpretation: String,
}

#[derive(Default)]
struct BidTally {
    made: usize,
    toward: usize,
    away: usize,
    received: usize,
    responded_to: usize,
}

pub fn derive(conversation: &ParsedConversation, config: &AnalysisConfig) -> Option<BidStats> {
    let bids = &config.bids;
    let messages: Vec<&UnifiedMessage> = conversation
        .messages
        .iter()
        .filter(|m| m.is_counted())
        .collect();

    let mut tallies: BTreeMap<String, BidTally> = BTreeMap::new();
    let mut total_bids = 0usize;
    let mut total_toward = 0usize;

    for (i, message) in messages.iter().enumerate() {
        if !is_bid(message, config) {
            continue;
        }
        total_bids += 1;
        tallies.entry(message.sender.clone()).or_default().made += 1;

        let reply = find_reply(&messages, i, bids.scan_window);
        let toward = match reply {
            Some(reply) => {
                let within_time =
                    reply.timestamp_ms - message.timestamp_ms <= bids.response_window_ms;
                within_time && is_turning_toward(&message.content, reply, config)
            }
            None => false,
        };

        if let Some(reply) = reply {
            let recipient = tallies.entry(reply.sender.clone()).or_default();
            recipient.received += 1;
            if toward {
                recipient.responded_to += 1;
            }
        }

        let bidder = tallies.entry(message.sender.clone()).or_default();
        if toward {
            bidder.toward += 1;
            total_toward += 1;
        } else {
            bidder.away += 1;
        }
    }

    if total_bids < bids.min_total_bids {
        return None;
    }

    let per_person: Vec<PersonBids> = tallies
        .iter()
        .filter(|(_, t)| t.made >= bids.min_bids_per_person)
        .map(|(name, t)| PersonBids {
            name: name.clone(),
            bids_made: t.made,
            turned_toward: t.toward,
            turned_away: t.away,
            bid_success_rate: percent(t.toward, t.made),
        })
        .collect();

    let per_recipient: Vec<RecipientBids> = tallies
        .iter()
        .filter(|(_, t)| t.received > 0)
        .map(|(name, t)| RecipientBids {
            name: name.clone(),
            bids_received: t.received,
            bids_responded_to: t.responded_to,
            response_rate: percent(t.responded_to, t.received),
        })
        .collect();

    let overall_response_rate = percent(total_toward, total_bids);
    let benchmark_gap = overall_response_rate - bids.gottman_benchmark;

    Some(BidStats {
        per_person,
        per_recipient,
        total_bids,
        overall_response_rate,
        benchmark_gap,
        interpretation: interpret(overall_response_rate, bids.gottman_benchmark),
    })
}

/// First classifiable reply from a different sender within the scan window.
/// The bidder's own follow-ups are skipped without consuming the window;
/// other senders' media/sticker/call messages consume it without qualifying.
fn find_reply<'a>(
    messages: &[&'a UnifiedMessage],
    bid_index: usize,
    scan_window: usize,
) -> Option<&'a UnifiedMessage> {
    let bidder = &messages[bid_index].sender;
    let mut candidates_seen = 0usize;
    for message in messages.iter().skip(bid_index + 1) {
        if &message.sender == bidder {
            continue;
        }
        candidates_seen += 1;
        if candidates_seen > scan_window {
            return None;
        }
        if message.kind == MessageKind::Text || message.kind == MessageKind::Link {
            return Some(message);
        }
    }
    None
}

fn is_bid(message: &UnifiedMessage, config: &AnalysisConfig) -> bool {
    if message.kind != MessageKind::Text && message.kind != MessageKind::Link {
        return false;
    }
    let content = message.content.trim();
    if content.is_empty() {
        return false;
    }
    // "??"-style fragments are noise, not bids.
    let alphanumeric = content.chars().filter(|c| c.is_alphanumeric()).count();
    if alphanumeric < 3 && !message.has_link {
        return false;
    }

    if text::contains_question(content) {
        return true;
    }
    if message.has_link {
        return true;
    }
    let lowered = content.to_lowercase();
    config
        .lexicons
        .disclosure_openers
        .iter()
        .any(|opener| lowered.starts_with(opener.as_str()))
}

fn is_turning_toward(
    bid_content: &str,
    reply: &UnifiedMessage,
    config: &AnalysisConfig,
) -> bool {
    let reply_text = reply.content.trim();
    let lowered = reply_text.to_lowercase();

    if config
        .lexicons
        .dismissal_tokens
        .iter()
        .any(|token| lowered == *token || lowered.starts_with(&format!("{token} ")))
    {
        return false;
    }
    if text::contains_question(reply_text) {
        return true;
    }
    if text::shared_non_trivial_words(bid_content, reply_text) >= 1 {
        return true;
    }
    // Length alone can carry engagement; anything shorter without a question
    // or topic overlap reads as a brush-off.
    reply_text.chars().count() >= config.bids.min_toward_len
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

fn interpret(rate: f64, benchmark: f64) -> String {
    if rate >= benchmark {
        format!(
            "Turn-toward rate {:.0}% meets the {:.0}% seen in stable relationships",
            rate, benchmark
        )
    } else if rate >= benchmark - 20.0 {
        format!(
            "Turn-toward rate {:.0}% sits below the {:.0}% benchmark but within reach",
            rate, benchmark
        )
    } else if rate >= 33.0 {
        format!(
            "Turn-toward rate {:.0}% is well under the {:.0}% benchmark",
            rate, benchmark
        )
    } else {
        format!(
            "Turn-toward rate {:.0}% is in the range Gottman observed before relationships failed",
            rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::{MS_PER_HOUR, MS_PER_MINUTE};
    use crate::core::Platform;
    use crate::decoders::finalize;

    const T0: i64 = 1_717_236_000_000;

    fn conv(messages: Vec<UnifiedMessage>) -> ParsedConversation {
        finalize(Platform::Messenger, "t".into(), vec![], messages, 1).unwrap()
    }

    fn derive_default(conversation: &ParsedConversation) -> BidStats {
        derive(conversation, &AnalysisConfig::default()).expect("bid stats present")
    }

    fn text_msg(sender: &str, content: &str, ts: i64) -> UnifiedMessage {
        UnifiedMessage::new(sender, content, ts, MessageKind::Text)
    }

    /// Ten alternating bid/reply pairs, with the reply offset controlled.
    fn bids_with_reply_offset(offset_ms: i64, reply_text: &str) -> ParsedConversation {
        let mut messages = Vec::new();
        for i in 0..10i64 {
            let base = T0 + i * 12 * MS_PER_HOUR;
            messages.push(text_msg("A", "what do you think about dinner?", base));
            messages.push(text_msg("B", reply_text, base + offset_ms));
        }
        conv(messages)
    }

    #[test]
    fn reply_just_inside_four_hours_can_turn_toward() {
        let offset = 4 * MS_PER_HOUR - 1_000; // 3h59m59s
        let stats = derive_default(&bids_with_reply_offset(offset, "dinner sounds lovely, count me in"));
        assert_eq!(stats.overall_response_rate, 100.0);
    }

    #[test]
    fn reply_just_past_four_hours_is_forced_away() {
        let offset = 4 * MS_PER_HOUR + 1_000; // 4h00m01s
        let stats = derive_default(&bids_with_reply_offset(offset, "dinner sounds lovely, count me in"));
        assert_eq!(stats.overall_response_rate, 0.0);
    }

    #[test]
    fn nine_bids_absent_ten_bids_present() {
        let build = |bid_count: i64| {
            let mut messages = Vec::new();
            for i in 0..bid_count {
                let base = T0 + i * 12 * MS_PER_HOUR;
                messages.push(text_msg("A", "guess what happened today", base));
                messages.push(text_msg("B", "tell me everything!", base + MS_PER_MINUTE));
            }
            conv(messages)
        };
        assert!(derive(&build(9), &AnalysisConfig::default()).is_none());
        assert!(derive(&build(10), &AnalysisConfig::default()).is_some());
    }

    #[test]
    fn dismissal_tokens_turn_away() {
        let stats = derive_default(&bids_with_reply_offset(MS_PER_MINUTE, "whatever"));
        assert_eq!(stats.overall_response_rate, 0.0);
        let person = stats.per_person.iter().find(|p| p.name == "A").unwrap();
        assert_eq!(person.turned_away, 10);
    }

    #[test]
    fn double_texts_do_not_consume_the_scan_window() {
        let mut messages = Vec::new();
        for i in 0..10i64 {
            let base = T0 + i * 12 * MS_PER_HOUR;
            messages.push(text_msg("A", "did you see the game last night?", base));
            // Seven bidder follow-ups would exhaust a naive window.
            for j in 1..=7i64 {
                messages.push(text_msg("A", "hello", base + j * 1_000));
            }
            messages.push(text_msg("B", "the game was wild", base + 10_000));
        }
        let stats = derive_default(&conv(messages));
        let a = stats.per_person.iter().find(|p| p.name == "A").unwrap();
        assert!(a.turned_toward >= 10);
    }

    #[test]
    fn links_count_as_bids_but_bare_punctuation_does_not() {
        let mut link = text_msg("A", "https://example.com/article", T0);
        link.kind = MessageKind::Link;
        link.has_link = true;
        assert!(is_bid(&link, &AnalysisConfig::default()));

        let punctuation = text_msg("A", "??", T0);
        assert!(!is_bid(&punctuation, &AnalysisConfig::default()));
    }

    #[test]
    fn url_query_strings_are_not_questions() {
        let msg = text_msg("A", "https://x.io/watch?v=123", T0);
        // No '?' outside the URL and no link flag: not a bid.
        assert!(!is_bid(&msg, &AnalysisConfig::default()));
    }

}
