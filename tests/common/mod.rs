//! Shared helpers for integration tests.
#![allow(dead_code)]

use chatmap::{MessageKind, ParsedConversation, Platform, UnifiedMessage};

/// 2024-06-01 10:00:00 UTC.
pub const T0: i64 = 1_717_236_000_000;

pub fn text_message(sender: &str, content: &str, timestamp_ms: i64) -> UnifiedMessage {
    UnifiedMessage::new(sender, content, timestamp_ms, MessageKind::Text)
}

pub fn conversation_from(messages: Vec<UnifiedMessage>) -> ParsedConversation {
    chatmap::decoders::finalize(Platform::Messenger, "fixture".to_string(), vec![], messages, 1)
        .expect("fixture conversation")
}

/// A steady two-person exchange: `days` days, `per_day` alternating messages
/// each day starting at 10:00.
pub fn steady_exchange(days: i64, per_day: i64) -> ParsedConversation {
    let mut messages = Vec::new();
    for day in 0..days {
        for i in 0..per_day {
            let sender = if i % 2 == 0 { "Anna" } else { "Bartek" };
            let ts = T0 + day * 86_400_000 + i * 120_000;
            let content = if i % 3 == 0 {
                "how did the project meeting go today?"
            } else {
                "the meeting went fine, long discussion about the project"
            };
            messages.push(text_message(sender, content, ts));
        }
    }
    conversation_from(messages)
}
