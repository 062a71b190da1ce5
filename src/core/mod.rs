pub mod errors;
pub mod time;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source platform of a conversation export.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Platform {
    Messenger,
    Instagram,
    WhatsApp,
    Telegram,
    Discord,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(Platform, &str)] = &[
            (Platform::Messenger, "Messenger"),
            (Platform::Instagram, "Instagram"),
            (Platform::WhatsApp, "WhatsApp"),
            (Platform::Telegram, "Telegram"),
            (Platform::Discord, "Discord"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(p, _)| p == self)
            .map(|(_, s)| *s)
            .unwrap_or("Unknown");

        write!(f, "{display_str}")
    }
}

/// Message classification, assigned by decoders with a fixed precedence:
/// unsent > call > system > sticker > link > media > text.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Media,
    Sticker,
    Link,
    Call,
    System,
    Unsent,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Reaction {
    pub emoji: String,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
}

/// A conversation participant. Identity key is the display name; platform
/// stable IDs are best-effort and may be absent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform_id: None,
        }
    }
}

/// The canonical message model every platform decoder produces.
///
/// `index` is a dense 0..N-1 ordering assigned after the final chronological
/// sort; `timestamp_ms` is non-decreasing across the message list.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UnifiedMessage {
    pub index: usize,
    pub sender: String,
    pub content: String,
    pub timestamp_ms: i64,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
    pub has_media: bool,
    pub has_link: bool,
    pub is_unsent: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_index: Option<usize>,
    #[serde(default)]
    pub is_edited: bool,
}

impl UnifiedMessage {
    pub fn new(
        sender: impl Into<String>,
        content: impl Into<String>,
        timestamp_ms: i64,
        kind: MessageKind,
    ) -> Self {
        Self {
            index: 0,
            sender: sender.into(),
            content: content.into(),
            timestamp_ms,
            kind,
            reactions: Vec::new(),
            has_media: false,
            has_link: false,
            is_unsent: false,
            mentions: Vec::new(),
            reply_to_index: None,
            is_edited: false,
        }
    }

    /// Whether this message participates in count-based metrics.
    /// Platform service events stay in the list but are never counted.
    pub fn is_counted(&self) -> bool {
        self.kind != MessageKind::System
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConversationMetadata {
    /// Non-system message count.
    pub total_messages: usize,
    pub date_range: DateRange,
    pub is_group: bool,
    pub duration_days: i64,
    /// Number of export files merged into this conversation.
    pub source_files: usize,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extras: HashMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParsedConversation {
    pub platform: Platform,
    pub title: String,
    pub participants: Vec<Participant>,
    pub messages: Vec<UnifiedMessage>,
    pub metadata: ConversationMetadata,
}

impl ParsedConversation {
    /// Messages that participate in count-based metrics.
    pub fn counted_messages(&self) -> impl Iterator<Item = &UnifiedMessage> {
        self.messages.iter().filter(|m| m.is_counted())
    }

    pub fn participant_names(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.name.clone()).collect()
    }
}
