//! Decoder for Discord channel exports (DiscordChatExporter JSON shape).
//!
//! Discord carries structure the other platforms lack: `<@id>` mention
//! tokens resolved to display names, reply references resolved to message
//! indices, and an edited flag. Those fields stay optional in the canonical
//! model and absent for every other platform.

use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::{contains_url, finalize, Decoder, RawExport};
use crate::core::errors::{Error, Result};
use crate::core::{
    MessageKind, ParsedConversation, Participant, Platform, Reaction, UnifiedMessage,
};

pub struct DiscordDecoder;

impl DiscordDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DiscordDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct RawChannelExport {
    #[serde(default)]
    channel: Option<RawChannel>,
    messages: Vec<RawDiscordMessage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawChannel {
    name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawDiscordMessage {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    timestamp: Option<String>,
    #[serde(rename = "timestampEdited")]
    timestamp_edited: Option<String>,
    #[serde(rename = "callEndedTimestamp")]
    call_ended_timestamp: Option<String>,
    content: Option<String>,
    author: Option<RawAuthor>,
    attachments: Vec<Value>,
    embeds: Vec<RawEmbed>,
    stickers: Vec<Value>,
    reactions: Vec<RawDiscordReaction>,
    mentions: Vec<RawAuthor>,
    reference: Option<RawReference>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
struct RawAuthor {
    id: Option<String>,
    name: Option<String>,
    nickname: Option<String>,
}

impl RawAuthor {
    fn display_name(&self) -> Option<String> {
        self.nickname
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| self.name.clone())
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawEmbed {
    url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawDiscordReaction {
    emoji: RawEmoji,
    count: Option<u64>,
    users: Vec<RawAuthor>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawEmoji {
    name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawReference {
    #[serde(rename = "messageId")]
    message_id: Option<String>,
}

const SYSTEM_TYPES: &[&str] = &[
    "GuildMemberJoin",
    "ChannelPinnedMessage",
    "ThreadCreated",
    "RecipientAdd",
    "RecipientRemove",
    "ChannelNameChange",
];

static MENTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@!?(\d+)>").expect("valid mention pattern"));

impl Decoder for DiscordDecoder {
    fn platform(&self) -> Platform {
        Platform::Discord
    }

    fn probe(&self, raw: &RawExport) -> bool {
        let value: Value = match serde_json::from_str(raw.as_str()) {
            Ok(v) => v,
            Err(_) => return false,
        };
        match value.get("messages").and_then(Value::as_array) {
            Some(messages) => match messages.first() {
                Some(first) => first.get("author").is_some() && first.get("timestamp").is_some(),
                None => value.get("channel").is_some(),
            },
            None => false,
        }
    }

    fn decode(&self, raw: &RawExport) -> Result<ParsedConversation> {
        let value: Value = serde_json::from_str(raw.as_str())
            .map_err(|e| Error::format(Platform::Discord, format!("invalid JSON: {e}")))?;

        if value.get("messages").and_then(Value::as_array).is_none() {
            return Err(Error::format(
                Platform::Discord,
                "missing required 'messages' array",
            ));
        }
        if let Some(first) = value.get("messages").and_then(|m| m.get(0)) {
            if first.get("author").is_none() || first.get("timestamp").is_none() {
                return Err(Error::format(
                    Platform::Discord,
                    "first message lacks 'author' or 'timestamp'",
                ));
            }
        }

        let export: RawChannelExport = serde_json::from_value(value)?;
        let title = export
            .channel
            .and_then(|c| c.name)
            .unwrap_or_else(|| "Discord channel".to_string());

        let mut participants: Vec<Participant> = Vec::new();
        let mut messages: Vec<UnifiedMessage> = Vec::new();
        let mut discord_ids: Vec<Option<String>> = Vec::new();
        let mut reply_ids: Vec<Option<String>> = Vec::new();
        let mut skipped = 0usize;

        for raw_msg in export.messages {
            let (message, discord_id, reply_id, author) = match convert_message(raw_msg) {
                Some(parts) => parts,
                None => {
                    skipped += 1;
                    continue;
                }
            };
            if let Some(author) = author {
                upsert_participant(&mut participants, author);
            }
            messages.push(message);
            discord_ids.push(discord_id);
            reply_ids.push(reply_id);
        }
        if skipped > 0 {
            log::warn!("Discord: skipped {skipped} entries without author or timestamp");
        }

        // Resolve reply references to final indices: sort locally first so the
        // stable sort inside finalize keeps the assignment intact.
        let mut order: Vec<usize> = (0..messages.len()).collect();
        order.sort_by_key(|&i| messages[i].timestamp_ms);

        let mut id_to_index: HashMap<String, usize> = HashMap::new();
        for (final_idx, &orig) in order.iter().enumerate() {
            if let Some(id) = &discord_ids[orig] {
                id_to_index.insert(id.clone(), final_idx);
            }
        }

        let mut sorted_messages = Vec::with_capacity(messages.len());
        for &orig in &order {
            let mut m = messages[orig].clone();
            m.reply_to_index = reply_ids[orig]
                .as_ref()
                .and_then(|id| id_to_index.get(id))
                .copied();
            sorted_messages.push(m);
        }

        finalize(Platform::Discord, title, participants, sorted_messages, 1)
    }
}

fn upsert_participant(participants: &mut Vec<Participant>, author: RawAuthor) {
    let name = match author.display_name() {
        Some(n) => n,
        None => return,
    };
    if let Some(existing) = participants.iter_mut().find(|p| p.name == name) {
        if existing.platform_id.is_none() {
            existing.platform_id = author.id;
        }
        return;
    }
    participants.push(Participant {
        name,
        platform_id: author.id,
    });
}

type ConvertedMessage = (
    UnifiedMessage,
    Option<String>,
    Option<String>,
    Option<RawAuthor>,
);

fn convert_message(raw: RawDiscordMessage) -> Option<ConvertedMessage> {
    let author = raw.author.clone()?;
    let sender = author.display_name()?;
    let timestamp_ms = parse_timestamp(raw.timestamp.as_deref()?)?;

    let mention_names: Vec<String> = raw
        .mentions
        .iter()
        .filter_map(|m| m.display_name())
        .collect();
    let content = resolve_mentions(raw.content.clone().unwrap_or_default(), &raw.mentions);

    let kind = classify(&raw, &content);
    let mut message = UnifiedMessage::new(sender, content, timestamp_ms, kind);
    message.has_media = !raw.attachments.is_empty() || !raw.stickers.is_empty();
    message.has_link =
        contains_url(&message.content) || raw.embeds.iter().any(|e| e.url.is_some());
    message.is_edited = raw.timestamp_edited.is_some();
    message.mentions = mention_names;
    message.reactions = convert_reactions(&raw.reactions);

    let reply_id = raw.reference.and_then(|r| r.message_id);
    Some((message, raw.id, reply_id, Some(author)))
}

fn convert_reactions(raw: &[RawDiscordReaction]) -> Vec<Reaction> {
    let mut reactions = Vec::new();
    for r in raw {
        let emoji = match &r.emoji.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => continue,
        };
        if r.users.is_empty() {
            // Older exports carry only a count, not the reacting users.
            for _ in 0..r.count.unwrap_or(1) {
                reactions.push(Reaction {
                    emoji: emoji.clone(),
                    actor: String::new(),
                    timestamp_ms: None,
                });
            }
        } else {
            for user in &r.users {
                reactions.push(Reaction {
                    emoji: emoji.clone(),
                    actor: user.display_name().unwrap_or_default(),
                    timestamp_ms: None,
                });
            }
        }
    }
    reactions
}

fn classify(raw: &RawDiscordMessage, content: &str) -> MessageKind {
    if raw.kind.as_deref() == Some("Call") || raw.call_ended_timestamp.is_some() {
        return MessageKind::Call;
    }
    if raw
        .kind
        .as_deref()
        .is_some_and(|k| SYSTEM_TYPES.contains(&k))
    {
        return MessageKind::System;
    }
    if !raw.stickers.is_empty() {
        return MessageKind::Sticker;
    }
    if contains_url(content) || raw.embeds.iter().any(|e| e.url.is_some()) {
        return MessageKind::Link;
    }
    if !raw.attachments.is_empty() && content.is_empty() {
        return MessageKind::Media;
    }
    MessageKind::Text
}

fn resolve_mentions(content: String, mentions: &[RawAuthor]) -> String {
    if mentions.is_empty() || !content.contains("<@") {
        return content;
    }
    let by_id: HashMap<&str, String> = mentions
        .iter()
        .filter_map(|m| {
            let id = m.id.as_deref()?;
            Some((id, m.display_name()?))
        })
        .collect();
    MENTION_TOKEN
        .replace_all(&content, |caps: &regex::Captures<'_>| {
            match by_id.get(&caps[1]) {
                Some(name) => format!("@{name}"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn parse_timestamp(ts: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}
