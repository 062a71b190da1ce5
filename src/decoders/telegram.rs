//! Decoder for Telegram Desktop's JSON export.
//!
//! The `text` field is either a plain string or an array mixing plain strings
//! with `{type, text}` entities; entity text is concatenated in order.
//! Service entries (`type: "service"`) become System messages. The export is
//! already chronological but is re-validated and re-sorted defensively.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use super::{contains_url, finalize, Decoder, RawExport};
use crate::core::errors::{Error, Result};
use crate::core::{MessageKind, ParsedConversation, Platform, UnifiedMessage};

pub struct TelegramDecoder;

impl TelegramDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TelegramDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct RawChatExport {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    chat_type: Option<String>,
    messages: Vec<RawTelegramMessage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawTelegramMessage {
    #[serde(rename = "type")]
    entry_type: Option<String>,
    date: Option<String>,
    date_unixtime: Option<String>,
    from: Option<String>,
    actor: Option<String>,
    text: Value,
    media_type: Option<String>,
    photo: Option<Value>,
    file: Option<Value>,
    sticker_emoji: Option<String>,
    mime_type: Option<String>,
    action: Option<String>,
}

impl Decoder for TelegramDecoder {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    fn probe(&self, raw: &RawExport) -> bool {
        let value: Value = match serde_json::from_str(raw.as_str()) {
            Ok(v) => v,
            Err(_) => return false,
        };
        let messages = match value.get("messages").and_then(Value::as_array) {
            Some(m) => m,
            None => return false,
        };
        // Telegram entries carry `date`/`date_unixtime`; the Meta envelope
        // does not.
        match messages.first() {
            Some(first) => {
                first.get("date").is_some() || first.get("date_unixtime").is_some()
            }
            None => value.get("name").is_some() || value.get("type").is_some(),
        }
    }

    fn decode(&self, raw: &RawExport) -> Result<ParsedConversation> {
        let value: Value = serde_json::from_str(raw.as_str())
            .map_err(|e| Error::format(Platform::Telegram, format!("invalid JSON: {e}")))?;

        if value.get("messages").and_then(Value::as_array).is_none() {
            return Err(Error::format(
                Platform::Telegram,
                "missing required 'messages' array",
            ));
        }
        if let Some(first) = value.get("messages").and_then(|m| m.get(0)) {
            if first.get("date").is_none() && first.get("date_unixtime").is_none() {
                return Err(Error::format(
                    Platform::Telegram,
                    "first message lacks a 'date' field",
                ));
            }
        }

        let export: RawChatExport = serde_json::from_value(value)?;
        let title = export.name.clone().unwrap_or_else(|| "Telegram chat".to_string());

        let mut messages = Vec::with_capacity(export.messages.len());
        let mut skipped = 0usize;
        for raw_msg in export.messages {
            match convert_message(raw_msg) {
                Some(m) => messages.push(m),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            log::warn!("Telegram: skipped {skipped} entries without date or sender");
        }

        let mut conv = finalize(Platform::Telegram, title, Vec::new(), messages, 1)?;
        if let Some(chat_type) = export.chat_type {
            conv.metadata
                .extras
                .insert("chat_type".to_string(), chat_type);
        }
        Ok(conv)
    }
}

fn convert_message(raw: RawTelegramMessage) -> Option<UnifiedMessage> {
    let timestamp_ms = parse_date(&raw)?;
    let is_service = raw.entry_type.as_deref() == Some("service") || raw.action.is_some();
    let sender = raw
        .from
        .clone()
        .or_else(|| raw.actor.clone())
        .unwrap_or_default();
    if sender.is_empty() && !is_service {
        return None;
    }

    let content = flatten_text(&raw.text);
    let kind = classify(&raw, is_service, &content);

    let mut message = UnifiedMessage::new(sender, content, timestamp_ms, kind);
    message.has_media =
        raw.photo.is_some() || raw.file.is_some() || raw.media_type.is_some();
    message.has_link = contains_url(&message.content);
    Some(message)
}

/// Telegram's `text` is a string or an array of strings and rich-text
/// entities; entity text concatenates in order.
fn flatten_text(text: &Value) -> String {
    match text {
        Value::String(s) => s.clone(),
        Value::Array(pieces) => pieces
            .iter()
            .map(|piece| match piece {
                Value::String(s) => s.as_str(),
                Value::Object(obj) => obj.get("text").and_then(Value::as_str).unwrap_or(""),
                _ => "",
            })
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

fn classify(raw: &RawTelegramMessage, is_service: bool, content: &str) -> MessageKind {
    if is_service {
        return MessageKind::System;
    }
    if raw.media_type.as_deref() == Some("sticker") || raw.sticker_emoji.is_some() {
        return MessageKind::Sticker;
    }
    if matches!(
        raw.media_type.as_deref(),
        Some("voice_message") | Some("video_message") | Some("video_file") | Some("audio_file")
            | Some("animation")
    ) && content.is_empty()
    {
        return MessageKind::Media;
    }
    if contains_url(content) {
        return MessageKind::Link;
    }
    if (raw.photo.is_some() || raw.file.is_some() || raw.mime_type.is_some())
        && content.is_empty()
    {
        return MessageKind::Media;
    }
    MessageKind::Text
}

fn parse_date(raw: &RawTelegramMessage) -> Option<i64> {
    if let Some(unix) = raw.date_unixtime.as_deref() {
        if let Ok(secs) = unix.parse::<i64>() {
            return Some(secs * 1_000);
        }
    }
    let date = raw.date.as_deref()?;
    NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}
