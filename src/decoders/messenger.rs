//! Decoder for the Facebook Messenger / Instagram JSON export envelope.
//!
//! Both platforms ship the same thread shape (`participants`, `messages`
//! with `sender_name`/`timestamp_ms`), newest message first, with every
//! string field Latin-1-mangled. One decoder handles both, parameterized by
//! platform, the same way a shared front-end serves two dialects.

use serde::Deserialize;
use serde_json::Value;

use super::encoding::{repair_mojibake, repair_opt};
use super::{contains_url, finalize, Decoder, RawExport};
use crate::core::errors::{Error, Result};
use crate::core::{MessageKind, ParsedConversation, Participant, Platform, Reaction, UnifiedMessage};

pub struct MetaThreadDecoder {
    platform: Platform,
}

impl MetaThreadDecoder {
    pub fn new_messenger() -> Self {
        Self {
            platform: Platform::Messenger,
        }
    }

    pub fn new_instagram() -> Self {
        Self {
            platform: Platform::Instagram,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawThread {
    participants: Vec<RawParticipant>,
    messages: Vec<RawMessage>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawParticipant {
    name: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawMessage {
    sender_name: Option<String>,
    timestamp_ms: Option<i64>,
    content: Option<String>,
    photos: Option<Vec<Value>>,
    videos: Option<Vec<Value>>,
    audio_files: Option<Vec<Value>>,
    gifs: Option<Vec<Value>>,
    files: Option<Vec<Value>>,
    sticker: Option<Value>,
    share: Option<RawShare>,
    is_unsent: Option<bool>,
    reactions: Option<Vec<RawReaction>>,
    call_duration: Option<i64>,
    #[serde(rename = "type")]
    raw_type: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawShare {
    link: Option<String>,
    share_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReaction {
    reaction: String,
    actor: String,
    #[serde(default)]
    timestamp: Option<i64>,
}

impl Decoder for MetaThreadDecoder {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn probe(&self, raw: &RawExport) -> bool {
        let value: Value = match serde_json::from_str(raw.as_str()) {
            Ok(v) => v,
            Err(_) => return false,
        };
        let has_envelope = value.get("participants").is_some_and(Value::is_array)
            && value.get("messages").is_some_and(Value::is_array);
        if !has_envelope {
            return false;
        }
        first_message_fields_present(&value)
    }

    fn decode(&self, raw: &RawExport) -> Result<ParsedConversation> {
        let value: Value = serde_json::from_str(raw.as_str())
            .map_err(|e| Error::format(self.platform, format!("invalid JSON: {e}")))?;

        if value.get("participants").is_none() || value.get("messages").is_none() {
            return Err(Error::format(
                self.platform,
                "missing required 'participants' or 'messages' field",
            ));
        }
        if !first_message_fields_present(&value) {
            return Err(Error::format(
                self.platform,
                "first message lacks 'sender_name' or 'timestamp_ms'",
            ));
        }

        let thread: RawThread = serde_json::from_value(value)?;

        let participants: Vec<Participant> = thread
            .participants
            .into_iter()
            .map(|p| Participant::new(repair_mojibake(&p.name)))
            .collect();

        let title = repair_opt(thread.title)
            .unwrap_or_else(|| default_title(&participants));

        let mut messages: Vec<UnifiedMessage> = Vec::with_capacity(thread.messages.len());
        for raw_msg in thread.messages {
            match convert_message(raw_msg) {
                Some(m) => messages.push(m),
                None => log::warn!("{}: skipping message without sender/timestamp", self.platform),
            }
        }

        // Exports arrive newest-first; restore chronological order before the
        // stable sort so equal-timestamp runs keep their original sequence.
        if is_descending(&messages) {
            messages.reverse();
        }

        finalize(self.platform, title, participants, messages, 1)
    }
}

fn first_message_fields_present(value: &Value) -> bool {
    match value.get("messages").and_then(|m| m.get(0)) {
        Some(first) => first.get("sender_name").is_some() && first.get("timestamp_ms").is_some(),
        // An empty message list fails later with a clearer error.
        None => true,
    }
}

fn is_descending(messages: &[UnifiedMessage]) -> bool {
    match (messages.first(), messages.last()) {
        (Some(first), Some(last)) => first.timestamp_ms > last.timestamp_ms,
        _ => false,
    }
}

fn default_title(participants: &[Participant]) -> String {
    participants
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn convert_message(mut raw: RawMessage) -> Option<UnifiedMessage> {
    let sender = repair_mojibake(raw.sender_name.take()?.as_str());
    let timestamp_ms = raw.timestamp_ms?;

    let content = repair_opt(raw.content.take()).unwrap_or_default();
    let share_link = raw
        .share
        .as_ref()
        .and_then(|s| s.link.clone().or_else(|| s.share_text.clone()));

    let has_attachment = [
        raw.photos.as_ref(),
        raw.videos.as_ref(),
        raw.audio_files.as_ref(),
        raw.gifs.as_ref(),
        raw.files.as_ref(),
    ]
    .iter()
    .any(|v| v.is_some_and(|list| !list.is_empty()));

    let kind = classify(&raw, &content, share_link.as_deref(), has_attachment);

    let mut message = UnifiedMessage::new(sender, content, timestamp_ms, kind);
    message.has_media = has_attachment || raw.sticker.is_some();
    message.has_link = share_link.is_some() || contains_url(&message.content);
    message.is_unsent = raw.is_unsent.unwrap_or(false);
    message.reactions = raw
        .reactions
        .unwrap_or_default()
        .into_iter()
        .map(|r| Reaction {
            emoji: repair_mojibake(&r.reaction),
            actor: repair_mojibake(&r.actor),
            timestamp_ms: r.timestamp,
        })
        .collect();
    Some(message)
}

/// Fixed precedence: unsent > call > system > sticker > link > media > text.
fn classify(
    raw: &RawMessage,
    content: &str,
    share_link: Option<&str>,
    has_attachment: bool,
) -> MessageKind {
    if raw.is_unsent.unwrap_or(false) {
        return MessageKind::Unsent;
    }
    if raw.call_duration.is_some() {
        return MessageKind::Call;
    }
    if matches!(
        raw.raw_type.as_deref(),
        Some("subscribe") | Some("unsubscribe") | Some("group_invite")
    ) {
        return MessageKind::System;
    }
    if raw.sticker.is_some() {
        return MessageKind::Sticker;
    }
    if share_link.is_some() || contains_url(content) {
        return MessageKind::Link;
    }
    if has_attachment && content.is_empty() {
        return MessageKind::Media;
    }
    MessageKind::Text
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn decode_messenger(json: &str) -> Result<ParsedConversation> {
        MetaThreadDecoder::new_messenger().decode(&RawExport::Json(json.to_string()))
    }

    const BASIC_THREAD: &str = indoc! {r#"
        {
          "participants": [{"name": "Anna"}, {"name": "Bartek"}],
          "messages": [
            {"sender_name": "Bartek", "timestamp_ms": 2000, "content": "newest"},
            {"sender_name": "Anna", "timestamp_ms": 1000, "content": "oldest"}
          ],
          "title": "Anna i Bartek"
        }
    "#};

    #[test]
    fn reverses_newest_first_order() {
        let conv = decode_messenger(BASIC_THREAD).unwrap();
        assert_eq!(conv.messages[0].content, "oldest");
        assert_eq!(conv.messages[1].content, "newest");
        assert_eq!(conv.messages[0].index, 0);
    }

    #[test]
    fn probe_accepts_envelope_and_rejects_others() {
        let decoder = MetaThreadDecoder::new_messenger();
        assert!(decoder.probe(&RawExport::Json(BASIC_THREAD.to_string())));
        assert!(!decoder.probe(&RawExport::Json(r#"{"messages": []}"#.to_string())));
        assert!(!decoder.probe(&RawExport::Text("not json".to_string())));
    }

    #[test]
    fn missing_required_fields_fail_fast() {
        let err = decode_messenger(r#"{"participants": []}"#).unwrap_err();
        assert!(matches!(err, Error::Format { platform: Platform::Messenger, .. }));

        let bad_first = indoc! {r#"
            {
              "participants": [{"name": "A"}],
              "messages": [{"content": "no sender"}]
            }
        "#};
        assert!(decode_messenger(bad_first).is_err());
    }

    #[test]
    fn repairs_mojibake_in_all_string_fields() {
        let json = indoc! {"
            {
              \"participants\": [{\"name\": \"Micha\u{00C5}\u{0082}\"}],
              \"messages\": [
                {\"sender_name\": \"Micha\u{00C5}\u{0082}\", \"timestamp_ms\": 1000,
                 \"content\": \"s\u{00C5}\u{0082}uchaj\",
                 \"reactions\": [{\"reaction\": \"\u{00F0}\u{009F}\u{0098}\u{0082}\", \"actor\": \"Micha\u{00C5}\u{0082}\"}]}
              ]
            }
        "};
        let conv = decode_messenger(json).unwrap();
        assert_eq!(conv.participants[0].name, "Michał");
        assert_eq!(conv.messages[0].content, "słuchaj");
        assert_eq!(conv.messages[0].reactions[0].emoji, "😂");
    }

    #[test]
    fn classification_precedence() {
        let json = indoc! {r#"
            {
              "participants": [{"name": "A"}],
              "messages": [
                {"sender_name": "A", "timestamp_ms": 6000, "content": "plain text"},
                {"sender_name": "A", "timestamp_ms": 5000, "photos": [{"uri": "p.jpg"}]},
                {"sender_name": "A", "timestamp_ms": 4000, "share": {"link": "https://x.io"}},
                {"sender_name": "A", "timestamp_ms": 3000, "sticker": {"uri": "s.png"}},
                {"sender_name": "A", "timestamp_ms": 2000, "call_duration": 60},
                {"sender_name": "A", "timestamp_ms": 1000, "content": "gone", "is_unsent": true}
              ]
            }
        "#};
        let conv = decode_messenger(json).unwrap();
        let kinds: Vec<MessageKind> = conv.messages.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MessageKind::Unsent,
                MessageKind::Call,
                MessageKind::Sticker,
                MessageKind::Link,
                MessageKind::Media,
                MessageKind::Text,
            ]
        );
        assert!(conv.messages[3].has_link);
        assert!(conv.messages[4].has_media);
    }

    #[test]
    fn instagram_variant_reports_its_platform() {
        let decoder = MetaThreadDecoder::new_instagram();
        let conv = decoder
            .decode(&RawExport::Json(BASIC_THREAD.to_string()))
            .unwrap();
        assert_eq!(conv.platform, Platform::Instagram);
    }
}
