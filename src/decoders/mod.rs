//! Platform decoders: heterogeneous chat exports in, the canonical
//! conversation model out.
//!
//! Each decoder is a pure transform. Validation is fast-fail: required
//! top-level fields are probed before the full parse, and an unrecognized
//! shape produces `Error::Format` with a platform hint that propagates to the
//! caller.

pub mod discord;
pub mod encoding;
pub mod messenger;
pub mod telegram;
pub mod whatsapp;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::core::errors::{Error, Result};
use crate::core::time::MS_PER_DAY;
use crate::core::{
    ConversationMetadata, DateRange, ParsedConversation, Participant, Platform, UnifiedMessage,
};

/// A raw export blob as handed over by the upload flow.
#[derive(Clone, Debug)]
pub enum RawExport {
    Json(String),
    Text(String),
}

impl RawExport {
    pub fn as_str(&self) -> &str {
        match self {
            RawExport::Json(s) | RawExport::Text(s) => s,
        }
    }
}

pub trait Decoder: Send + Sync {
    fn platform(&self) -> Platform;

    /// Cheap discriminant check: does this blob look like ours?
    fn probe(&self, raw: &RawExport) -> bool;

    fn decode(&self, raw: &RawExport) -> Result<ParsedConversation>;
}

pub fn get_decoder(platform: Platform) -> Box<dyn Decoder> {
    type DecoderFactory = fn() -> Box<dyn Decoder>;

    static DECODER_MAP: &[(Platform, DecoderFactory)] = &[
        (Platform::Messenger, || {
            Box::new(messenger::MetaThreadDecoder::new_messenger())
        }),
        (Platform::Instagram, || {
            Box::new(messenger::MetaThreadDecoder::new_instagram())
        }),
        (Platform::WhatsApp, || {
            Box::new(whatsapp::WhatsAppDecoder::new())
        }),
        (Platform::Telegram, || {
            Box::new(telegram::TelegramDecoder::new())
        }),
        (Platform::Discord, || Box::new(discord::DiscordDecoder::new())),
    ];

    DECODER_MAP
        .iter()
        .find(|(p, _)| *p == platform)
        .map(|(_, factory)| factory())
        .expect("every platform has a registered decoder")
}

/// Probe the blob against each platform's discriminant in a fixed order.
/// Telegram and Discord carry distinctive top-level keys and go first;
/// the Messenger/Instagram envelope is shared and probed last.
pub fn detect_platform(raw: &RawExport) -> Option<Platform> {
    const PROBE_ORDER: &[Platform] = &[
        Platform::Telegram,
        Platform::Discord,
        Platform::WhatsApp,
        Platform::Messenger,
    ];

    PROBE_ORDER
        .iter()
        .copied()
        .find(|&p| get_decoder(p).probe(raw))
}

/// Decode a single export blob, auto-detecting the platform.
pub fn decode(raw: &RawExport) -> Result<ParsedConversation> {
    let platform = detect_platform(raw).ok_or_else(|| {
        Error::UnknownFormat("no supported platform matches this export".to_string())
    })?;
    get_decoder(platform).decode(raw)
}

/// Decode a multi-file export (ordered list of blobs from one conversation)
/// and merge into a single conversation with recomputed metadata.
pub fn decode_many(platform: Platform, raws: &[RawExport]) -> Result<ParsedConversation> {
    if raws.is_empty() {
        return Err(Error::format(platform, "no export files supplied"));
    }
    let decoder = get_decoder(platform);
    let mut parts = Vec::with_capacity(raws.len());
    for raw in raws {
        parts.push(decoder.decode(raw)?);
    }
    merge(parts)
}

/// Merge conversations decoded from split export files: concatenate, drop
/// exact duplicates, re-sort, re-index, recompute metadata over the union.
pub fn merge(mut parts: Vec<ParsedConversation>) -> Result<ParsedConversation> {
    let first = parts
        .first()
        .ok_or_else(|| Error::validation("cannot merge zero conversations"))?;
    let platform = first.platform;
    let title = first.title.clone();
    let multi_file = parts.len() > 1;
    let source_files: usize = parts.iter().map(|p| p.metadata.source_files).sum();

    let mut participants: Vec<Participant> = Vec::new();
    let mut messages: Vec<UnifiedMessage> = Vec::new();
    let mut seen: HashMap<(i64, String, String), ()> = HashMap::new();

    for part in parts.drain(..) {
        if part.platform != platform {
            return Err(Error::validation(format!(
                "cannot merge {} export into a {} conversation",
                part.platform, platform
            )));
        }
        for p in part.participants {
            merge_participant(&mut participants, p);
        }
        for mut m in part.messages {
            let key = (m.timestamp_ms, m.sender.clone(), m.content.clone());
            if seen.insert(key, ()).is_some() {
                continue;
            }
            if multi_file {
                // Reply indices are per-file; a merged re-sort invalidates them.
                m.reply_to_index = None;
            }
            messages.push(m);
        }
    }

    finalize(platform, title, participants, messages, source_files)
}

/// Shared decoder back-end: stable chronological sort, dense index
/// assignment, participant deduplication, metadata recomputation.
pub fn finalize(
    platform: Platform,
    title: String,
    mut participants: Vec<Participant>,
    mut messages: Vec<UnifiedMessage>,
    source_files: usize,
) -> Result<ParsedConversation> {
    if messages.is_empty() {
        return Err(Error::format(platform, "export contains no messages"));
    }

    messages.sort_by_key(|m| m.timestamp_ms);
    for (i, m) in messages.iter_mut().enumerate() {
        m.index = i;
    }

    // Senders seen only in the message list still become participants.
    for m in &messages {
        if m.kind != crate::core::MessageKind::System && !m.sender.is_empty() {
            merge_participant(&mut participants, Participant::new(m.sender.clone()));
        }
    }

    let counted: Vec<&UnifiedMessage> = messages.iter().filter(|m| m.is_counted()).collect();
    let (start_ms, end_ms) = match (counted.first(), counted.last()) {
        (Some(first), Some(last)) => (first.timestamp_ms, last.timestamp_ms),
        _ => (0, 0),
    };
    let duration_days = std::cmp::max(
        1,
        ((end_ms - start_ms) as f64 / MS_PER_DAY as f64).round() as i64,
    );

    let metadata = ConversationMetadata {
        total_messages: counted.len(),
        date_range: DateRange { start_ms, end_ms },
        is_group: participants.len() >= 3,
        duration_days,
        source_files,
        extras: HashMap::new(),
    };

    log::debug!(
        "finalized {} conversation: {} messages, {} participants, {} days",
        platform,
        metadata.total_messages,
        participants.len(),
        metadata.duration_days
    );

    Ok(ParsedConversation {
        platform,
        title,
        participants,
        messages,
        metadata,
    })
}

fn merge_participant(participants: &mut Vec<Participant>, candidate: Participant) {
    match participants.iter_mut().find(|p| p.name == candidate.name) {
        Some(existing) => {
            if existing.platform_id.is_none() {
                existing.platform_id = candidate.platform_id;
            }
        }
        None => participants.push(candidate),
    }
}

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("valid URL pattern"));

pub(crate) fn contains_url(text: &str) -> bool {
    URL_PATTERN.is_match(text)
}
