//! Decoder for WhatsApp's line-delimited text export.
//!
//! Two layouts exist in the wild: the bracketed one
//! (`[31.12.2023, 23:59:59] Anna: text`) and the dashed one
//! (`12/31/23, 11:59 PM - Anna: text`). Lines without a timestamp prefix are
//! continuations of the previous message. Exports carry no time zone; the
//! clock is taken as-is.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{contains_url, finalize, Decoder, RawExport};
use crate::core::errors::{Error, Result};
use crate::core::{MessageKind, ParsedConversation, Platform, UnifiedMessage};

pub struct WhatsAppDecoder;

impl WhatsAppDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WhatsAppDecoder {
    fn default() -> Self {
        Self::new()
    }
}

static BRACKET_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\[(?P<date>\d{1,4}[./-]\d{1,2}[./-]\d{2,4}),?\s+(?P<time>\d{1,2}:\d{2}(?::\d{2})?\s?(?:[APap][Mm])?)\]\s(?P<rest>.*)$",
    )
    .expect("valid bracket pattern")
});

static DASH_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<date>\d{1,4}[./-]\d{1,2}[./-]\d{2,4}),?\s+(?P<time>\d{1,2}:\d{2}(?::\d{2})?\s?(?:[APap][Mm])?)\s-\s(?P<rest>.*)$",
    )
    .expect("valid dash pattern")
});

const MEDIA_MARKERS: &[&str] = &[
    "<media omitted>",
    "image omitted",
    "video omitted",
    "gif omitted",
    "audio omitted",
    "sticker omitted",
    "document omitted",
    "contact card omitted",
];

const UNSENT_MARKERS: &[&str] = &[
    "this message was deleted",
    "you deleted this message",
    "wiadomość została usunięta",
];

const CALL_MARKERS: &[&str] = &["missed voice call", "missed video call"];

impl Decoder for WhatsAppDecoder {
    fn platform(&self) -> Platform {
        Platform::WhatsApp
    }

    fn probe(&self, raw: &RawExport) -> bool {
        raw.as_str()
            .lines()
            .map(strip_direction_marks)
            .find(|l| !l.trim().is_empty())
            .map(|l| BRACKET_LINE.is_match(&l) || DASH_LINE.is_match(&l))
            .unwrap_or(false)
    }

    fn decode(&self, raw: &RawExport) -> Result<ParsedConversation> {
        let mut messages: Vec<UnifiedMessage> = Vec::new();
        let mut skipped = 0usize;

        for line in raw.as_str().lines() {
            let line = strip_direction_marks(line);
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Some(ParsedLine::Message(m)) => messages.push(m),
                Some(ParsedLine::Invalid) => skipped += 1,
                None => {
                    // Continuation of the previous message body.
                    if let Some(last) = messages.last_mut() {
                        if last.kind == MessageKind::Text || last.kind == MessageKind::Link {
                            last.content.push('\n');
                            last.content.push_str(line.trim_end());
                            last.has_link = last.has_link || contains_url(&line);
                        }
                    } else {
                        skipped += 1;
                    }
                }
            }
        }

        if skipped > 0 {
            log::warn!("WhatsApp: skipped {skipped} unparsable lines");
        }
        if messages.is_empty() {
            return Err(Error::format(
                Platform::WhatsApp,
                "no lines match a known WhatsApp export layout",
            ));
        }

        let title = String::new();
        let conv = finalize(Platform::WhatsApp, title, Vec::new(), messages, 1)?;
        Ok(with_default_title(conv))
    }
}

fn with_default_title(mut conv: ParsedConversation) -> ParsedConversation {
    if conv.title.is_empty() {
        conv.title = conv.participant_names().join(", ");
    }
    conv
}

enum ParsedLine {
    Message(UnifiedMessage),
    /// Timestamp prefix recognized but the payload is unusable.
    Invalid,
}

/// `None` means the line has no timestamp prefix (continuation).
fn parse_line(line: &str) -> Option<ParsedLine> {
    let caps = BRACKET_LINE.captures(line).or_else(|| DASH_LINE.captures(line))?;

    let timestamp_ms = match parse_timestamp(&caps["date"], &caps["time"]) {
        Some(ts) => ts,
        None => return Some(ParsedLine::Invalid),
    };
    let rest = caps["rest"].trim();

    let message = match rest.split_once(": ") {
        Some((name, text)) => build_message(name.trim(), text.trim(), timestamp_ms),
        // Timestamped lines with no sender separator are service events.
        None => UnifiedMessage::new("", rest, timestamp_ms, MessageKind::System),
    };
    Some(ParsedLine::Message(message))
}

fn build_message(sender: &str, text: &str, timestamp_ms: i64) -> UnifiedMessage {
    let lowered = text.to_lowercase();
    let kind = if UNSENT_MARKERS.iter().any(|m| lowered.contains(m)) {
        MessageKind::Unsent
    } else if CALL_MARKERS.iter().any(|m| lowered.contains(m)) {
        MessageKind::Call
    } else if is_media_marker(&lowered) {
        MessageKind::Media
    } else if contains_url(text) {
        MessageKind::Link
    } else {
        MessageKind::Text
    };

    let content = match kind {
        MessageKind::Media | MessageKind::Unsent | MessageKind::Call => String::new(),
        _ => text.to_string(),
    };

    let mut message = UnifiedMessage::new(sender, content, timestamp_ms, kind);
    message.has_media = kind == MessageKind::Media;
    message.has_link = kind == MessageKind::Link;
    message.is_unsent = kind == MessageKind::Unsent;
    message
}

fn is_media_marker(lowered: &str) -> bool {
    lowered.starts_with("<attached:") || MEDIA_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Date layout convention: `/` separates US month-first dates, `.` and `-`
/// separate day-first dates; a leading 4-digit component is year-first.
fn parse_timestamp(date: &str, time: &str) -> Option<i64> {
    let sep = date.chars().find(|c| ['.', '/', '-'].contains(c))?;
    let parts: Vec<i64> = date
        .split(sep)
        .map(|p| p.parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if parts.len() != 3 {
        return None;
    }

    let (year, month, day) = if parts[0] > 99 {
        (parts[0], parts[1], parts[2])
    } else if sep == '/' {
        (parts[2], parts[0], parts[1])
    } else {
        (parts[2], parts[1], parts[0])
    };
    let year = if year < 100 { year + 2000 } else { year };

    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?;
    let time = parse_time(time)?;
    Some(date.and_time(time).and_utc().timestamp_millis())
}

fn parse_time(time: &str) -> Option<NaiveTime> {
    let upper = time.trim().to_ascii_uppercase();
    let (clock, meridiem) = if let Some(c) = upper.strip_suffix("AM") {
        (c.trim().to_string(), Some(false))
    } else if let Some(c) = upper.strip_suffix("PM") {
        (c.trim().to_string(), Some(true))
    } else {
        (upper, None)
    };

    let fields: Vec<u32> = clock
        .split(':')
        .map(|p| p.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;
    let (mut hour, minute, second) = match fields.as_slice() {
        [h, m] => (*h, *m, 0),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };

    match meridiem {
        Some(true) if hour < 12 => hour += 12,
        Some(false) if hour == 12 => hour = 0,
        _ => {}
    }

    NaiveTime::from_hms_opt(hour, minute, second)
}

fn strip_direction_marks(line: &str) -> String {
    line.chars()
        .filter(|c| !matches!(c, '\u{200E}' | '\u{200F}' | '\u{FEFF}'))
        .collect()
}
