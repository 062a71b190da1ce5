//! Text repair for Facebook-family exports.
//!
//! Facebook's JSON export writes UTF-8 bytes as individual Latin-1 code
//! points, so any non-ASCII text (diacritics, emoji) arrives corrupted:
//! "å\u{9b}ochaj" instead of "słuchaj". The repair reinterprets each code
//! point as a raw byte and re-decodes the byte string as UTF-8. Strings that
//! fail re-decoding are kept as-is.

/// Repair mis-encoded UTF-8 in a Messenger/Instagram export string.
pub fn repair_mojibake(s: &str) -> String {
    if s.is_ascii() {
        return s.to_string();
    }
    let bytes: Option<Vec<u8>> = s.chars().map(|c| u8::try_from(c as u32).ok()).collect();
    match bytes {
        Some(raw) => String::from_utf8(raw).unwrap_or_else(|_| s.to_string()),
        // Code points above 0xFF mean the string was never byte-mangled.
        None => s.to_string(),
    }
}

/// Repair an optional field in place.
pub fn repair_opt(s: Option<String>) -> Option<String> {
    s.map(|v| repair_mojibake(&v))
}
