//! Tokenization and lexical helpers shared by the accumulation pass and the
//! heuristic classifiers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashSet;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("valid URL pattern"));

/// Remove URLs (including their query strings) from a message body.
pub fn strip_urls(text: &str) -> Cow<'_, str> {
    URL_RE.replace_all(text, "")
}

/// Lowercase word tokens; apostrophes survive inside a token.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || (c == '\'' && !current.is_empty()) {
            current.push(c);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// English + Polish function words filtered out of n-grams and topic-overlap
/// checks.
pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // English
        "the", "a", "an", "and", "or", "but", "if", "of", "at", "by", "for", "with", "about",
        "to", "from", "in", "on", "is", "are", "was", "were", "be", "been", "being", "have",
        "has", "had", "do", "does", "did", "will", "would", "can", "could", "should", "i",
        "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "your",
        "his", "its", "our", "their", "this", "that", "these", "those", "so", "just", "not",
        "no", "yes", "too", "very", "what", "when", "where", "who", "why", "how", "im", "its",
        "dont", "thats", "ok", "okay", "yeah", "like",
        // Polish
        "i", "w", "z", "na", "do", "się", "sie", "nie", "tak", "to", "że", "ze", "jest", "był",
        "była", "było", "być", "mam", "masz", "ma", "mi", "ci", "cię", "cie", "ja", "ty", "on",
        "ona", "my", "wy", "oni", "ale", "bo", "jak", "co", "czy", "po", "za", "od", "dla",
        "przez", "przy", "ten", "ta", "te", "już", "juz", "tylko", "też", "tez", "no", "a",
        "o", "u",
    ]
    .into_iter()
    .collect()
});

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// A token that can carry topic: long enough and not a function word.
pub fn is_non_trivial(token: &str) -> bool {
    token.chars().count() > 3 && !is_stopword(token)
}

/// Content words shared between two texts (topic overlap).
pub fn shared_non_trivial_words(a: &str, b: &str) -> usize {
    let a_tokens: HashSet<String> = tokenize(a).into_iter().filter(|t| is_non_trivial(t)).collect();
    if a_tokens.is_empty() {
        return 0;
    }
    tokenize(b)
        .into_iter()
        .filter(|t| is_non_trivial(t))
        .collect::<HashSet<_>>()
        .intersection(&a_tokens)
        .count()
}

/// Rough emoji check over the common emoji blocks.
pub fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F300..=0x1F5FF
            | 0x1F600..=0x1F64F
            | 0x1F680..=0x1F6FF
            | 0x1F900..=0x1F9FF
            | 0x1FA70..=0x1FAFF
            | 0x2600..=0x26FF
            | 0x2700..=0x27BF
            | 0x2B00..=0x2BFF
            | 0x1F1E6..=0x1F1FF
    )
}

pub fn emojis(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().filter(|c| is_emoji(*c))
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// A question mark outside of URL query strings.
pub fn contains_question(text: &str) -> bool {
    strip_urls(text).contains('?')
}
