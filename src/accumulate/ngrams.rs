//! Stopword-filtered n-gram counting (1-3 word phrases).

use std::collections::HashMap;

use super::text::{is_non_trivial, is_stopword, tokenize};

/// Count 1-3-grams from a message body into `counts`. Unigrams must be
/// content words; longer grams must start and end on one.
pub fn count_ngrams(text: &str, counts: &mut HashMap<String, u32>) {
    let tokens = tokenize(text);
    for token in &tokens {
        if is_non_trivial(token) {
            *counts.entry(token.clone()).or_insert(0) += 1;
        }
    }
    for n in 2..=3usize {
        if tokens.len() < n {
            break;
        }
        for window in tokens.windows(n) {
            let first = &window[0];
            let last = &window[n - 1];
            if is_stopword(first) || is_stopword(last) {
                continue;
            }
            if !window.iter().any(|t| is_non_trivial(t)) {
                continue;
            }
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
}

/// Top `n` phrases by count, ties broken alphabetically for determinism.
pub fn top_ngrams(counts: &HashMap<String, u32>, n: usize) -> Vec<(String, u32)> {
    let mut entries: Vec<(String, u32)> = counts
        .iter()
        .map(|(phrase, count)| (phrase.clone(), *count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unigrams_are_content_words_only() {
        let mut counts = HashMap::new();
        count_ngrams("the concert was amazing", &mut counts);
        assert_eq!(counts.get("concert"), Some(&1));
        assert_eq!(counts.get("amazing"), Some(&1));
        assert_eq!(counts.get("the"), None);
    }

    #[test]
    fn ngrams_never_start_or_end_on_stopwords() {
        let mut counts = HashMap::new();
        count_ngrams("pizza place downtown", &mut counts);
        assert_eq!(counts.get("pizza place"), Some(&1));
        assert_eq!(counts.get("pizza place downtown"), Some(&1));
        let mut counts = HashMap::new();
        count_ngrams("the pizza", &mut counts);
        assert!(!counts.contains_key("the pizza"));
    }

    #[test]
    fn top_ngrams_is_deterministic_under_ties() {
        let mut counts = HashMap::new();
        counts.insert("zeta".to_string(), 2);
        counts.insert("alpha".to_string(), 2);
        counts.insert("mid".to_string(), 5);
        let top = top_ngrams(&counts, 2);
        assert_eq!(top[0].0, "mid");
        assert_eq!(top[1].0, "alpha");
    }
}
