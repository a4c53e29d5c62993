//! A MapReduce-compatible implementation of word count.
//!

use crate::WordCounts;

/// Normalizes a raw token: lowercased, with every character that is not an
/// ASCII letter, digit or underscore removed.
///
/// Returns [`None`] when nothing is left.
pub fn normalize(token: &str) -> Option<String> {
    let word = token
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>();
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

/// Counts the words of one chunk of text.
pub fn map(text: &str) -> WordCounts {
    let mut counts = WordCounts::new();
    for word in text.split_whitespace().filter_map(normalize) {
        *counts.entry(word).or_insert(0) += 1;
    }
    counts
}

/// Adds every count of `partial` into `total`.
pub fn reduce(total: &mut WordCounts, partial: WordCounts) {
    for (word, count) in partial {
        *total.entry(word).or_insert(0) += count;
    }
}
