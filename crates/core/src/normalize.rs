use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

pub const PORTUGUESE_STOPWORDS: &[&str] = &[
    "a", "o", "e", "de", "da", "do", "que", "com", "para", "em", "um", "uma", "na", "no", "dos",
    "das", "as", "os", "se", "por", "mais", "mas",
];

// `\x1C-\x1F` are the ASCII information separators, which count as
// whitespace for the splitting rules below but not for `\s`.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"http[^\s\x1C-\x1F]+|www[^\s\x1C-\x1F]+|https[^\s\x1C-\x1F]+")
        .expect("valid url regex")
});
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\s\x1C-\x1F]+@[^\s\x1C-\x1F]+").expect("valid email regex")
});
static DISALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\w\s\x1C-\x1F\-.,!?áàâãéèêíïóôõöúçñ]").expect("valid character filter regex")
});
static STOPWORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| PORTUGUESE_STOPWORDS.iter().copied().collect());

/// Strips links, addresses and stray symbols, then normalizes whitespace.
///
/// Passes repeat until the text is stable, so the result is a fixed point:
/// `clean_text(&clean_text(x)) == clean_text(x)`.
pub fn clean_text(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut current = clean_pass(input);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(input: &str) -> String {
    let text = URL_PATTERN.replace_all(input, "");
    let text = EMAIL_PATTERN.replace_all(&text, "");
    let text = DISALLOWED_CHARS.replace_all(&text, "");

    words(&text).collect::<Vec<_>>().join(" ")
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

fn words(input: &str) -> impl Iterator<Item = &str> {
    input.split(is_separator).filter(|word| !word.is_empty())
}

pub fn tokenize_text(input: &str) -> String {
    words(input).collect::<Vec<_>>().join(" ")
}

/// Drops Portuguese stopwords, compared case-insensitively.
pub fn remove_stopwords(input: &str) -> String {
    words(input)
        .filter(|token| !STOPWORDS.contains(token.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}
