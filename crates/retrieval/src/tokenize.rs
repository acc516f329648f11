use once_cell::sync::Lazy;
use regex::Regex;

static CLEANER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{Latin}\p{Devanagari}\p{Nd}\s]+").expect("valid tokenizer regex")
});

/// Lower-cased word tokens with punctuation stripped. Single-character tokens are dropped
/// unless they are digits, so train classes like "2" and "3" survive.
pub fn tokenize(input: &str) -> Vec<String> {
    let normalized = CLEANER.replace_all(input, " ").to_lowercase();

    normalized
        .split_whitespace()
        .filter(|token| token.chars().count() > 1 || token.chars().all(|c| c.is_numeric()))
        .map(|token| token.to_string())
        .collect()
}
