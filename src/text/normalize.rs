//! Text Normalizer
//!
//! Maps raw user text to the cleaned token string the vectorizer was fitted on.
//! Step order is fixed: each pattern assumes the output shape of the one before.

use once_cell::sync::Lazy;
use regex::Regex;

use super::stopwords::is_stopword;

// ============================================================================
// PATTERNS
// ============================================================================

/// URL-like runs: anything starting with `http`/`https`/`www` up to whitespace
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"http\S*|www\S*").expect("URL pattern is valid")
});

/// `@mention` tokens and bare `#` symbols (hashtag text is kept)
static MENTION_HASH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@\w+|#").expect("mention pattern is valid")
});

/// Anything that is neither a word character nor whitespace
static PUNCTUATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\w\s]").expect("punctuation pattern is valid")
});

/// Fused forms the English word tokenizer splits in two (`cannot` -> `can not`)
static CONTRACTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(can)(not)|(gim)(me)|(gon)(na)|(got)(ta)|(lem)(me)|(wan)(na))$")
        .expect("contraction pattern is valid")
});

// ============================================================================
// PUBLIC API
// ============================================================================

/// Clean raw text for vectorization.
///
/// 1. lowercase
/// 2. strip URLs
/// 3. strip `@mentions` and `#`
/// 4. strip punctuation
/// 5. split on whitespace, then split fused contractions (`gonna` -> `gon na`)
/// 6. drop English stopwords
/// 7. join with single spaces
///
/// Empty input gives empty output. Text that cleans down to nothing is
/// returned as `""`.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_urls = URL_PATTERN.replace_all(&lowered, "");
    let no_mentions = MENTION_HASH_PATTERN.replace_all(&no_urls, "");
    let no_punct = PUNCTUATION_PATTERN.replace_all(&no_mentions, "");

    no_punct
        .split_whitespace()
        .flat_map(split_contraction)
        .filter(|token| !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One whitespace token as one or two words
fn split_contraction(token: &str) -> Vec<&str> {
    match CONTRACTION_PATTERN.captures(token) {
        Some(caps) => caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .collect(),
        None => vec![token],
    }
}

// ============================================================================
// TESTS
// ============================================================================
