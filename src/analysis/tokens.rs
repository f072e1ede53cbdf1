//! Title tokenization and fuzzy token matching.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use strsim::levenshtein;

/// Marketplace filler words carrying no product identity. Tokens in this set
/// never participate in grouping, keys, or n-grams.
pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "for", "of", "with", "to",
        "from", "by", "as", "is", "it", "be", "are", "was", "this", "that", "new", "used",
        "like", "great", "good", "excellent", "condition", "free", "shipping", "fast", "lot",
        "set", "bundle", "item", "items", "sale", "buy", "now", "offer", "best", "see", "pics",
        "please", "look", "check", "my", "other", "rare", "vintage", "authentic", "genuine",
        "brand", "sealed", "box", "only", "included", "includes", "comes", "without", "size",
        "color", "model", "usa", "seller", "day", "same", "next",
    ]
    .into_iter()
    .collect()
});

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Tokenize a title: lowercase, punctuation to whitespace, drop
/// single-character tokens. ASCII word characters only — anything else is a
/// separator, which also strips foreign-script noise.
pub fn tokenize(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|t| t.len() > 1)
        .map(str::to_string)
        .collect()
}

/// Tokenize and drop stopwords; the unit fed to grouping.
pub fn content_tokens(title: &str) -> Vec<String> {
    tokenize(title)
        .into_iter()
        .filter(|t| !is_stopword(t))
        .collect()
}

/// Whether two tokens are close enough to count as the same word.
///
/// Exact equality always matches; otherwise the Levenshtein distance
/// normalized by the longer token must stay within `threshold`, and the
/// length difference within 3 characters. Tokens shorter than 3 characters
/// must match exactly.
pub fn tokens_similar(a: &str, b: &str, threshold: f64) -> bool {
    if a == b {
        return true;
    }
    if a.len().abs_diff(b.len()) > 3 {
        return false;
    }
    let max_len = a.len().max(b.len());
    if max_len < 3 {
        return false;
    }
    let distance = levenshtein(a, b);
    1.0 - (distance as f64 / max_len as f64) >= threshold
}

/// Fuzzy-tolerant Jaccard similarity between two token sets.
///
/// An exact match counts as a full match; a fuzzy match (per
/// [`tokens_similar`] at 0.8) counts as 0.8 of a match. Each token on the
/// right side is consumed by at most one match.
pub fn token_set_similarity(tokens_a: &[String], tokens_b: &[String]) -> f64 {
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let set_a: Vec<&str> = dedup_preserving_order(tokens_a);
    let set_b: Vec<&str> = dedup_preserving_order(tokens_b);
    let b_lookup: HashSet<&str> = set_b.iter().copied().collect();

    let mut matches = 0.0;
    let mut matched_b: HashSet<&str> = HashSet::new();
    for &a in &set_a {
        if b_lookup.contains(a) {
            matches += 1.0;
            matched_b.insert(a);
            continue;
        }
        for &b in &set_b {
            if matched_b.contains(b) {
                continue;
            }
            if tokens_similar(a, b, 0.8) {
                matches += 0.8;
                matched_b.insert(b);
                break;
            }
        }
    }

    let union = set_a.len() as f64 + set_b.len() as f64 - matches;
    matches / union
}

fn dedup_preserving_order(tokens: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .map(String::as_str)
        .filter(|t| seen.insert(*t))
        .collect()
}
