//! Fuzzy grouping engine: clusters listings that describe the same or
//! closely related product.
//!
//! Two complementary strategies run over the same candidate set and are
//! merged by exclusion — a listing claimed by the pairwise strategy is not
//! reconsidered by key extraction:
//!
//! * **Pairwise token-set similarity** — greedy seeding over fuzzy Jaccard
//!   scores. Quadratic, so it is skipped entirely above
//!   [`PAIRWISE_CUTOFF`] candidates; that absence is intentional
//!   degradation, not a failure.
//! * **Frequency-filtered key extraction** — listings sharing an identical
//!   document-frequency-filtered token key form a group. Linear, always on.
//!
//! Groups are index-based so callers can enforce membership exclusivity.

use std::collections::{HashMap, HashSet};

use crate::domain::Listing;

use super::tokens::{content_tokens, is_stopword, token_set_similarity, tokenize};

/// Candidate-set size above which the quadratic pairwise strategy is skipped.
pub const PAIRWISE_CUTOFF: usize = 2000;

/// Token document frequency below which a token cannot disambiguate.
const MIN_DOCUMENT_FREQUENCY: usize = 2;
/// Corpus share above which a token no longer discriminates.
const MAX_DOCUMENT_SHARE: f64 = 0.6;
/// Fallback key length when no token survives the frequency filter.
const FALLBACK_KEY_TOKENS: usize = 5;

/// Strategy A: greedy pairwise clustering by fuzzy token-set similarity.
///
/// Returns index groups of size ≥ 2, in seed order. Empty above
/// [`PAIRWISE_CUTOFF`] candidates.
pub fn fuzzy_groups(listings: &[&Listing], similarity_threshold: f64) -> Vec<Vec<usize>> {
    if listings.len() > PAIRWISE_CUTOFF {
        return Vec::new();
    }

    let tokenized: Vec<Vec<String>> = listings
        .iter()
        .map(|l| content_tokens(&l.title))
        .collect();

    let mut groups = Vec::new();
    let mut assigned = vec![false; listings.len()];

    for seed in 0..tokenized.len() {
        if assigned[seed] {
            continue;
        }
        let mut group = vec![seed];
        assigned[seed] = true;
        for candidate in seed + 1..tokenized.len() {
            if assigned[candidate] {
                continue;
            }
            let similarity = token_set_similarity(&tokenized[seed], &tokenized[candidate]);
            if similarity >= similarity_threshold {
                group.push(candidate);
                assigned[candidate] = true;
            }
        }
        if group.len() >= 2 {
            groups.push(group);
        }
    }
    groups
}

/// Document frequency of every non-stopword token across the candidate set.
/// Each title contributes each distinct token once.
pub fn token_document_frequency(listings: &[&Listing]) -> HashMap<String, usize> {
    let mut df: HashMap<String, usize> = HashMap::new();
    for listing in listings {
        let distinct: HashSet<String> = tokenize(&listing.title).into_iter().collect();
        for token in distinct {
            if is_stopword(&token) {
                continue;
            }
            *df.entry(token).or_insert(0) += 1;
        }
    }
    df
}

/// Strategy B key: the sorted, space-joined set of a title's tokens that are
/// frequent enough to group on but not so common they match everything.
/// Falls back to the first five non-stopword tokens; empty when the title
/// has none at all.
pub fn title_key(title: &str, df: &HashMap<String, usize>, total_docs: usize) -> String {
    let tokens = tokenize(title);
    let mut filtered: Vec<&String> = tokens
        .iter()
        .filter(|t| {
            if is_stopword(t) {
                return false;
            }
            let frequency = df.get(*t).copied().unwrap_or(0);
            frequency >= MIN_DOCUMENT_FREQUENCY
                && frequency as f64 / total_docs as f64 <= MAX_DOCUMENT_SHARE
        })
        .collect();

    if filtered.is_empty() {
        filtered = tokens
            .iter()
            .filter(|t| !is_stopword(t))
            .take(FALLBACK_KEY_TOKENS)
            .collect();
    }

    let mut key_tokens: Vec<&str> = filtered.iter().map(|t| t.as_str()).collect();
    key_tokens.sort_unstable();
    key_tokens.join(" ")
}

/// Strategy B: group listings by identical title key.
///
/// Keys are computed over the *full* candidate set so the document-frequency
/// filter sees the whole corpus; callers then drop members already claimed by
/// Strategy A. Groups are returned in first-seen key order; empty keys are
/// skipped.
pub fn key_groups(listings: &[&Listing]) -> Vec<(String, Vec<usize>)> {
    let df = token_document_frequency(listings);
    let total_docs = listings.len();

    let mut order: Vec<String> = Vec::new();
    let mut members: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, listing) in listings.iter().enumerate() {
        let key = title_key(&listing.title, &df, total_docs);
        if key.is_empty() {
            continue;
        }
        if !members.contains_key(&key) {
            order.push(key.clone());
        }
        members.entry(key).or_default().push(index);
    }

    order
        .into_iter()
        .map(|key| {
            let group = members.remove(&key).unwrap_or_default();
            (key, group)
        })
        .collect()
}

/// Group label: tokens shared by at least `min_share` of the members, most
/// frequent first, capped at `top_n`, alphabetically sorted. Empty when no
/// token clears the share bar.
pub fn group_label(members: &[&Listing], min_share: f64, top_n: usize) -> String {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for member in members {
        for token in content_tokens(&member.title) {
            if !counts.contains_key(&token) {
                order.push(token.clone());
            }
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let threshold = ((members.len() as f64 * min_share).ceil() as usize).max(1);
    let mut common: Vec<&String> = order.iter().filter(|t| counts[*t] >= threshold).collect();
    // Stable sort: ties keep first-seen order.
    common.sort_by(|a, b| counts[*b].cmp(&counts[*a]));
    common.truncate(top_n);

    let mut label_tokens: Vec<&str> = common.iter().map(|t| t.as_str()).collect();
    label_tokens.sort_unstable();
    label_tokens.join(" ")
}

/// First `max` characters of a string, on a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Condition;

    fn listing(title: &str) -> Listing {
        Listing {
            item_id: String::new(),
            title: title.to_string(),
            price: 10.0,
            sold_date_text: String::new(),
            sold_timestamp: None,
            condition: Condition::Unknown,
            url: String::new(),
            image: String::new(),
        }
    }

    #[test]
    fn near_identical_titles_cluster() {
        let owned = vec![
            listing("Nintendo Switch OLED Console White"),
            listing("Nintendo Switch OLED White Console"),
            listing("Leather Jacket Womens Medium Brown"),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        let groups = fuzzy_groups(&refs, 0.6);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0], vec![0, 1]);
    }

    #[test]
    fn singleton_groups_are_discarded() {
        let owned = vec![
            listing("Nintendo Switch OLED Console"),
            listing("Leather Jacket Womens Medium"),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        assert!(fuzzy_groups(&refs, 0.6).is_empty());
    }

    #[test]
    fn pairwise_strategy_skips_oversized_sets() {
        let owned: Vec<Listing> = (0..PAIRWISE_CUTOFF + 1)
            .map(|i| listing(&format!("identical widget pro title {}", i % 2)))
            .collect();
        let refs: Vec<&Listing> = owned.iter().collect();
        assert!(fuzzy_groups(&refs, 0.6).is_empty());
    }

    #[test]
    fn group_membership_is_exclusive() {
        let owned = vec![
            listing("Acme Widget Pro 3000"),
            listing("Acme Widget Pro 3000"),
            listing("Acme Widget Pro 3000 extra"),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        let groups = fuzzy_groups(&refs, 0.6);
        let mut seen = HashSet::new();
        for group in &groups {
            for index in group {
                assert!(seen.insert(*index), "listing {index} appears in two groups");
            }
        }
    }

    #[test]
    fn title_key_filters_by_document_frequency() {
        let owned = vec![
            listing("alpha widget red"),
            listing("alpha widget blue"),
            listing("alpha widget green"),
            listing("alpha gizmo red"),
            listing("alpha gizmo blue"),
            listing("alpha gizmo green"),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        let df = token_document_frequency(&refs);
        // "alpha" appears in 6/6 docs (> 60% of corpus, dropped); "widget"
        // (3/6) and "red" (2/6) survive the filter.
        let key = title_key("alpha widget red", &df, refs.len());
        assert_eq!(key, "red widget");
    }

    #[test]
    fn title_key_falls_back_to_leading_tokens() {
        let owned = vec![listing("unique gadget xyz"), listing("other thing abc")];
        let refs: Vec<&Listing> = owned.iter().collect();
        let df = token_document_frequency(&refs);
        // Every token is unique (df == 1), so the fallback applies.
        let key = title_key("unique gadget xyz", &df, refs.len());
        assert_eq!(key, "gadget unique xyz");
    }

    #[test]
    fn key_groups_collect_identical_keys() {
        let owned = vec![
            listing("Acme Widget Pro red"),
            listing("red Acme Widget Pro"),
            listing("Different gizmo thing"),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        let groups = key_groups(&refs);
        let widget_group = groups
            .iter()
            .find(|(_, members)| members.len() == 2)
            .expect("widget pair groups");
        assert_eq!(widget_group.1, vec![0, 1]);
    }

    #[test]
    fn labels_use_majority_tokens_sorted_alphabetically() {
        let owned = vec![
            listing("Nintendo Switch OLED white"),
            listing("Nintendo Switch OLED console"),
            listing("Nintendo Switch dock"),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        let label = group_label(&refs, 0.5, 6);
        assert_eq!(label, "nintendo oled switch");
    }
}
