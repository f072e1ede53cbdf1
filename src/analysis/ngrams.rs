//! Keyword trend tables: contiguous n-token title sequences with their
//! sales aggregates.

use std::collections::HashMap;

use crate::domain::{Listing, NgramEntry};

use super::format;
use super::tokens::content_tokens;

/// Extract all n-grams of the given size across the listing titles.
///
/// Tokens are stopword- and pure-number-filtered before windowing, so
/// "nintendo switch 2023 oled" contributes "nintendo switch" and
/// "switch oled" for n = 2. Sorted by sold count descending (ties keep
/// first-seen order).
pub fn extract_ngrams(listings: &[&Listing], n: usize) -> Vec<NgramEntry> {
    debug_assert!(n >= 1);

    let mut order: Vec<String> = Vec::new();
    let mut aggregates: HashMap<String, (usize, f64, usize)> = HashMap::new();

    for listing in listings {
        let words: Vec<String> = content_tokens(&listing.title)
            .into_iter()
            .filter(|w| !is_pure_number(w))
            .collect();
        if words.len() < n {
            continue;
        }
        for window in words.windows(n) {
            let gram = window.join(" ");
            if !aggregates.contains_key(&gram) {
                order.push(gram.clone());
            }
            let entry = aggregates.entry(gram).or_insert((0, 0.0, 0));
            entry.0 += 1;
            if listing.price > 0.0 {
                entry.1 += listing.price;
                entry.2 += 1;
            }
        }
    }

    let mut rows: Vec<NgramEntry> = order
        .into_iter()
        .map(|term| {
            let (sold, total_price, priced) = aggregates[&term];
            NgramEntry {
                avg_price: if priced > 0 {
                    format::money(total_price / priced as f64)
                } else {
                    "0".to_string()
                },
                revenue: format::money(total_price),
                term,
                sold,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.sold.cmp(&a.sold));
    rows
}

fn is_pure_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Condition;

    fn listing(title: &str, price: f64) -> Listing {
        Listing {
            item_id: String::new(),
            title: title.to_string(),
            price,
            sold_date_text: String::new(),
            sold_timestamp: None,
            condition: Condition::Unknown,
            url: String::new(),
            image: String::new(),
        }
    }

    #[test]
    fn bigrams_aggregate_across_titles() {
        let owned = vec![
            listing("Nintendo Switch OLED", 100.0),
            listing("Nintendo Switch dock", 40.0),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        let grams = extract_ngrams(&refs, 2);

        let top = &grams[0];
        assert_eq!(top.term, "nintendo switch");
        assert_eq!(top.sold, 2);
        assert_eq!(top.avg_price, "70.00");
        assert_eq!(top.revenue, "140.00");
    }

    #[test]
    fn numbers_and_stopwords_are_excluded_from_windows() {
        let owned = vec![listing("rare Nintendo 2023 Switch console", 50.0)];
        let refs: Vec<&Listing> = owned.iter().collect();
        let grams = extract_ngrams(&refs, 2);
        let terms: Vec<&str> = grams.iter().map(|g| g.term.as_str()).collect();
        // "rare" is a stopword and "2023" is numeric; the window closes over
        // the survivors.
        assert_eq!(terms, vec!["nintendo switch", "switch console"]);
    }

    #[test]
    fn short_titles_produce_no_oversized_grams() {
        let owned = vec![listing("Nintendo Switch", 50.0)];
        let refs: Vec<&Listing> = owned.iter().collect();
        assert!(extract_ngrams(&refs, 3).is_empty());
    }
}
