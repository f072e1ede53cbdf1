//! Pattern tables for the analysis pipeline: bulk-lot detection, foreign
//! noise, and the curated brand vocabulary. Kept separate from control flow
//! so the vocabulary can grow without touching the aggregation logic.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::Listing;

/// Multi-unit and reseller listings; these distort single-item price stats.
pub static LOT_PATTERNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(lot|bulk|wholesale|(\d+)\s*x\s*|x\s*(\d+)|\d{2,}\s*(pcs|pieces|units)|bundle|batch)\b",
    )
    .unwrap()
});

/// CJK script plus the foreign keywords that dominate cross-border relists.
pub static FOREIGN_PATTERNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[\x{3000}-\x{9fff}]|schwarz|neu|très|nuevo|nuovo").unwrap());

/// Curated brand vocabulary, grouped by market segment. First matching
/// pattern wins per listing; capture group 1 is the brand name.
pub static BRAND_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(nike|adidas|puma|reebok|converse|vans|jordans?)\b",
        r"(?i)\b(apple|samsung|sony|lg|google|microsoft)\b",
        r"(?i)\b(gucci|prada|louis\s*vuitton|chanel|hermes|burberry|coach)\b",
        r"(?i)\b(zara|h&m|uniqlo|gap|forever\s*21|urban\s*outfitters|anthropologie)\b",
        r"(?i)\b(levi'?s?|wrangler|lee|diesel|true\s*religion)\b",
        r"(?i)\b(nintendo|playstation|xbox|ps[45])\b",
        r"(?i)\b(north\s*face|patagonia|columbia|arc'?teryx)\b",
        r"(?i)\b(free\s*people|reformation|madewell|aritzia)\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static BRAND_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonical lowercase brand key for aggregation ("Louis  Vuitton" and
/// "louis vuitton" collapse to one row).
pub fn brand_key(matched: &str) -> String {
    BRAND_WHITESPACE
        .replace_all(&matched.to_lowercase(), " ")
        .into_owned()
}

/// Whether a listing is a lot/bulk/foreign-noise record to exclude from
/// single-item price analysis.
pub fn is_bulk_lot(listing: &Listing, max_price: f64) -> bool {
    LOT_PATTERNS.is_match(&listing.title)
        || FOREIGN_PATTERNS.is_match(&listing.title)
        || listing.price > max_price
}

/// Drop lot/bulk/foreign listings and anything above the price ceiling.
pub fn filter_bulk_lots<'a>(listings: &[&'a Listing], max_price: f64) -> Vec<&'a Listing> {
    listings
        .iter()
        .copied()
        .filter(|l| !is_bulk_lot(l, max_price))
        .collect()
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
    fn lots_and_bulk_are_filtered() {
        assert!(is_bulk_lot(&listing("Lot of 5 widgets", 20.0), 1500.0));
        assert!(is_bulk_lot(&listing("wholesale pallet deal", 20.0), 1500.0));
        assert!(is_bulk_lot(&listing("3 x controllers", 20.0), 1500.0));
        assert!(is_bulk_lot(&listing("24 pcs screen protectors", 20.0), 1500.0));
        assert!(!is_bulk_lot(&listing("single widget pro", 20.0), 1500.0));
    }

    #[test]
    fn foreign_noise_is_filtered() {
        assert!(is_bulk_lot(&listing("コントローラー switch", 20.0), 1500.0));
        assert!(is_bulk_lot(&listing("Controller schwarz", 20.0), 1500.0));
        assert!(!is_bulk_lot(&listing("Controller black", 20.0), 1500.0));
    }

    #[test]
    fn price_ceiling_applies() {
        assert!(is_bulk_lot(&listing("widget pro deluxe", 1501.0), 1500.0));
        assert!(!is_bulk_lot(&listing("widget pro deluxe", 1500.0), 1500.0));
    }

    #[test]
    fn brand_keys_collapse_whitespace_and_case() {
        assert_eq!(brand_key("Louis  Vuitton"), "louis vuitton");
        assert_eq!(brand_key("NIKE"), "nike");
    }

    #[test]
    fn first_matching_brand_pattern_wins() {
        let title = "Nike x Apple collab sneaker".to_lowercase();
        let matched = BRAND_PATTERNS
            .iter()
            .find_map(|p| p.captures(&title))
            .map(|c| c[1].to_string());
        assert_eq!(matched.as_deref(), Some("nike"));
    }
}
