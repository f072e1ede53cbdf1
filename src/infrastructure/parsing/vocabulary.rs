//! Pattern tables for rendered-page extraction.
//!
//! Every regex and selector the normalizer relies on lives here so the
//! vocabulary can be extended when the site changes markup, without touching
//! the extraction control flow.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

use crate::domain::Condition;

/// Result cards inside the search-results list.
pub static CARD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("ul.srp-results > li.s-card, ul.srp-results > li.s-item")
        .expect("card selector is valid")
});

/// Dedicated condition sub-element within a card.
pub static CONDITION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".SECONDARY_INFO, [class*=\"subtitle\"], [class*=\"condition\"]")
        .expect("condition selector is valid")
});

/// Links to an item detail page.
pub static ITEM_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href*=\"/itm/\"]").expect("item link selector is valid"));

/// Card image element, across the markup variants the site rotates through.
pub static IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".s-item__image-img, .s-item__image img, .s-card__image, .su-media__image img")
        .expect("image selector is valid")
});

/// Lazy-load attributes preferred over the eager `src`.
pub const IMAGE_LAZY_ATTRS: [&str; 3] = ["data-defer-load", "data-src", "data-config-src"];

/// Promotional placeholder card text; such cards carry no sold item.
pub const PLACEHOLDER_TEXT: &str = "Shop on eBay";

/// Marker that a card describes a completed sale.
pub static SOLD_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Sold\s").unwrap());

/// Primary sold-date phrase, anchored on month names.
pub static SOLD_DATE_PRIMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)Sold\s+((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2}(?:,?\s*\d{4})?)",
    )
    .unwrap()
});

/// Looser fallback: any full month-day-year date in the card text.
pub static SOLD_DATE_LOOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2},?\s*\d{4})")
        .unwrap()
});

/// Title text between the sold-date phrase and the trailing link marker.
pub static TITLE_BETWEEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Sold\s+\w+\s+\d+,?\s*\d*(.+?)Opens in a new").unwrap());

/// Leading 4-digit artifact the date phrase leaves on the title.
pub static TITLE_YEAR_ARTIFACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}").unwrap());

/// Leading comma/whitespace left after stripping the artifact.
pub static TITLE_LEADING_JUNK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^,?\s*").unwrap());

/// "New Listing" badge text glued to the front of some titles.
pub static TITLE_NEW_LISTING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^New Listing").unwrap());

/// First dollar amount in the card text.
pub static PRICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(\d+(?:,\d{3})*\.?\d*)").unwrap());

/// Numeric item identifier inside a detail-page URL.
pub static ITEM_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/itm/(\d+)").unwrap());

/// Thumbnail-size image suffixes, upgraded to a 500px rendition.
pub static THUMB_WEBP: Lazy<Regex> = Lazy::new(|| Regex::new(r"s-l\d+\.webp").unwrap());
pub static THUMB_JPG: Lazy<Regex> = Lazy::new(|| Regex::new(r"s-l\d+\.jpg").unwrap());

/// Textual signals that the source served an anti-bot interstitial instead of
/// results. Checked case-sensitively against page title and content, the way
/// the interstitials actually render them.
pub const BLOCK_INDICATORS: [&str; 4] = [
    "captcha",
    "Security Measure",
    "Pardon Our Interruption",
    "Checking your browser",
];

/// Whether a rendered page looks like an anti-bot interstitial.
pub fn is_block_page(title: &str, content: &str) -> bool {
    BLOCK_INDICATORS
        .iter()
        .any(|marker| title.contains(marker) || content.contains(marker))
}

static COND_PRE_OWNED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)pre-owned").unwrap());
static COND_OPEN_BOX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)open\s*box").unwrap());
static COND_REFURBISHED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)refurbished").unwrap());
static COND_FOR_PARTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)for\s*parts|not\s*working").unwrap());
static COND_BRAND_NEW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)brand\s*new").unwrap());
static COND_BARE_NEW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnew\b").unwrap());
static COND_BARE_USED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bused\b").unwrap());

/// Match a dedicated condition fragment against the known vocabulary.
///
/// A bare "new"/"used" is trusted here because the fragment comes from a
/// condition-specific sub-element, not arbitrary card text.
pub fn condition_from_fragment(fragment: &str) -> Option<Condition> {
    if COND_PRE_OWNED.is_match(fragment) {
        Some(Condition::PreOwned)
    } else if COND_OPEN_BOX.is_match(fragment) {
        Some(Condition::OpenBox)
    } else if COND_REFURBISHED.is_match(fragment) {
        Some(Condition::Refurbished)
    } else if COND_FOR_PARTS.is_match(fragment) {
        Some(Condition::ForParts)
    } else if COND_BRAND_NEW.is_match(fragment) || COND_BARE_NEW.is_match(fragment) {
        Some(Condition::BrandNew)
    } else if COND_BARE_USED.is_match(fragment) {
        Some(Condition::PreOwned)
    } else {
        None
    }
}

/// Scan the whole card text for a condition marker. More conservative than
/// [`condition_from_fragment`]: bare "new"/"used" are ambiguous in full text.
pub fn condition_from_full_text(text: &str) -> Option<Condition> {
    if COND_PRE_OWNED.is_match(text) {
        Some(Condition::PreOwned)
    } else if COND_OPEN_BOX.is_match(text) {
        Some(Condition::OpenBox)
    } else if COND_REFURBISHED.is_match(text) {
        Some(Condition::Refurbished)
    } else if COND_FOR_PARTS.is_match(text) {
        Some(Condition::ForParts)
    } else if COND_BRAND_NEW.is_match(text) {
        Some(Condition::BrandNew)
    } else {
        None
    }
}

static NEW_LISTING_ANYWHERE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)New Listing").unwrap());
static NEW_WORD_EXACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bNew\b").unwrap());
static PRICE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\d").unwrap());

/// Weak last-resort heuristic: a bare capitalized "New" after the price,
/// excluding the "New Listing" badge.
pub fn condition_from_after_price(text: &str) -> Option<Condition> {
    let after_price = PRICE_SPLIT
        .split(text)
        .last()
        .unwrap_or_default();
    if NEW_WORD_EXACT.is_match(after_price) && !NEW_LISTING_ANYWHERE.is_match(after_price) {
        Some(Condition::BrandNew)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_page_matches_title_or_content() {
        assert!(is_block_page("Security Measure", ""));
        assert!(is_block_page("", "please solve this captcha to continue"));
        assert!(is_block_page("Pardon Our Interruption", "<html></html>"));
        assert!(!is_block_page("results for widget", "60 items"));
    }

    #[test]
    fn fragment_vocabulary_is_ordered() {
        // "Pre-Owned" wins even though the fragment also contains "new".
        assert_eq!(
            condition_from_fragment("Pre-Owned · Like New"),
            Some(Condition::PreOwned)
        );
        assert_eq!(condition_from_fragment("Brand New"), Some(Condition::BrandNew));
        assert_eq!(condition_from_fragment("Open box"), Some(Condition::OpenBox));
        assert_eq!(condition_from_fragment("for parts"), Some(Condition::ForParts));
        assert_eq!(condition_from_fragment("mint in box"), None);
    }

    #[test]
    fn after_price_heuristic_ignores_new_listing_badge() {
        assert_eq!(
            condition_from_after_price("Widget $12.50 New other details"),
            Some(Condition::BrandNew)
        );
        assert_eq!(condition_from_after_price("Widget $12.50 New Listing"), None);
        // Lowercase "new" is not trusted outside the condition element.
        assert_eq!(condition_from_after_price("Widget $12.50 like new"), None);
    }
}
