//! Listing normalizer: rendered result cards → typed [`Listing`]s.
//!
//! Extraction is a pure transformation of the rendered HTML. A card that
//! cannot be normalized is silently skipped — the page-level caller only
//! observes "zero items" and decides whether that means end-of-results or a
//! block interstitial.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};
use tracing::trace;

use crate::domain::{Condition, Listing};

use super::date_parser::parse_sold_date;
use super::vocabulary as vocab;

const TITLE_MAX_CHARS: usize = 100;
const TITLE_MIN_CHARS: usize = 5;

/// Extract every sold-item card from a rendered results page.
pub fn extract_listings(html: &str, now: DateTime<Utc>) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let listings: Vec<Listing> = document
        .select(&vocab::CARD_SELECTOR)
        .filter_map(|card| normalize_card(card, now))
        .collect();
    trace!(count = listings.len(), "extracted listings from page");
    listings
}

/// Normalize one card sub-tree into a listing, or `None` when any required
/// field is missing or malformed.
pub fn normalize_card(card: ElementRef<'_>, now: DateTime<Utc>) -> Option<Listing> {
    let text: String = card.text().collect();

    if text.contains(vocab::PLACEHOLDER_TEXT) || !vocab::SOLD_MARKER.is_match(&text) {
        return None;
    }

    let sold_date_text = extract_sold_phrase(&text);
    let title = extract_title(&text)?;
    let price = extract_price(&text)?;
    let condition = extract_condition(card, &text);
    let (item_id, url) = extract_item_link(card);
    let image = extract_image(card);
    let sold_timestamp = parse_sold_date(&sold_date_text, now);

    Some(Listing {
        item_id,
        title,
        price,
        sold_date_text,
        sold_timestamp,
        condition,
        url,
        image,
    })
}

/// Sold-date phrase: month-anchored primary pattern, then the looser
/// full-date fallback. Empty when neither matches.
fn extract_sold_phrase(text: &str) -> String {
    if let Some(caps) = vocab::SOLD_DATE_PRIMARY.captures(text) {
        return format!("Sold {}", &caps[1]);
    }
    if let Some(caps) = vocab::SOLD_DATE_LOOSE.captures(text) {
        return format!("Sold {}", &caps[1]);
    }
    String::new()
}

/// Title is the text strictly between the sold-date phrase and the trailing
/// "Opens in a new" marker, with rendering artifacts stripped.
fn extract_title(text: &str) -> Option<String> {
    let caps = vocab::TITLE_BETWEEN.captures(text)?;
    let raw = caps.get(1)?.as_str();
    let stripped = vocab::TITLE_YEAR_ARTIFACT.replace(raw, "");
    let stripped = vocab::TITLE_LEADING_JUNK.replace(&stripped, "");
    let stripped = vocab::TITLE_NEW_LISTING.replace(&stripped, "");
    let title = stripped.trim();

    if title.chars().count() < TITLE_MIN_CHARS {
        return None;
    }
    Some(truncate_chars(title, TITLE_MAX_CHARS))
}

/// First dollar amount in the card text, comma-stripped. Non-positive or
/// missing prices disqualify the card.
fn extract_price(text: &str) -> Option<f64> {
    let caps = vocab::PRICE.captures(text)?;
    let price: f64 = caps[1].replace(',', "").parse().ok()?;
    (price > 0.0).then_some(price)
}

/// Condition resolution ladder: dedicated sub-element, then whole-text scan,
/// then the weak bare-"New"-after-price heuristic.
fn extract_condition(card: ElementRef<'_>, text: &str) -> Condition {
    if let Some(element) = card.select(&vocab::CONDITION_SELECTOR).next() {
        let fragment: String = element.text().collect();
        if let Some(condition) = vocab::condition_from_fragment(&fragment) {
            return condition;
        }
    }
    vocab::condition_from_full_text(text)
        .or_else(|| vocab::condition_from_after_price(text))
        .unwrap_or(Condition::Unknown)
}

/// Detail link and the numeric item identifier embedded in it.
fn extract_item_link(card: ElementRef<'_>) -> (String, String) {
    let Some(href) = card
        .select(&vocab::ITEM_LINK_SELECTOR)
        .next()
        .and_then(|link| link.value().attr("href"))
    else {
        return (String::new(), String::new());
    };
    let item_id = vocab::ITEM_ID
        .captures(href)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();
    (item_id, href.to_string())
}

/// Image reference: lazy-load attributes beat the eager `src`, and
/// thumbnail-size suffixes are upgraded to a 500px rendition.
fn extract_image(card: ElementRef<'_>) -> String {
    let Some(element) = card.select(&vocab::IMAGE_SELECTOR).next() else {
        return String::new();
    };
    let value = vocab::IMAGE_LAZY_ATTRS
        .iter()
        .find_map(|attr| element.value().attr(attr))
        .or_else(|| element.value().attr("src"))
        .unwrap_or_default();

    if value.is_empty() || value.starts_with("data:") {
        return value.to_string();
    }
    let upgraded = vocab::THUMB_WEBP.replace(value, "s-l500.webp");
    vocab::THUMB_JPG.replace(&upgraded, "s-l500.jpg").into_owned()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
