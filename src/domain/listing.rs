//! Core domain entity: one normalized sold-item record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Item condition as displayed by the listings site.
///
/// Unmapped free text is preserved in `Other` rather than discarded, so the
/// condition breakdown can still report it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Condition {
    BrandNew,
    PreOwned,
    OpenBox,
    Refurbished,
    ForParts,
    Unknown,
    Other(String),
}

impl Condition {
    /// Normalize a raw condition string against the known vocabulary.
    pub fn normalize(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return Self::Unknown;
        }
        if lower.contains("brand new") || lower == "new" {
            Self::BrandNew
        } else if lower.contains("pre-owned") || lower.contains("pre owned") || lower == "used" {
            Self::PreOwned
        } else if lower.contains("open box") {
            Self::OpenBox
        } else if lower.contains("refurbished") {
            Self::Refurbished
        } else if lower.contains("parts") || lower.contains("not working") {
            Self::ForParts
        } else {
            Self::Other(raw.trim().to_string())
        }
    }

    /// Whether this condition counts as "new" for the new-vs-used split.
    pub fn is_new(&self) -> bool {
        match self {
            Self::BrandNew => true,
            Self::Other(text) => text.to_lowercase().contains("new"),
            _ => false,
        }
    }

    /// Display label, matching the site's vocabulary.
    pub fn label(&self) -> &str {
        match self {
            Self::BrandNew => "Brand New",
            Self::PreOwned => "Pre-Owned",
            Self::OpenBox => "Open Box",
            Self::Refurbished => "Refurbished",
            Self::ForParts => "For Parts",
            Self::Unknown => "Unknown",
            Self::Other(text) => text,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.label().to_string()
    }
}

impl From<String> for Condition {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

/// One sold item extracted from a rendered results page.
///
/// Construction invariant (enforced by the normalizer): `price > 0` and the
/// title is at least 5 characters, truncated to 100. A missing
/// `sold_timestamp` means "age unknown, assume recent" — date filtering must
/// keep such listings, never exclude them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// External item identifier; empty when the detail link is missing.
    pub item_id: String,
    pub title: String,
    pub price: f64,
    /// Raw display string, e.g. "Sold Mar 4, 2024".
    pub sold_date_text: String,
    /// Resolved absolute sale time, when the display string was parseable.
    pub sold_timestamp: Option<DateTime<Utc>>,
    pub condition: Condition,
    pub url: String,
    pub image: String,
}

impl Listing {
    /// True when the sale is known to be older than `cutoff`.
    /// Undated listings are treated as recent.
    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        matches!(self.sold_timestamp, Some(ts) if ts < cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_known_vocabulary() {
        assert_eq!(Condition::normalize("Brand New"), Condition::BrandNew);
        assert_eq!(Condition::normalize("new"), Condition::BrandNew);
        assert_eq!(Condition::normalize("Pre-Owned"), Condition::PreOwned);
        assert_eq!(Condition::normalize("pre owned"), Condition::PreOwned);
        assert_eq!(Condition::normalize("used"), Condition::PreOwned);
        assert_eq!(Condition::normalize("Open Box"), Condition::OpenBox);
        assert_eq!(Condition::normalize("Seller Refurbished"), Condition::Refurbished);
        assert_eq!(Condition::normalize("For Parts or Not Working"), Condition::ForParts);
        assert_eq!(Condition::normalize(""), Condition::Unknown);
    }

    #[test]
    fn unmapped_text_is_preserved() {
        let condition = Condition::normalize("Gently worn");
        assert_eq!(condition, Condition::Other("Gently worn".to_string()));
        assert_eq!(condition.label(), "Gently worn");
    }

    #[test]
    fn is_new_covers_free_text() {
        assert!(Condition::BrandNew.is_new());
        assert!(Condition::Other("New with tags".into()).is_new());
        assert!(!Condition::PreOwned.is_new());
        assert!(!Condition::Unknown.is_new());
    }

    #[test]
    fn condition_serializes_as_display_label() {
        let json = serde_json::to_string(&Condition::PreOwned).unwrap();
        assert_eq!(json, "\"Pre-Owned\"");
        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Condition::PreOwned);
    }
}
