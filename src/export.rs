//! Report export: CSV tables for spreadsheets and a full JSON snapshot.
//!
//! Pure string renderers plus one async save helper. The engine itself never
//! persists anything; export is strictly opt-in for embedding applications.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::fs;
use tracing::info;

use crate::domain::{AnalysisResult, GroupSummary, Listing, NgramEntry};

/// Quote a CSV field when it contains a separator, quote, or newline.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(headers: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut lines = vec![headers.join(",")];
    for row in rows {
        lines.push(
            row.iter()
                .map(|field| escape_csv(field))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// Raw listings table.
pub fn listings_csv(listings: &[Listing]) -> String {
    render_csv(
        &["title", "price", "date", "condition", "link", "image"],
        listings.iter().map(|l| {
            vec![
                l.title.clone(),
                format!("{:.2}", l.price),
                l.sold_date_text.clone(),
                l.condition.label().to_string(),
                l.url.clone(),
                l.image.clone(),
            ]
        }),
    )
}

/// Market cheat sheet: one row per product group.
pub fn groups_csv(groups: &[GroupSummary]) -> String {
    render_csv(
        &[
            "group",
            "sold",
            "avgPrice",
            "medianPrice",
            "minPrice",
            "maxPrice",
            "priceSpread",
            "last24h",
            "sampleUrl",
        ],
        groups.iter().map(|g| {
            vec![
                g.group.clone(),
                g.sold.to_string(),
                g.avg_price.clone(),
                g.median_price.clone(),
                g.min_price.clone(),
                g.max_price.clone(),
                g.price_spread.clone(),
                g.last_24h.to_string(),
                g.min_price_url.clone(),
            ]
        }),
    )
}

/// Keyword table for one n-gram size.
pub fn ngrams_csv(ngrams: &[NgramEntry]) -> String {
    render_csv(
        &["term", "sold", "avgPrice", "revenue"],
        ngrams.iter().map(|n| {
            vec![
                n.term.clone(),
                n.sold.to_string(),
                n.avg_price.clone(),
                n.revenue.clone(),
            ]
        }),
    )
}

/// Full result snapshot, pretty-printed.
pub fn report_json(result: &AnalysisResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize analysis result")
}

/// Filesystem-safe `<term>-<timestamp>` stem for one report set.
pub fn file_slug(search_term: &str, now: DateTime<Utc>) -> String {
    let term: String = search_term
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let timestamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{term}-{timestamp}")
}

/// Write the JSON snapshot and the non-empty CSV tables into `dir`.
/// Returns the created paths.
pub async fn save_report(
    dir: &Path,
    result: &AnalysisResult,
    now: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let slug = file_slug(&result.meta.search_term, now);
    let mut written = Vec::new();

    let json_path = dir.join(format!("{slug}.json"));
    fs::write(&json_path, report_json(result)?)
        .await
        .with_context(|| format!("failed to write {}", json_path.display()))?;
    written.push(json_path);

    if !result.listings.is_empty() {
        let path = dir.join(format!("{slug}-listings.csv"));
        fs::write(&path, listings_csv(&result.listings)).await?;
        written.push(path);
    }
    if !result.opportunities.groups.is_empty() {
        let path = dir.join(format!("{slug}-groups.csv"));
        fs::write(&path, groups_csv(&result.opportunities.groups)).await?;
        written.push(path);
    }
    if !result.trends.ngrams.is_empty() {
        let path = dir.join(format!("{slug}-ngrams.csv"));
        fs::write(&path, ngrams_csv(&result.trends.ngrams)).await?;
        written.push(path);
    }

    info!(files = written.len(), dir = %dir.display(), "report saved");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Condition;
    use chrono::TimeZone;

    #[test]
    fn fields_with_separators_are_quoted() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn listings_csv_has_header_and_rows() {
        let listings = vec![Listing {
            item_id: "1".to_string(),
            title: "Widget, deluxe".to_string(),
            price: 12.5,
            sold_date_text: "Sold Mar 4".to_string(),
            sold_timestamp: None,
            condition: Condition::BrandNew,
            url: "https://example.com/itm/1".to_string(),
            image: String::new(),
        }];
        let csv = listings_csv(&listings);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("title,price,date,condition,link,image"));
        assert_eq!(
            lines.next(),
            Some("\"Widget, deluxe\",12.50,Sold Mar 4,Brand New,https://example.com/itm/1,")
        );
    }

    #[test]
    fn slug_is_filesystem_safe() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();
        let slug = file_slug("widget pro / max", now);
        assert!(slug.starts_with("widget_pro___max-2024-03-15T10-30-00"));
        assert!(!slug.contains(':'));
        assert!(!slug.contains('/'));
    }
}
