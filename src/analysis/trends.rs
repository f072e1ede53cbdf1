//! Trend detection: accelerating product groups and brand performance.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{BrandPerformance, HotItem, Listing};
use crate::infrastructure::config::AnalysisConfig;

use super::format;
use super::grouping::{key_groups, truncate_chars};
use super::vocabulary::{brand_key, BRAND_PATTERNS};

const HOT_ITEM_MIN_SALES: usize = 3;
const HOT_LABEL_MAX_CHARS: usize = 50;
/// Brands with a single sale are noise, not a trend.
const BRAND_MIN_SALES: usize = 2;

/// Flag product groups whose recent velocity or price is accelerating.
///
/// Each key group is split into "all" and "second half of the window"
/// members; a group is hot when recent velocity exceeds the configured
/// multiple of overall velocity, or recent average price exceeds the
/// configured multiple of the overall average. Sorted by total sales.
pub fn hot_items(
    listings: &[&Listing],
    days_window: u32,
    now: DateTime<Utc>,
    config: &AnalysisConfig,
) -> Vec<HotItem> {
    let half_window = Duration::seconds((f64::from(days_window) / 2.0 * 86_400.0) as i64);
    let recent_cutoff = now - half_window;

    let mut items: Vec<HotItem> = key_groups(listings)
        .into_iter()
        .filter_map(|(key, indices)| {
            let all: Vec<&Listing> = indices.iter().map(|i| listings[*i]).collect();
            if all.len() < HOT_ITEM_MIN_SALES {
                return None;
            }
            let recent: Vec<&Listing> = all
                .iter()
                .copied()
                .filter(|l| matches!(l.sold_timestamp, Some(ts) if ts >= recent_cutoff))
                .collect();

            let all_prices: Vec<f64> = all.iter().map(|l| l.price).filter(|p| *p > 0.0).collect();
            if all_prices.is_empty() {
                return None;
            }
            let recent_prices: Vec<f64> =
                recent.iter().map(|l| l.price).filter(|p| *p > 0.0).collect();

            let avg_all = all_prices.iter().sum::<f64>() / all_prices.len() as f64;
            let avg_recent = if recent_prices.is_empty() {
                avg_all
            } else {
                recent_prices.iter().sum::<f64>() / recent_prices.len() as f64
            };

            let velocity = all.len() as f64 / f64::from(days_window);
            let recent_velocity = recent.len() as f64 / (f64::from(days_window) / 2.0);
            let velocity_trend = recent_velocity / if velocity > 0.0 { velocity } else { 1.0 };
            let price_trend = avg_recent / avg_all;

            if velocity_trend <= config.hot_velocity_ratio && price_trend <= config.hot_price_ratio
            {
                return None;
            }

            let sample_url = recent
                .first()
                .or_else(|| all.first())
                .map(|l| l.url.clone())
                .unwrap_or_default();

            Some(HotItem {
                item: truncate_chars(&key, HOT_LABEL_MAX_CHARS),
                total_sales: all.len(),
                recent_sales: recent.len(),
                per_day: format::money(velocity),
                avg_price: format::money(avg_all),
                recent_avg: format::money(avg_recent),
                velocity_trend: format::ratio(velocity_trend),
                price_trend: format::percent0((price_trend - 1.0) * 100.0),
                signal: signal_tag(velocity_trend),
                sample_url,
            })
        })
        .collect();

    items.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));
    items
}

fn signal_tag(velocity_trend: f64) -> String {
    if velocity_trend > 1.5 {
        "🔥🔥".to_string()
    } else if velocity_trend > 1.2 {
        "🔥".to_string()
    } else {
        "📈".to_string()
    }
}

/// Aggregate sales per brand from the curated vocabulary; the first matching
/// pattern wins per listing. Brands with fewer than two sales are dropped.
pub fn brand_performance(listings: &[&Listing]) -> Vec<BrandPerformance> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: std::collections::HashMap<String, (usize, f64, Vec<f64>)> =
        std::collections::HashMap::new();

    for listing in listings {
        let title = listing.title.to_lowercase();
        let Some(matched) = BRAND_PATTERNS
            .iter()
            .find_map(|pattern| pattern.captures(&title))
            .map(|caps| brand_key(&caps[1]))
        else {
            continue;
        };

        if !totals.contains_key(&matched) {
            order.push(matched.clone());
        }
        let entry = totals.entry(matched).or_insert((0, 0.0, Vec::new()));
        entry.0 += 1;
        if listing.price > 0.0 {
            entry.1 += listing.price;
            entry.2.push(listing.price);
        }
    }

    let mut rows: Vec<BrandPerformance> = order
        .into_iter()
        .filter_map(|brand| {
            let (sold, revenue, prices) = &totals[&brand];
            if *sold < BRAND_MIN_SALES {
                return None;
            }
            let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
            let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Some(BrandPerformance {
                brand: capitalize(&brand),
                sold: *sold,
                revenue: format::money(*revenue),
                avg_price: if *sold > 0 {
                    format::money(revenue / *sold as f64)
                } else {
                    "0".to_string()
                },
                min_price: if prices.is_empty() { "0".to_string() } else { format::money(min) },
                max_price: if prices.is_empty() { "0".to_string() } else { format::money(max) },
            })
        })
        .collect();
    rows.sort_by(|a, b| b.sold.cmp(&a.sold));
    rows
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Condition;
    use chrono::TimeZone;

    fn listing(title: &str, price: f64, sold: Option<DateTime<Utc>>) -> Listing {
        Listing {
            item_id: String::new(),
            title: title.to_string(),
            price,
            sold_date_text: String::new(),
            sold_timestamp: sold,
            condition: Condition::Unknown,
            url: "https://www.example.com/itm/1".to_string(),
            image: String::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn accelerating_group_is_flagged_hot() {
        // 4 sales, 3 of them in the second half of an 8-day window:
        // velocity 0.5/day, recent velocity 0.75/day → 1.5x.
        let owned = vec![
            listing("Acme Widget Pro", 100.0, Some(now() - Duration::days(7))),
            listing("Acme Widget Pro", 100.0, Some(now() - Duration::days(3))),
            listing("Acme Widget Pro", 100.0, Some(now() - Duration::days(2))),
            listing("Acme Widget Pro", 100.0, Some(now() - Duration::days(1))),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        let hot = hot_items(&refs, 8, now(), &AnalysisConfig::default());
        assert_eq!(hot.len(), 1);
        assert_eq!(hot[0].total_sales, 4);
        assert_eq!(hot[0].recent_sales, 3);
        assert_eq!(hot[0].velocity_trend, "1.50x");
        assert_eq!(hot[0].signal, "🔥");
    }

    #[test]
    fn steady_group_is_not_hot() {
        // Uniform cadence and flat prices: neither trigger fires.
        let owned = vec![
            listing("Acme Widget Pro", 100.0, Some(now() - Duration::days(7))),
            listing("Acme Widget Pro", 100.0, Some(now() - Duration::days(5))),
            listing("Acme Widget Pro", 100.0, Some(now() - Duration::days(3))),
            listing("Acme Widget Pro", 100.0, Some(now() - Duration::days(1))),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        assert!(hot_items(&refs, 8, now(), &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn rising_price_alone_can_flag_hot() {
        let owned = vec![
            listing("Acme Widget Pro", 80.0, Some(now() - Duration::days(7))),
            listing("Acme Widget Pro", 80.0, Some(now() - Duration::days(6))),
            listing("Acme Widget Pro", 80.0, Some(now() - Duration::days(5))),
            listing("Acme Widget Pro", 120.0, Some(now() - Duration::days(1))),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        let hot = hot_items(&refs, 8, now(), &AnalysisConfig::default());
        assert_eq!(hot.len(), 1);
        // One recent sale in 4 days vs 0.5/day overall keeps velocity flat;
        // the price jump (120 vs avg 90) is the trigger.
        assert_eq!(hot[0].signal, "📈");
        assert_eq!(hot[0].price_trend, "33%");
    }

    #[test]
    fn small_groups_are_ignored() {
        let owned = vec![
            listing("Acme Widget Pro", 100.0, Some(now() - Duration::days(1))),
            listing("Acme Widget Pro", 100.0, Some(now() - Duration::days(1))),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        assert!(hot_items(&refs, 8, now(), &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn brands_require_two_sales() {
        let owned = vec![
            listing("Nike Air Max 90", 80.0, None),
            listing("Nike Dunk Low", 95.0, None),
            listing("Patagonia fleece jacket", 60.0, None),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        let brands = brand_performance(&refs);
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].brand, "Nike");
        assert_eq!(brands[0].sold, 2);
        assert_eq!(brands[0].min_price, "80.00");
        assert_eq!(brands[0].max_price, "95.00");
        assert_eq!(brands[0].avg_price, "87.50");
    }

    #[test]
    fn first_pattern_wins_per_listing() {
        let owned = vec![
            listing("Nike x PlayStation collab", 200.0, None),
            listing("Nike court vision", 50.0, None),
        ];
        let refs: Vec<&Listing> = owned.iter().collect();
        let brands = brand_performance(&refs);
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].brand, "Nike");
    }
}
