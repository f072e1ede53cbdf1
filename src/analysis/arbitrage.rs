//! Arbitrage detection: buy-low/sell-high spreads inside fuzzy groups.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::{ArbitrageOpportunity, Listing};
use crate::infrastructure::config::AnalysisConfig;

use super::format;
use super::grouping::{fuzzy_groups, group_label, truncate_chars};
use super::stats::percentile;
use super::vocabulary::filter_bulk_lots;

/// Share of members a token must reach to appear in an opportunity label.
const LABEL_TOKEN_SHARE: f64 = 0.6;
const LABEL_TOKEN_LIMIT: usize = 8;
const LABEL_MIN_CHARS: usize = 5;
const LABEL_MAX_CHARS: usize = 60;
/// Groups below this size cannot support a spread signal.
const MIN_GROUP_SIZE: usize = 3;

/// Detect buy-low/sell-high opportunities among date-windowed, bulk-filtered
/// listings.
///
/// A group is admitted only when the 10th→90th percentile spread is at least
/// `min_spread_ratio` of the median, the buy price undercuts the median, and
/// the resulting ROI and absolute profit clear the configured floors.
/// Sorted by descending profit.
pub fn find_opportunities(
    listings: &[&Listing],
    days: u32,
    now: DateTime<Utc>,
    config: &AnalysisConfig,
) -> Vec<ArbitrageOpportunity> {
    let cutoff = now - Duration::days(i64::from(days));
    let recent: Vec<&Listing> = filter_bulk_lots(listings, config.max_single_item_price)
        .into_iter()
        .filter(|l| matches!(l.sold_timestamp, Some(ts) if ts >= cutoff))
        .collect();
    if recent.is_empty() {
        return Vec::new();
    }

    let groups = fuzzy_groups(&recent, config.arbitrage_similarity);
    debug!(candidates = recent.len(), groups = groups.len(), "arbitrage grouping done");

    let mut opportunities: Vec<ArbitrageOpportunity> = groups
        .iter()
        .filter_map(|indices| {
            let members: Vec<&Listing> = indices.iter().map(|i| recent[*i]).collect();
            evaluate_group(&members, days, config)
        })
        .collect();

    opportunities.sort_by(|a, b| {
        let pa: f64 = a.profit.parse().unwrap_or(0.0);
        let pb: f64 = b.profit.parse().unwrap_or(0.0);
        pb.total_cmp(&pa)
    });
    opportunities
}

fn evaluate_group(
    members: &[&Listing],
    days: u32,
    config: &AnalysisConfig,
) -> Option<ArbitrageOpportunity> {
    if members.len() < MIN_GROUP_SIZE {
        return None;
    }
    let mut prices: Vec<f64> = members.iter().map(|l| l.price).filter(|p| *p > 0.0).collect();
    if prices.len() < MIN_GROUP_SIZE {
        return None;
    }
    prices.sort_by(f64::total_cmp);

    let median = prices[prices.len() / 2];
    let p10 = percentile(&prices, 10.0);
    let p90 = percentile(&prices, 90.0);
    let spread_ratio = (p90 - p10) / median;
    if spread_ratio < config.min_spread_ratio {
        return None;
    }

    let buy_under = p10;
    let sell_at = median;
    if buy_under >= sell_at {
        return None;
    }
    let profit = sell_at - buy_under;
    let roi = profit / buy_under * 100.0;
    if roi < config.min_roi_pct || profit < config.min_profit {
        return None;
    }

    let mut label = group_label(members, LABEL_TOKEN_SHARE, LABEL_TOKEN_LIMIT);
    if label.chars().count() < LABEL_MIN_CHARS {
        label = truncate_chars(&members[0].title, 40);
    }

    let mut by_price: Vec<&&Listing> = members.iter().filter(|l| !l.url.is_empty()).collect();
    by_price.sort_by(|a, b| a.price.total_cmp(&b.price));

    Some(ArbitrageOpportunity {
        item: truncate_chars(&label, LABEL_MAX_CHARS),
        sales_count: members.len(),
        per_day: format::money(members.len() as f64 / f64::from(days)),
        buy_under: format::money(buy_under),
        sell_at: format::money(sell_at),
        profit: format::money(profit),
        roi: format::percent0(roi),
        spread_pct: format::percent0(spread_ratio * 100.0),
        low_price_url: by_price.first().map(|l| l.url.clone()).unwrap_or_default(),
        high_price_url: by_price.last().map(|l| l.url.clone()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Condition;
    use chrono::TimeZone;

    fn listing(title: &str, price: f64, sold: DateTime<Utc>) -> Listing {
        Listing {
            item_id: String::new(),
            title: title.to_string(),
            price,
            sold_date_text: String::new(),
            sold_timestamp: Some(sold),
            condition: Condition::Unknown,
            url: format!("https://www.example.com/itm/{price}"),
            image: String::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
    }

    fn widgets(prices: &[f64]) -> Vec<Listing> {
        prices
            .iter()
            .map(|p| listing("Acme Widget Pro 3000 controller", *p, now() - Duration::days(1)))
            .collect()
    }

    #[test]
    fn wide_spread_group_is_admitted() {
        let owned = widgets(&[40.0, 95.0, 100.0, 105.0, 160.0]);
        let refs: Vec<&Listing> = owned.iter().collect();
        let opportunities = find_opportunities(&refs, 7, now(), &AnalysisConfig::default());
        assert_eq!(opportunities.len(), 1);

        let opp = &opportunities[0];
        assert_eq!(opp.buy_under, "40.00");
        assert_eq!(opp.sell_at, "100.00");
        assert_eq!(opp.profit, "60.00");
        assert_eq!(opp.roi, "150%");
        assert_eq!(opp.sales_count, 5);
        // Cheapest listing's URL is the buy link.
        assert!(opp.low_price_url.ends_with("/40"));
        assert!(opp.high_price_url.ends_with("/160"));
    }

    #[test]
    fn admission_gates_hold_for_every_opportunity() {
        let owned = widgets(&[40.0, 95.0, 100.0, 105.0, 160.0]);
        let refs: Vec<&Listing> = owned.iter().collect();
        for opp in find_opportunities(&refs, 7, now(), &AnalysisConfig::default()) {
            let roi: f64 = opp.roi.trim_end_matches('%').parse().unwrap();
            let profit: f64 = opp.profit.parse().unwrap();
            let spread: f64 = opp.spread_pct.trim_end_matches('%').parse().unwrap();
            assert!(roi >= 15.0);
            assert!(profit >= 10.0);
            assert!(spread >= 20.0);
        }
    }

    #[test]
    fn narrow_spread_is_rejected() {
        let owned = widgets(&[98.0, 99.0, 100.0, 101.0, 102.0]);
        let refs: Vec<&Listing> = owned.iter().collect();
        assert!(find_opportunities(&refs, 7, now(), &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn tiny_groups_are_rejected() {
        let owned = widgets(&[40.0, 160.0]);
        let refs: Vec<&Listing> = owned.iter().collect();
        assert!(find_opportunities(&refs, 7, now(), &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn out_of_window_listings_are_ignored() {
        let mut owned = widgets(&[40.0, 95.0]);
        owned.push(listing(
            "Acme Widget Pro 3000 controller",
            160.0,
            now() - Duration::days(30),
        ));
        let refs: Vec<&Listing> = owned.iter().collect();
        assert!(find_opportunities(&refs, 7, now(), &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn bulk_lots_are_excluded() {
        let mut owned = widgets(&[40.0, 95.0, 100.0, 105.0]);
        owned.push(listing(
            "Lot of 10 Acme Widget Pro 3000 controller",
            160.0,
            now() - Duration::days(1),
        ));
        let refs: Vec<&Listing> = owned.iter().collect();
        let opportunities = find_opportunities(&refs, 7, now(), &AnalysisConfig::default());
        assert!(opportunities.iter().all(|o| o.sales_count == 4));
    }
}
