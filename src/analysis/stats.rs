//! Price, velocity, distribution, and condition statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use statrs::statistics::Statistics;

use crate::domain::{
    ConditionBreakdown, DailySales, Listing, NewVsUsedSplit, PriceBucket, PriceStats,
    VelocityReport,
};

use super::format;

/// Minimum sample size before the IQR outlier trim is applied.
const OUTLIER_TRIM_MIN_SAMPLES: usize = 10;
/// Minimum sample size for the price-distribution buckets.
const BUCKET_MIN_SAMPLES: usize = 5;

/// Nearest-rank percentile over an ascending-sorted slice.
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((p / 100.0) * sorted.len() as f64).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Price statistics over the sample, outlier-trimmed by the 1.5×IQR rule
/// when more than [`OUTLIER_TRIM_MIN_SAMPLES`] prices are present.
pub fn price_stats(listings: &[&Listing]) -> Option<PriceStats> {
    let mut prices: Vec<f64> = listings.iter().map(|l| l.price).filter(|p| *p > 0.0).collect();
    if prices.is_empty() {
        return None;
    }
    prices.sort_by(f64::total_cmp);

    let mut outliers = 0;
    if prices.len() > OUTLIER_TRIM_MIN_SAMPLES {
        let q1 = prices[(prices.len() as f64 * 0.25).floor() as usize];
        let q3 = prices[(prices.len() as f64 * 0.75).floor() as usize];
        let iqr = q3 - q1;
        let (low, high) = (q1 - iqr * 1.5, q3 + iqr * 1.5);
        let trimmed: Vec<f64> = prices.iter().copied().filter(|p| *p >= low && *p <= high).collect();
        outliers = prices.len() - trimmed.len();
        prices = trimmed;
    }
    if prices.is_empty() {
        return None;
    }

    let mean = prices.clone().mean();
    let stdev = prices.clone().population_std_dev();
    Some(PriceStats {
        count: prices.len(),
        outliers,
        min: format::money(prices[0]),
        max: format::money(prices[prices.len() - 1]),
        mean: format::money(mean),
        median: format::money(prices[prices.len() / 2]),
        stdev: format::money(stdev),
    })
}

/// Calendar-day sales velocity within the target window.
///
/// Per-day averages divide by the *requested* window length, not the number
/// of observed days, so sparse data reads as slow, not dense.
pub fn velocity(listings: &[&Listing], days_window: u32, now: DateTime<Utc>) -> Option<VelocityReport> {
    let cutoff = now - Duration::days(i64::from(days_window));
    let valid: Vec<&Listing> = listings
        .iter()
        .copied()
        .filter(|l| matches!(l.sold_timestamp, Some(ts) if ts >= cutoff))
        .collect();
    if valid.is_empty() {
        return None;
    }

    let mut by_day: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for listing in &valid {
        let Some(ts) = listing.sold_timestamp else {
            continue;
        };
        let entry = by_day.entry(ts.date_naive()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += listing.price;
    }

    let total_sales = valid.len();
    let total_revenue: f64 = valid.iter().map(|l| l.price).sum();

    let mut peak_day: Option<NaiveDate> = None;
    let mut peak_day_sales = 0;
    let mut weekend_sales = 0;
    let mut weekday_sales = 0;
    for (day, (sold, _)) in &by_day {
        if *sold > peak_day_sales {
            peak_day = Some(*day);
            peak_day_sales = *sold;
        }
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            weekend_sales += sold;
        } else {
            weekday_sales += sold;
        }
    }

    Some(VelocityReport {
        total_sales,
        total_revenue: format::money(total_revenue),
        avg_per_day: format::decimal1(total_sales as f64 / f64::from(days_window)),
        revenue_per_day: format::money(total_revenue / f64::from(days_window)),
        peak_day: peak_day
            .map(|day| day.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        peak_day_sales,
        weekend_sales,
        weekday_sales,
        daily_breakdown: by_day
            .iter()
            .map(|(day, (sold, revenue))| DailySales {
                date: day.format("%Y-%m-%d").to_string(),
                sold: *sold,
                revenue: format::money(*revenue),
            })
            .collect(),
    })
}

const BUCKET_RANGES: [(&str, f64, f64); 6] = [
    ("$0-25", 0.0, 25.0),
    ("$25-50", 25.0, 50.0),
    ("$50-100", 50.0, 100.0),
    ("$100-200", 100.0, 200.0),
    ("$200-500", 200.0, 500.0),
    ("$500+", 500.0, f64::INFINITY),
];

/// Fixed price-range distribution; `None` below [`BUCKET_MIN_SAMPLES`]
/// prices, empty buckets dropped.
pub fn price_distribution(listings: &[&Listing]) -> Option<Vec<PriceBucket>> {
    let prices: Vec<f64> = listings.iter().map(|l| l.price).filter(|p| *p > 0.0).collect();
    if prices.len() < BUCKET_MIN_SAMPLES {
        return None;
    }

    let buckets = BUCKET_RANGES
        .iter()
        .filter_map(|(label, min, max)| {
            let in_bucket: Vec<f64> = prices
                .iter()
                .copied()
                .filter(|p| *p >= *min && *p < *max)
                .collect();
            if in_bucket.is_empty() {
                return None;
            }
            let revenue: f64 = in_bucket.iter().sum();
            Some(PriceBucket {
                range: (*label).to_string(),
                count: in_bucket.len(),
                pct: format::percent1(in_bucket.len() as f64 / prices.len() as f64 * 100.0),
                revenue: format::money(revenue),
                avg_price: format::money(revenue / in_bucket.len() as f64),
            })
        })
        .collect();
    Some(buckets)
}

/// Sales per normalized condition label, busiest first.
pub fn condition_breakdown(listings: &[&Listing]) -> Vec<ConditionBreakdown> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: std::collections::HashMap<String, (usize, f64)> =
        std::collections::HashMap::new();
    for listing in listings {
        let label = listing.condition.label().to_string();
        if !totals.contains_key(&label) {
            order.push(label.clone());
        }
        let entry = totals.entry(label).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += listing.price;
    }

    let mut rows: Vec<ConditionBreakdown> = order
        .into_iter()
        .map(|label| {
            let (sold, revenue) = totals[&label];
            ConditionBreakdown {
                condition: label,
                sold,
                revenue: format::money(revenue),
                avg_price: if sold > 0 {
                    format::money(revenue / sold as f64)
                } else {
                    "0".to_string()
                },
            }
        })
        .collect();
    rows.sort_by(|a, b| b.sold.cmp(&a.sold));
    rows
}

/// New-vs-used split: "new" is any condition label containing "new".
pub fn new_vs_used(conditions: &[ConditionBreakdown]) -> NewVsUsedSplit {
    let total: usize = conditions.iter().map(|c| c.sold).sum();
    let new_count: usize = conditions
        .iter()
        .filter(|c| c.condition.to_lowercase().contains("new"))
        .map(|c| c.sold)
        .sum();
    let used_count = total - new_count;

    let (new_pct, used_pct) = if total > 0 {
        (
            (new_count as f64 / total as f64 * 100.0).round() as u32,
            (used_count as f64 / total as f64 * 100.0).round() as u32,
        )
    } else {
        (0, 0)
    };
    NewVsUsedSplit {
        new_pct,
        used_pct,
        new_count,
        used_count,
    }
}
