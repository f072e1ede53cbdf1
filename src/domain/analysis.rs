//! Report types that make up an [`AnalysisResult`].
//!
//! These mirror the wire contract consumed by downstream storage and
//! presentation layers: integer counts stay numeric, every other statistic is
//! a fixed-precision decimal string, and ratio fields carry a `%` or `x`
//! suffix. The result is an immutable snapshot — re-derivable from the
//! listing set and parameters.

use serde::{Deserialize, Serialize};

use super::listing::Listing;

/// Run metadata attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMeta {
    pub search_term: String,
    pub target_days: u32,
    /// RFC 3339 timestamp of when the analysis snapshot was taken.
    pub fetched_at: String,
    pub total_listings: usize,
}

/// Price statistics over the outlier-trimmed sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
    /// Sample size after outlier trimming.
    pub count: usize,
    /// Number of samples removed by the 1.5×IQR rule.
    pub outliers: usize,
    pub min: String,
    pub max: String,
    pub mean: String,
    pub median: String,
    pub stdev: String,
}

/// One calendar day of sales inside the target window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    /// `YYYY-MM-DD` (UTC).
    pub date: String,
    pub sold: usize,
    pub revenue: String,
}

/// Time-bucketed sales velocity over the target window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VelocityReport {
    pub total_sales: usize,
    pub total_revenue: String,
    /// Sales per day over the *requested* window length, not observed days.
    pub avg_per_day: String,
    pub revenue_per_day: String,
    pub peak_day: String,
    pub peak_day_sales: usize,
    pub weekend_sales: usize,
    pub weekday_sales: usize,
    pub daily_breakdown: Vec<DailySales>,
}

/// Sales aggregated per normalized condition label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionBreakdown {
    pub condition: String,
    pub sold: usize,
    pub revenue: String,
    pub avg_price: String,
}

/// New-vs-used percentage split (integer-rounded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVsUsedSplit {
    pub new_pct: u32,
    pub used_pct: u32,
    pub new_count: usize,
    pub used_count: usize,
}

/// One non-empty fixed price range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBucket {
    pub range: String,
    pub count: usize,
    pub pct: String,
    pub revenue: String,
    pub avg_price: String,
}

/// A contiguous n-token title sequence with its sales aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgramEntry {
    pub term: String,
    pub sold: usize,
    pub avg_price: String,
    pub revenue: String,
}

/// A product group whose recent velocity or price is accelerating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotItem {
    pub item: String,
    pub total_sales: usize,
    pub recent_sales: usize,
    pub per_day: String,
    pub avg_price: String,
    pub recent_avg: String,
    /// Recent velocity over overall velocity, e.g. `"1.40x"`.
    pub velocity_trend: String,
    /// Recent price change relative to overall average, e.g. `"12%"`.
    pub price_trend: String,
    pub signal: String,
    pub sample_url: String,
}

/// Sales aggregated per matched brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandPerformance {
    pub brand: String,
    pub sold: usize,
    pub revenue: String,
    pub avg_price: String,
    pub min_price: String,
    pub max_price: String,
}

/// A buy-low/sell-high signal derived from one fuzzy group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrageOpportunity {
    pub item: String,
    pub sales_count: usize,
    pub per_day: String,
    /// Buy threshold: the group's 10th-percentile price.
    pub buy_under: String,
    /// Target sell price: the group's median.
    pub sell_at: String,
    pub profit: String,
    pub roi: String,
    pub spread_pct: String,
    pub low_price_url: String,
    pub high_price_url: String,
}

/// Aggregates for one cluster of closely related listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub group: String,
    pub sold: usize,
    pub last_24h: usize,
    pub avg_price: String,
    pub median_price: String,
    pub min_price: String,
    pub max_price: String,
    pub price_spread: String,
    pub min_price_url: String,
    pub max_price_url: String,
}

/// `stats` section of the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSection {
    pub price: Option<PriceStats>,
    pub velocity: Option<VelocityReport>,
    pub conditions: Vec<ConditionBreakdown>,
    pub new_vs_used: NewVsUsedSplit,
    pub price_buckets: Option<Vec<PriceBucket>>,
}

/// `trends` section of the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsSection {
    /// Bigrams; the most useful keyword unit, kept under the legacy name.
    pub ngrams: Vec<NgramEntry>,
    pub ngrams3: Vec<NgramEntry>,
    pub ngrams4: Vec<NgramEntry>,
    pub ngrams5: Vec<NgramEntry>,
    pub ngrams6: Vec<NgramEntry>,
    pub hot_items: Vec<HotItem>,
    pub brands: Vec<BrandPerformance>,
}

/// `opportunities` section of the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitiesSection {
    pub arbitrage: Vec<ArbitrageOpportunity>,
    /// Arbitrage re-run over the bulk-filtered single-item set.
    pub flips: Vec<ArbitrageOpportunity>,
    pub groups: Vec<GroupSummary>,
}

/// The engine's sole externally visible output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub meta: ResultMeta,
    pub stats: StatsSection,
    pub trends: TrendsSection,
    pub opportunities: OpportunitiesSection,
    pub listings: Vec<Listing>,
}
