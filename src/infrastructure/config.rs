//! Configuration for the crawl controller and the analysis pipeline.
//!
//! All pacing, retry, and threshold knobs live in immutable values passed in
//! at construction. Nothing reads module-level globals, so tests can tighten
//! or disable pacing freely.

use serde::{Deserialize, Serialize};

/// Crawl controller configuration: pacing, budgets, and session hygiene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Site root; also the warm-up navigation target.
    pub base_url: String,
    /// Search results path under the site root.
    pub search_path: String,
    /// Randomized inter-page delay bounds (sequential mode).
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    /// Hard ceiling on pages per session.
    pub max_pages: u32,
    /// Date window applied when the caller does not specify one.
    pub default_days: u32,
    /// Per-navigation timeout. A timed-out navigation is not fatal —
    /// extraction runs against whatever content loaded.
    pub navigation_timeout_secs: u64,
    /// Accumulation ceiling; the session stops once reached.
    pub max_listings: usize,
    /// Empty-page retries before treating the page as end-of-results.
    pub empty_page_retry_budget: u32,
    /// Consecutive unexpected page errors tolerated before stopping.
    pub max_consecutive_errors: u32,
    /// Recycle the rendering session every N pages (bounds renderer memory).
    pub session_recycle_pages: u32,
    /// Insert an extra pause every N pages (dampens rate-based blocking).
    pub safety_pause_pages: u32,
    pub safety_pause_min_ms: u64,
    pub safety_pause_extra_ms: u64,
    /// Cooldown after a detected block interstitial.
    pub block_cooldown_secs: u64,
    /// Cooldown after a plain empty page.
    pub empty_cooldown_secs: u64,
    /// Wait after auto-scroll for lazy content to finish rendering.
    pub settle_after_scroll_ms: u64,
    /// Wait after the warm-up navigation.
    pub warmup_settle_ms: u64,
    /// Warm-up navigation timeout (failures are ignored).
    pub warmup_timeout_secs: u64,
    /// Interval of the best-effort partial-result progress reports.
    pub progress_interval_secs: u64,
    /// Worker count for the bounded-concurrency mode.
    pub concurrent_workers: u32,
    /// Per-worker random start stagger upper bound.
    pub concurrent_stagger_max_ms: u64,
    /// Pause between concurrent batches.
    pub concurrent_batch_delay_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.ebay.com".to_string(),
            search_path: "/sch/i.html".to_string(),
            delay_min_ms: 1500,
            delay_max_ms: 3000,
            max_pages: 500,
            default_days: 7,
            navigation_timeout_secs: 60,
            max_listings: 30_000,
            empty_page_retry_budget: 2,
            max_consecutive_errors: 3,
            session_recycle_pages: 20,
            safety_pause_pages: 10,
            safety_pause_min_ms: 2000,
            safety_pause_extra_ms: 2000,
            block_cooldown_secs: 60,
            empty_cooldown_secs: 5,
            settle_after_scroll_ms: 1500,
            warmup_settle_ms: 1000,
            warmup_timeout_secs: 15,
            progress_interval_secs: 10,
            concurrent_workers: 3,
            concurrent_stagger_max_ms: 2000,
            concurrent_batch_delay_secs: 7,
        }
    }
}

impl CrawlerConfig {
    /// Fast variant for tests: no pacing, no cooldowns.
    pub fn immediate() -> Self {
        Self {
            delay_min_ms: 0,
            delay_max_ms: 0,
            safety_pause_min_ms: 0,
            safety_pause_extra_ms: 0,
            block_cooldown_secs: 0,
            empty_cooldown_secs: 0,
            settle_after_scroll_ms: 0,
            warmup_settle_ms: 0,
            concurrent_stagger_max_ms: 0,
            concurrent_batch_delay_secs: 0,
            ..Self::default()
        }
    }
}

/// Analysis pipeline thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Single-item price ceiling; anything above is bulk/lot noise.
    pub max_single_item_price: f64,
    /// Pairwise similarity threshold for the group summary.
    pub summary_similarity: f64,
    /// Pairwise similarity threshold for arbitrage groups (stricter).
    pub arbitrage_similarity: f64,
    /// Minimum (p90 − p10) / median spread for an arbitrage admission.
    pub min_spread_ratio: f64,
    /// Minimum return on investment, in percent.
    pub min_roi_pct: f64,
    /// Minimum absolute profit per flip.
    pub min_profit: f64,
    /// Recent-vs-overall velocity multiple that flags a hot item.
    pub hot_velocity_ratio: f64,
    /// Recent-vs-overall price multiple that flags a hot item.
    pub hot_price_ratio: f64,
    /// Rows retained per n-gram table.
    pub ngram_table_len: usize,
    /// Rows retained in the hot-item list.
    pub hot_items_len: usize,
    /// Rows retained per opportunity list.
    pub opportunities_len: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_single_item_price: 1500.0,
            summary_similarity: 0.5,
            arbitrage_similarity: 0.65,
            min_spread_ratio: 0.20,
            min_roi_pct: 15.0,
            min_profit: 10.0,
            hot_velocity_ratio: 1.2,
            hot_price_ratio: 1.1,
            ngram_table_len: 50,
            hot_items_len: 30,
            opportunities_len: 30,
        }
    }
}
