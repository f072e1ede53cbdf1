//! Market Pulse - sold-listing extraction and market intelligence engine.
//!
//! The engine drives a caller-supplied rendering surface through a paged
//! search of sold listings, normalizes the noisy rendered cards into typed
//! records, and turns the accumulation into market intelligence: price
//! statistics, fuzzy product groupings, keyword trend tables, and
//! buy-low/sell-high signals.
//!
//! It is a pure function from a rendering capability plus parameters to an
//! [`AnalysisResult`] and a stream of progress events — it persists nothing
//! and owns no storage. See [`MarketScanner::run`] for the single entry
//! point and [`infrastructure::render::RenderSurface`] for the one
//! capability the engine consumes but does not implement.

pub mod analysis;
pub mod crawl_engine;
pub mod domain;
pub mod export;
pub mod infrastructure;

// Re-export the public surface for easier embedding.
pub use analysis::analyze;
pub use crawl_engine::{
    EngineError, MarketScanner, ProgressCallback, ScanHooks, ScanMode, ScanOptions, StopCheck,
};
pub use domain::{AnalysisResult, Condition, CrawlPhase, Listing, ProgressEvent};
pub use infrastructure::{AnalysisConfig, CrawlerConfig, RenderError, RenderSession, RenderSurface};
