//! Domain model: listings, analysis reports, and progress events.

pub mod analysis;
pub mod events;
pub mod listing;

pub use analysis::{
    AnalysisResult, ArbitrageOpportunity, BrandPerformance, ConditionBreakdown, DailySales,
    GroupSummary, HotItem, NewVsUsedSplit, NgramEntry, OpportunitiesSection, PriceBucket,
    PriceStats, ResultMeta, StatsSection, TrendsSection, VelocityReport,
};
pub use events::{CrawlPhase, ProgressEvent};
pub use listing::{Condition, Listing};
