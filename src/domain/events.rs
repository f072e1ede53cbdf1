//! Progress events emitted during a crawl session.
//!
//! Events are best-effort: the controller never blocks on the progress
//! callback and swallows its failures.

use serde::{Deserialize, Serialize};

use super::analysis::AnalysisResult;

/// Phase of the crawl session the event was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrawlPhase {
    /// Session initialized, no pages fetched yet.
    Starting,
    /// Page loop is running; partial results may be attached.
    Scraping,
    /// Terminal analysis over the full accumulation.
    Complete,
}

impl std::fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "STARTING"),
            Self::Scraping => write!(f, "SCRAPING"),
            Self::Complete => write!(f, "COMPLETE"),
        }
    }
}

/// One progress snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub phase: CrawlPhase,
    /// Page index the controller is currently on (0 before the first fetch).
    pub page: u32,
    pub items_found: usize,
    /// Raw sold-date text of the most recently accumulated item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_item_date: Option<String>,
    /// Full analysis over the accumulation so far, when one was computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_result: Option<Box<AnalysisResult>>,
}

impl ProgressEvent {
    /// Event with no partial result attached.
    pub fn phase_only(phase: CrawlPhase, page: u32, items_found: usize) -> Self {
        Self {
            phase,
            page,
            items_found,
            last_item_date: None,
            partial_result: None,
        }
    }
}
