//! Caller-supplied collaborators: progress reporting and external
//! deduplication.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Listing, ProgressEvent};

/// Best-effort progress callback. Must not block; failures are the
/// caller's problem and never abort the crawl.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// External stop predicate, consulted per candidate listing. Lets the
/// caller terminate a session against state the engine does not own
/// ("this item id is already stored").
#[async_trait]
pub trait StopCheck: Send + Sync {
    async fn should_stop(&self, candidate: &Listing) -> bool;
}

/// The optional collaborator bundle for one crawl session.
#[derive(Clone, Default)]
pub struct ScanHooks {
    pub on_progress: Option<ProgressCallback>,
    pub stop_check: Option<Arc<dyn StopCheck>>,
}

impl ScanHooks {
    /// No collaborators.
    pub fn none() -> Self {
        Self::default()
    }

    /// Progress callback only.
    pub fn with_progress(callback: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        Self {
            on_progress: Some(Arc::new(callback)),
            stop_check: None,
        }
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.on_progress {
            callback(event);
        }
    }

    pub(crate) async fn should_stop(&self, candidate: &Listing) -> bool {
        match &self.stop_check {
            Some(check) => check.should_stop(candidate).await,
            None => false,
        }
    }
}

impl std::fmt::Debug for ScanHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanHooks")
            .field("on_progress", &self.on_progress.is_some())
            .field("stop_check", &self.stop_check.is_some())
            .finish()
    }
}
