//! Crawl session controller.
//!
//! Drives the rendering surface page by page: fetch, extract, filter, decide
//! whether to continue. Recovers from transient failures by cooling down and
//! reinitializing the session; a stop is always clean and returns whatever
//! accumulated. The only caller-visible failure is the inability to open a
//! rendering session at all.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::analyze;
use crate::domain::{AnalysisResult, CrawlPhase, Listing, ProgressEvent};
use crate::infrastructure::config::{AnalysisConfig, CrawlerConfig};
use crate::infrastructure::parsing::listing_parser::extract_listings;
use crate::infrastructure::parsing::vocabulary::is_block_page;
use crate::infrastructure::render::{RenderError, RenderSession, RenderSurface};
use crate::infrastructure::search_url::build_search_url;

use super::hooks::ScanHooks;

/// Session-fatal failures. Everything transient is absorbed by the retry
/// machinery and never reaches the caller.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The rendering surface could not be launched or sustained.
    #[error("rendering surface unavailable: {0}")]
    Surface(#[from] RenderError),

    /// Bad base URL or search path.
    #[error("invalid crawl configuration: {0}")]
    Config(String),

    /// The offloaded analysis task was cancelled or panicked.
    #[error("analysis task failed: {0}")]
    Analysis(String),
}

/// Scheduling variant for the page loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// One page at a time with a randomized inter-page delay. Stable.
    #[default]
    Sequential,
    /// A small worker pool fetching distinct pages in parallel. Faster,
    /// riskier against rate-based blocking.
    Concurrent,
}

/// Per-run parameters. Unset fields fall back to [`CrawlerConfig`] defaults.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Date window in days.
    pub days: Option<u32>,
    pub max_pages: Option<u32>,
    pub max_listings: Option<usize>,
    pub mode: ScanMode,
}

/// Mutable state of one crawl session. Owned exclusively by the controller;
/// the listing buffer is shared read-only with the progress reporter.
pub(super) struct CrawlState {
    pub buffer: Arc<RwLock<Vec<Listing>>>,
    pub current_page: Arc<AtomicU32>,
    pub cutoff: DateTime<Utc>,
    pub max_pages: u32,
    pub max_listings: usize,
}

/// The extraction-and-analysis engine entry point.
pub struct MarketScanner {
    pub(super) surface: Arc<dyn RenderSurface>,
    pub(super) config: CrawlerConfig,
    pub(super) analysis: AnalysisConfig,
}

impl MarketScanner {
    pub fn new(surface: Arc<dyn RenderSurface>, config: CrawlerConfig) -> Self {
        Self::with_analysis_config(surface, config, AnalysisConfig::default())
    }

    pub fn with_analysis_config(
        surface: Arc<dyn RenderSurface>,
        config: CrawlerConfig,
        analysis: AnalysisConfig,
    ) -> Self {
        Self {
            surface,
            config,
            analysis,
        }
    }

    /// Run one crawl session and analyze whatever it accumulated.
    ///
    /// Always returns a result on a clean stop — end of results, date-window
    /// exhaustion, blocking, or the listing ceiling all degrade gracefully
    /// to a (possibly empty) analysis.
    pub async fn run(
        &self,
        search_term: &str,
        options: &ScanOptions,
        hooks: ScanHooks,
    ) -> Result<AnalysisResult, EngineError> {
        let session_id = Uuid::new_v4();
        let days = options.days.unwrap_or(self.config.default_days);
        let state = CrawlState {
            buffer: Arc::new(RwLock::new(Vec::new())),
            current_page: Arc::new(AtomicU32::new(0)),
            cutoff: Utc::now() - Duration::days(i64::from(days)),
            max_pages: options.max_pages.unwrap_or(self.config.max_pages),
            max_listings: options.max_listings.unwrap_or(self.config.max_listings),
        };
        info!(
            %session_id,
            search_term,
            days,
            max_pages = state.max_pages,
            mode = ?options.mode,
            "starting crawl session"
        );

        hooks.emit(ProgressEvent::phase_only(CrawlPhase::Starting, 0, 0));
        let reporter_token = CancellationToken::new();
        let reporter = self.spawn_progress_reporter(
            search_term.to_string(),
            days,
            &state,
            hooks.clone(),
            reporter_token.clone(),
        );

        let crawl_outcome = match options.mode {
            ScanMode::Sequential => self.crawl_sequential(search_term, &state, &hooks).await,
            ScanMode::Concurrent => self.crawl_concurrent(search_term, &state, &hooks).await,
        };

        reporter_token.cancel();
        if let Some(handle) = reporter {
            let _ = handle.await;
        }
        crawl_outcome?;

        let listings = state.buffer.read().await.clone();
        info!(%session_id, collected = listings.len(), "crawl stopped, running final analysis");
        let result = self
            .run_analysis(listings, search_term.to_string(), days)
            .await?;
        hooks.emit(ProgressEvent {
            phase: CrawlPhase::Complete,
            page: state.current_page.load(Ordering::Relaxed),
            items_found: result.listings.len(),
            last_item_date: result.listings.last().map(|l| l.sold_date_text.clone()),
            partial_result: Some(Box::new(result.clone())),
        });
        Ok(result)
    }

    /// Sequential page loop: one page at a time, randomized pacing.
    async fn crawl_sequential(
        &self,
        search_term: &str,
        state: &CrawlState,
        hooks: &ScanHooks,
    ) -> Result<(), EngineError> {
        let mut session = self.init_session().await?;
        let mut page_num: u32 = 1;
        let mut consecutive_failures: u32 = 0;
        let mut has_more = true;

        while has_more
            && page_num <= state.max_pages
            && state.buffer.read().await.len() < state.max_listings
        {
            state.current_page.store(page_num, Ordering::Relaxed);

            // Session hygiene, independent of the retry backoff below.
            if page_num > 1 && page_num % self.config.session_recycle_pages.max(1) == 0 {
                debug!(page_num, "recycling rendering session");
                close_quietly(&mut session).await;
                session = self.init_session().await?;
            }
            if page_num > 1 && page_num % self.config.safety_pause_pages.max(1) == 0 {
                let pause = self.config.safety_pause_min_ms
                    + random_up_to(self.config.safety_pause_extra_ms);
                sleep(StdDuration::from_millis(pause)).await;
            }

            let url = self.search_url(search_term, page_num)?;
            let fetched = self.fetch_rendered_page(session.as_mut(), &url).await;

            let (listings, content) = match fetched {
                Ok(page) => page,
                Err(err) => {
                    warn!(page_num, error = %err, "unexpected page failure");
                    consecutive_failures += 1;
                    if consecutive_failures > self.config.max_consecutive_errors {
                        warn!("🛑 too many consecutive failures, stopping session");
                        break;
                    }
                    close_quietly(&mut session).await;
                    session = self.init_session().await?;
                    continue;
                }
            };

            if listings.is_empty() {
                let title = session.title().await.unwrap_or_default();
                let blocked = is_block_page(&title, &content);
                info!(page_num, blocked, title = %title, "page returned no items");

                if consecutive_failures < self.config.empty_page_retry_budget {
                    let cooldown = if blocked {
                        self.config.block_cooldown_secs
                    } else {
                        self.config.empty_cooldown_secs
                    };
                    warn!(page_num, cooldown_secs = cooldown, "retrying page after cooldown");
                    consecutive_failures += 1;
                    sleep(StdDuration::from_secs(cooldown)).await;
                    close_quietly(&mut session).await;
                    session = self.init_session().await?;
                    continue;
                }
                if blocked {
                    warn!("🛑 persistent block, stopping session");
                } else {
                    info!("end of results or soft block, stopping session");
                }
                break;
            }
            consecutive_failures = 0;

            let mut kept = Vec::new();
            for item in listings {
                if hooks.should_stop(&item).await {
                    info!(item_id = %item.item_id, "external stop condition met");
                    has_more = false;
                    break;
                }
                if item.is_older_than(state.cutoff) {
                    continue;
                }
                kept.push(item);
            }
            let valid_count = kept.len();
            state.buffer.write().await.extend(kept);
            debug!(page_num, valid_count, "page processed");

            if !has_more {
                break;
            }
            if valid_count == 0 {
                info!(page_num, "🎯 every item on page is older than the cutoff, stopping");
                break;
            }

            page_num += 1;
            sleep(StdDuration::from_millis(self.random_page_delay())).await;
        }

        close_quietly(&mut session).await;
        Ok(())
    }

    /// Navigate, force lazy content, and extract one page. A navigation
    /// timeout is downgraded: extraction runs against the partial content.
    pub(super) async fn fetch_rendered_page(
        &self,
        session: &mut dyn RenderSession,
        url: &str,
    ) -> Result<(Vec<Listing>, String), RenderError> {
        let timeout = StdDuration::from_secs(self.config.navigation_timeout_secs);
        match session.navigate(url, timeout).await {
            Ok(()) => {}
            Err(err) if err.is_timeout() => {
                warn!(url, "navigation timed out, parsing whatever loaded");
            }
            Err(err) => return Err(err),
        }
        session.scroll_to_bottom().await?;
        sleep(StdDuration::from_millis(self.config.settle_after_scroll_ms)).await;

        let content = session.content().await?;
        let listings = extract_listings(&content, Utc::now());
        Ok((listings, content))
    }

    /// Open a session and warm it up against the site root to acquire
    /// cookies. Warm-up failures are ignored; open failures are fatal.
    pub(super) async fn init_session(&self) -> Result<Box<dyn RenderSession>, EngineError> {
        let mut session = self.surface.open_session().await?;
        let timeout = StdDuration::from_secs(self.config.warmup_timeout_secs);
        if let Err(err) = session.navigate(&self.config.base_url, timeout).await {
            debug!(error = %err, "warm-up navigation failed, continuing anyway");
        }
        sleep(StdDuration::from_millis(self.config.warmup_settle_ms)).await;
        Ok(session)
    }

    pub(super) fn search_url(&self, term: &str, page: u32) -> Result<String, EngineError> {
        build_search_url(&self.config.base_url, &self.config.search_path, term, page)
            .map_err(|err| EngineError::Config(err.to_string()))
    }

    pub(super) fn random_page_delay(&self) -> u64 {
        self.config.delay_min_ms + random_up_to(self.config.delay_max_ms.saturating_sub(self.config.delay_min_ms))
    }

    /// Offload the CPU-bound analysis so the runtime stays responsive.
    async fn run_analysis(
        &self,
        listings: Vec<Listing>,
        search_term: String,
        days: u32,
    ) -> Result<AnalysisResult, EngineError> {
        let config = self.analysis.clone();
        tokio::task::spawn_blocking(move || {
            analyze(&listings, &search_term, days, Utc::now(), &config)
        })
        .await
        .map_err(|err| EngineError::Analysis(err.to_string()))
    }

    /// Periodic partial-result reporter. Reads a snapshot of the shared
    /// buffer without blocking the fetch loop; its failures are swallowed.
    fn spawn_progress_reporter(
        &self,
        search_term: String,
        days: u32,
        state: &CrawlState,
        hooks: ScanHooks,
        token: CancellationToken,
    ) -> Option<tokio::task::JoinHandle<()>> {
        hooks.on_progress.as_ref()?;

        let buffer = Arc::clone(&state.buffer);
        let current_page = Arc::clone(&state.current_page);
        let analysis = self.analysis.clone();
        let interval = StdDuration::from_secs(self.config.progress_interval_secs.max(1));

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // immediate first tick carries nothing

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let snapshot = buffer.read().await.clone();
                if snapshot.is_empty() {
                    continue;
                }
                let items_found = snapshot.len();
                let last_item_date = snapshot.last().map(|l| l.sold_date_text.clone());
                let page = current_page.load(Ordering::Relaxed);

                let term = search_term.clone();
                let config = analysis.clone();
                let partial = tokio::task::spawn_blocking(move || {
                    analyze(&snapshot, &term, days, Utc::now(), &config)
                })
                .await;

                match partial {
                    Ok(partial) => hooks.emit(ProgressEvent {
                        phase: CrawlPhase::Scraping,
                        page,
                        items_found,
                        last_item_date,
                        partial_result: Some(Box::new(partial)),
                    }),
                    Err(err) => debug!(error = %err, "partial analysis failed, skipping report"),
                }
            }
        }))
    }
}

pub(super) async fn close_quietly(session: &mut Box<dyn RenderSession>) {
    if let Err(err) = session.close().await {
        debug!(error = %err, "session close failed, ignoring");
    }
}

pub(super) fn random_up_to(bound_ms: u64) -> u64 {
    if bound_ms == 0 {
        0
    } else {
        fastrand::u64(0..bound_ms)
    }
}
