//! Bounded-concurrency scheduling variant.
//!
//! A fixed-size worker pool fetches distinct pages in parallel, each worker
//! staggered by a short random delay to avoid synchronized request bursts.
//! Results are joined per batch before any stop condition is evaluated, so
//! stop decisions always see a consistent, fully collected batch.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use futures::future::join_all;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::domain::Listing;
use crate::infrastructure::config::CrawlerConfig;
use crate::infrastructure::parsing::listing_parser::extract_listings;
use crate::infrastructure::parsing::vocabulary::is_block_page;
use crate::infrastructure::render::{RenderError, RenderSession, RenderSurface};

use super::controller::{close_quietly, random_up_to, CrawlState, EngineError, MarketScanner};
use super::hooks::ScanHooks;

/// Consecutive empty pages tolerated before the batch loop stops.
const EMPTY_PAGE_STOP: u32 = 3;

impl MarketScanner {
    /// Batch page loop over the fixed worker pool.
    pub(super) async fn crawl_concurrent(
        &self,
        search_term: &str,
        state: &CrawlState,
        hooks: &ScanHooks,
    ) -> Result<(), EngineError> {
        // One throwaway warm-up session for cookies; open failure is fatal,
        // warm-up navigation failure is not.
        let mut warmup = self.init_session().await?;
        close_quietly(&mut warmup).await;

        info!(
            workers = self.config.concurrent_workers,
            "launching concurrent page workers"
        );

        let mut next_page: u32 = 1;
        let mut consecutive_failures: u32 = 0;
        let mut stop = false;

        while !stop
            && next_page <= state.max_pages
            && state.buffer.read().await.len() < state.max_listings
        {
            let mut batch = Vec::new();
            for _ in 0..self.config.concurrent_workers {
                if next_page > state.max_pages {
                    break;
                }
                batch.push(next_page);
                next_page += 1;
            }
            if batch.is_empty() {
                break;
            }
            state
                .current_page
                .store(*batch.last().expect("non-empty batch"), Ordering::Relaxed);

            let workers: Vec<_> = batch
                .iter()
                .map(|page_num| {
                    let surface = Arc::clone(&self.surface);
                    let config = self.config.clone();
                    let url = self.search_url(search_term, *page_num);
                    let page_num = *page_num;
                    tokio::spawn(async move {
                        match url {
                            Ok(url) => fetch_page_isolated(surface, config, url, page_num).await,
                            Err(err) => {
                                warn!(page_num, error = %err, "could not build page URL");
                                Vec::new()
                            }
                        }
                    })
                })
                .collect();
            let results = join_all(workers).await;

            for (position, joined) in results.into_iter().enumerate() {
                let page_num = batch[position];
                let listings = joined.unwrap_or_else(|err| {
                    warn!(page_num, error = %err, "page worker aborted");
                    Vec::new()
                });

                if listings.is_empty() {
                    consecutive_failures += 1;
                    if consecutive_failures >= EMPTY_PAGE_STOP {
                        info!("🛑 {EMPTY_PAGE_STOP} consecutive empty pages, stopping");
                        stop = true;
                        break;
                    }
                    continue;
                }
                consecutive_failures = 0;

                let total = listings.len();
                let mut old_count = 0usize;
                let mut kept: Vec<Listing> = Vec::new();
                for item in listings {
                    if hooks.should_stop(&item).await {
                        info!(item_id = %item.item_id, "external stop condition met");
                        stop = true;
                        break;
                    }
                    if item.is_older_than(state.cutoff) {
                        old_count += 1;
                        continue;
                    }
                    kept.push(item);
                }

                let kept_count = kept.len();
                state.buffer.write().await.extend(kept);
                info!(page_num, kept = kept_count, old = old_count, "page processed");
                if stop {
                    break;
                }

                if old_count > total / 2 {
                    info!(page_num, "🎯 most of the page is outside the date window, stopping");
                    stop = true;
                    break;
                }
                if kept_count == 0 && total > 0 {
                    info!(page_num, "🛑 page entirely outside the date window, stopping");
                    stop = true;
                    break;
                }
                if state.buffer.read().await.len() >= state.max_listings {
                    info!("accumulation ceiling reached, stopping");
                    stop = true;
                    break;
                }
            }

            if !stop {
                sleep(StdDuration::from_secs(self.config.concurrent_batch_delay_secs)).await;
            }
        }
        Ok(())
    }
}

/// Fetch one page in its own rendering session. Every failure degrades to an
/// empty page; the batch loop decides what that means.
async fn fetch_page_isolated(
    surface: Arc<dyn RenderSurface>,
    config: CrawlerConfig,
    url: String,
    page_num: u32,
) -> Vec<Listing> {
    sleep(StdDuration::from_millis(random_up_to(
        config.concurrent_stagger_max_ms,
    )))
    .await;

    let mut session = match surface.open_session().await {
        Ok(session) => session,
        Err(err) => {
            warn!(page_num, error = %err, "could not open page session");
            return Vec::new();
        }
    };

    let listings = match fetch_once(session.as_mut(), &config, &url, page_num).await {
        Ok(listings) => listings,
        Err(err) => {
            warn!(page_num, error = %err, "page fetch failed");
            Vec::new()
        }
    };
    close_quietly(&mut session).await;
    listings
}

async fn fetch_once(
    session: &mut dyn RenderSession,
    config: &CrawlerConfig,
    url: &str,
    page_num: u32,
) -> Result<Vec<Listing>, RenderError> {
    let timeout = StdDuration::from_secs(config.navigation_timeout_secs);
    match session.navigate(url, timeout).await {
        Ok(()) => {}
        Err(err) if err.is_timeout() => {
            warn!(page_num, "navigation timed out, parsing whatever loaded");
        }
        Err(err) => return Err(err),
    }
    session.scroll_to_bottom().await?;
    sleep(StdDuration::from_millis(config.settle_after_scroll_ms)).await;

    let content = session.content().await?;
    if is_block_page("", &content) {
        warn!(page_num, "🚫 block interstitial served, skipping page");
        return Ok(Vec::new());
    }
    Ok(extract_listings(&content, Utc::now()))
}
