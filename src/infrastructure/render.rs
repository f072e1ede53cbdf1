//! The renderable-page capability the engine consumes but does not
//! implement.
//!
//! The target site assembles its results client-side, so plain HTTP fetches
//! see an empty shell. The engine therefore drives an abstract rendering
//! surface — typically a headless browser — through this seam, and test
//! suites substitute synthetic surfaces that serve canned pages.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failures at the rendering seam.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The surface could not be launched or a session could not be opened.
    /// The only failure that is fatal to a crawl session.
    #[error("failed to open rendering session: {0}")]
    Launch(String),

    /// Navigation exceeded its timeout. Not fatal: whatever content loaded
    /// is still usable and extraction proceeds against it.
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    /// Navigation failed outright (DNS, connection reset, crashed tab).
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The session died mid-use and must be reinitialized.
    #[error("rendering session crashed: {0}")]
    SessionCrashed(String),
}

impl RenderError {
    /// Timeouts leave partial content behind; everything else does not.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::NavigationTimeout(_))
    }
}

/// One live rendering context (browser tab/page equivalent).
///
/// All methods are suspension points; none are expected to be reentrant.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to a URL. May return [`RenderError::NavigationTimeout`] and
    /// still leave partially loaded content accessible via [`content`].
    ///
    /// [`content`]: RenderSession::content
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError>;

    /// Scroll to the bottom in bounded steps so lazy-loaded items
    /// materialize.
    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError>;

    /// Current page title.
    async fn title(&mut self) -> Result<String, RenderError>;

    /// Rendered HTML of the live DOM, for structured extraction.
    async fn content(&mut self) -> Result<String, RenderError>;

    /// Close the session and release renderer resources.
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// Factory for rendering sessions. The crawl controller opens, recycles, and
/// closes sessions through this seam only.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}
