//! Infrastructure: configuration, logging, the rendering seam, and
//! rendered-page parsing.

pub mod config;
pub mod logging;
pub mod parsing;
pub mod render;
pub mod search_url;

pub use config::{AnalysisConfig, CrawlerConfig};
pub use render::{RenderError, RenderSession, RenderSurface};
