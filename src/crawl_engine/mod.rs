//! Crawl engine: the resilient session controller and its scheduling
//! variants.

mod concurrent;
pub mod controller;
pub mod hooks;

pub use controller::{EngineError, MarketScanner, ScanMode, ScanOptions};
pub use hooks::{ProgressCallback, ScanHooks, StopCheck};
