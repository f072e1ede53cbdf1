//! Logging initialization.
//!
//! Console logging through `tracing` with env-filter control. Library code
//! only emits spans and events; installing a subscriber is the embedding
//! application's choice, so this helper is opt-in and idempotent.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directive when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "market_pulse=info";

/// Install a console subscriber. Safe to call more than once; subsequent
/// calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
