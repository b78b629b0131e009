//! Tracing subscriber setup

use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. Calling this twice is a
/// no-op for the second call (the first subscriber stays installed).
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    if let Err(err) = result {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}
