//! Structured logging setup.
//!
//! The library itself only emits `tracing` events: an info event per forest
//! build, save and load, a debug event per tree and per query, and warnings
//! for zero vectors under the angular metric and for unsplittable duplicate
//! sets. Applications pick a subscriber with the functions below.
//!
//! # Environment Variables
//!
//! - `BOSQUE_LOG=info` - Default log level
//! - `BOSQUE_LOG=debug` - Per-tree and per-query events
//! - `BOSQUE_LOG=warn,bosque::index::persist=info` - Combined filters
//!
//! # Example
//!
//! ```
//! use bosque::logging;
//!
//! // Call once at startup; later calls are ignored.
//! logging::init_with_default("warn");
//! ```

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Variable holding the filter directives.
pub const LOG_ENV: &str = "BOSQUE_LOG";

/// Installs a compact text subscriber at `info` unless `BOSQUE_LOG` says otherwise.
pub fn init() {
    init_with_default("info");
}

/// Installs a compact text subscriber.
///
/// `default_level` applies when `BOSQUE_LOG` is unset or unparsable.
pub fn init_with_default(default_level: &str) {
    let subscriber = fmt()
        .with_env_filter(filter(default_level))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    // Only one global subscriber may exist.
    let _ = subscriber.try_init();
}

/// Installs a JSON-lines subscriber.
pub fn init_json(default_level: &str) {
    let subscriber = fmt()
        .with_env_filter(filter(default_level))
        .with_target(true)
        .json();

    let _ = subscriber.try_init();
}

/// Installs the subscriber described by a [`LoggingConfig`].
pub fn init_from_config(config: &LoggingConfig) {
    if config.json {
        init_json(&config.level);
    } else {
        init_with_default(&config.level);
    }
}

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level))
}
