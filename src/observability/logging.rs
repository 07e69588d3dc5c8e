//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Pick the log level (`RUST_LOG` directives win over `LOG_LEVEL`)
//! - JSON lines when stdout is not a terminal, human-readable otherwise

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Parse a `LOG_LEVEL` value, falling back to `info` on anything unknown.
pub fn parse_level(log_level: &str) -> Level {
    log_level.trim().parse().unwrap_or(Level::INFO)
}

/// Install the global subscriber.
pub fn init_logging(log_level: &str) {
    let level = parse_level(log_level).as_str().to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("upstream_visor={level},tower_http={level}")));

    let registry = tracing_subscriber::registry().with(filter);
    if std::io::stdout().is_terminal() {
        registry.with(fmt::layer().with_target(false)).init();
    } else {
        registry
            .with(fmt::layer().json().flatten_event(true))
            .init();
    }
}
