//! Logging setup for the demo server
//!
//! `RUST_LOG` wins when set. Otherwise the `[observability]` level applies to
//! this crate and to the `tower_http` request spans, so route registration,
//! route table builds and recording failures show up at the chosen level.

use crate::config::ObservabilityConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directives used when `RUST_LOG` is unset
pub fn default_directives(level: &str) -> String {
    format!("routeprom={level},tower_http={level}")
}

fn filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)))
}

/// Install the global tracing subscriber
///
/// Returns `false` when a subscriber is already installed, in which case the
/// existing one stays in place.
///
/// # Examples
///
/// ```no_run
/// use routeprom::config::ObservabilityConfig;
///
/// routeprom::telemetry::init(&ObservabilityConfig::default());
/// tracing::info!("Application started");
/// ```
pub fn init(config: &ObservabilityConfig) -> bool {
    tracing_subscriber::registry()
        .with(filter(config))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
