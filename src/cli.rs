//! Command-line interface for the routeprom demo server
//!
//! Provides argument parsing and subcommand handling for the binary.

use clap::{Parser, Subcommand};

/// Demo HTTP server exporting route-templated Prometheus metrics
#[derive(Parser)]
#[command(name = "routeprom")]
#[command(version)]
#[command(about = "Demo HTTP server exporting route-templated Prometheus metrics")]
#[command(
    long_about = "Serves a small widget API instrumented with request count, duration, \
    request size and response size metrics, labelled by route template, and exposes \
    them on a Prometheus scrape endpoint."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# routeprom Configuration
# =======================

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# ─────────────────────────────────────────────────────────────────────────────
# METRICS
# ─────────────────────────────────────────────────────────────────────────────
#
# Exported series (labels: status, method, host, route):
#   <namespace>_<subsystem>_requests_total
#   <namespace>_<subsystem>_request_duration_milliseconds
#   <namespace>_<subsystem>_request_size_bytes
#   <namespace>_<subsystem>_response_size_bytes

[metrics]
# Scrape endpoint path
path = "/metrics"

namespace = "axum"
subsystem = "http"

# Require "Authorization: Bearer <token>" on the scrape endpoint.
# Leave unset to disable the check.
# token = "change-me"

# Route templates (as registered, e.g. "/widgets/{id}") that are never instrumented
ignored = ["/health"]
"#
}
