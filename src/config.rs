//! Configuration management for routeprom
//!
//! Parses TOML configuration files and provides typed access to settings.
//! [`PrometheusConfig`] can also be built in code with its `with_*` setters
//! when the crate is embedded in another server.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// Default scrape path
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
/// Default metric namespace
pub const DEFAULT_NAMESPACE: &str = "axum";
/// Default metric subsystem
pub const DEFAULT_SUBSYSTEM: &str = "http";

/// Root configuration structure for the demo server
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub metrics: PrometheusConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Instrumentation settings
///
/// Fields are private so a validated config cannot drift; use the accessors to
/// read and the `with_*` setters to build one in code. Every field has a
/// default, so an absent `[metrics]` section yields a working setup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrometheusConfig {
    /// Path the scrape endpoint is mounted on
    #[serde(default = "default_path")]
    path: String,
    #[serde(default = "default_namespace")]
    namespace: String,
    #[serde(default = "default_subsystem")]
    subsystem: String,
    /// Shared bearer secret; absent or empty disables the check
    #[serde(default)]
    token: Option<String>,
    /// Route templates that are never instrumented
    #[serde(default)]
    ignored: Vec<String>,
}

fn default_path() -> String {
    DEFAULT_METRICS_PATH.to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_subsystem() -> String {
    DEFAULT_SUBSYSTEM.to_string()
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            namespace: default_namespace(),
            subsystem: default_subsystem(),
            token: None,
            ignored: Vec::new(),
        }
    }
}

impl PrometheusConfig {
    /// Set the scrape endpoint path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the metric namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the metric subsystem
    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    /// Require `Authorization: Bearer <token>` on the scrape endpoint
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Exclude route templates from instrumentation
    pub fn with_ignored<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.ignored.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// Configured bearer token, `None` when the check is disabled
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }

    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    /// Validate instrumentation settings
    ///
    /// Called by [`crate::Prometheus::new`] before any collector is created.
    pub fn validate(&self) -> AppResult<()> {
        if !self.path.starts_with('/') {
            return Err(AppError::Config(format!(
                "metrics.path must start with '/', got '{}'",
                self.path
            )));
        }

        for (field, value) in [
            ("namespace", &self.namespace),
            ("subsystem", &self.subsystem),
        ] {
            if !is_valid_name_part(value) {
                return Err(AppError::Config(format!(
                    "metrics.{} '{}' is not a valid Prometheus metric name component. \
                    Use ASCII letters, digits, '_' or ':' and do not start with a digit.",
                    field, value
                )));
            }
        }

        if let Some(bad) = self.ignored.iter().find(|path| !path.starts_with('/')) {
            return Err(AppError::Config(format!(
                "metrics.ignored entries must be route templates starting with '/', got '{}'",
                bad
            )));
        }

        Ok(())
    }
}

/// Empty is allowed: the prometheus crate skips empty namespace/subsystem
fn is_valid_name_part(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        None => true,
        Some(first) if first.is_ascii_digit() => false,
        Some(_) => value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':'),
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self = toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
            path: path_display.clone(),
            source,
        })?;

        // Phase 3: Validate parsed config (provides contextual reason)
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.is_empty() {
            return Err(AppError::Config("server.host must not be empty".to_string()));
        }

        if self.server.port == 0 {
            return Err(AppError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if LevelFilter::from_str(&self.observability.log_level).is_err() {
            return Err(AppError::Config(format!(
                "observability.log_level '{}' is not a valid level. \
                Use one of: off, error, warn, info, debug, trace.",
                self.observability.log_level
            )));
        }

        self.metrics.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_metric_defaults() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000
"#;
        let config: Config = toml::from_str(toml).expect("should parse minimal config");
        assert_eq!(config.metrics, PrometheusConfig::default());
        assert_eq!(config.metrics.path(), "/metrics");
        assert_eq!(config.metrics.namespace(), "axum");
        assert_eq!(config.metrics.subsystem(), "http");
        assert_eq!(config.metrics.token(), None);
        assert!(config.metrics.ignored().is_empty());
        assert_eq!(config.observability.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_metrics_section_parses() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 8080

[metrics]
path = "/internal/metrics"
namespace = "shop"
subsystem = "api"
token = "secret"
ignored = ["/health", "/widgets/{id}/debug"]
"#;
        let config: Config = toml::from_str(toml).expect("should parse config");
        assert_eq!(config.metrics.path(), "/internal/metrics");
        assert_eq!(config.metrics.namespace(), "shop");
        assert_eq!(config.metrics.subsystem(), "api");
        assert_eq!(config.metrics.token(), Some("secret"));
        assert_eq!(config.metrics.ignored().len(), 2);
    }

    #[test]
    fn test_empty_token_disables_check() {
        let config = PrometheusConfig::default().with_token("");
        assert_eq!(config.token(), None);
    }

    #[test]
    fn test_builder_setters() {
        let config = PrometheusConfig::default()
            .with_path("/m")
            .with_namespace("ns")
            .with_subsystem("sub")
            .with_token("t")
            .with_ignored(["/a"])
            .with_ignored(vec!["/b".to_string()]);
        assert_eq!(config.path(), "/m");
        assert_eq!(config.namespace(), "ns");
        assert_eq!(config.subsystem(), "sub");
        assert_eq!(config.token(), Some("t"));
        assert_eq!(config.ignored(), &["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn test_validate_rejects_relative_path() {
        let err = PrometheusConfig::default()
            .with_path("metrics")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("metrics.path"));
    }

    #[test]
    fn test_validate_rejects_bad_namespace() {
        let err = PrometheusConfig::default()
            .with_namespace("my-app")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("metrics.namespace"));

        let err = PrometheusConfig::default()
            .with_subsystem("1st")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("metrics.subsystem"));
    }

    #[test]
    fn test_validate_allows_empty_subsystem() {
        assert!(PrometheusConfig::default().with_subsystem("").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_ignored_without_slash() {
        let err = PrometheusConfig::default()
            .with_ignored(["health"])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("metrics.ignored"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            observability: ObservabilityConfig {
                log_level: "loud".to_string(),
            },
            metrics: PrometheusConfig::default(),
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("observability.log_level"));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            observability: ObservabilityConfig::default(),
            metrics: PrometheusConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}
