//! Logging configuration for dq-scan.
//!
//! Structured logging uses the `tracing` crate throughout: scans log at info
//! level, per-rule evaluation at debug level, and failed rules at warn level.
//! This module provides a small configuration type plus a
//! `tracing-subscriber` initializer for binaries and tests that embed the
//! engine.

use tracing::Level;

/// Logging configuration for applications embedding dq-scan.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for the application
    pub level: Level,
    /// Log level for dq-scan components specifically
    pub scan_level: Level,
    /// Whether to use JSON output format
    pub json_format: bool,
    /// Environment filter override
    pub env_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            scan_level: Level::DEBUG,
            json_format: false,
            env_filter: None,
        }
    }
}

impl LogConfig {
    /// Creates a configuration for production use: terse, JSON-formatted.
    pub fn production() -> Self {
        Self {
            level: Level::WARN,
            scan_level: Level::INFO,
            json_format: true,
            env_filter: None,
        }
    }

    /// Creates a verbose configuration suitable for debugging.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            scan_level: Level::DEBUG,
            json_format: false,
            env_filter: None,
        }
    }

    /// Sets the base log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets whether to use JSON output format.
    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    /// Sets a custom environment filter.
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Builds the environment filter string.
    pub fn env_filter(&self) -> String {
        if let Some(ref filter) = self.env_filter {
            filter.clone()
        } else {
            format!(
                "{},dq_scan={}",
                self.level.as_str().to_lowercase(),
                self.scan_level.as_str().to_lowercase()
            )
        }
    }
}

/// Initializes global logging from the given configuration.
///
/// The `RUST_LOG` environment variable, when set, takes precedence over the
/// configured filter.
///
/// # Examples
///
/// ```rust,no_run
/// use dq_scan::logging::{init_logging, LogConfig};
///
/// init_logging(LogConfig::development()).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

    let fmt_layer = if config.json_format {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
