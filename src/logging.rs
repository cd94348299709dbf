//! Structured logging setup.
//!
//! Builds a `tracing_subscriber` registry with an [`EnvFilter`] and a JSON or
//! pretty formatting layer. Output goes to stderr so the CLI's stdout stays
//! machine-readable.
//!
//! | Variable                       | Default | Meaning                              |
//! |--------------------------------|---------|--------------------------------------|
//! | `SWITCHYARD_LOG_LEVEL`         | `info`  | trace/debug/info/warn/error          |
//! | `SWITCHYARD_LOG_FORMAT`        | `json`  | `json` or `pretty`                   |
//! | `SWITCHYARD_LOG_TARGET_FILTER` | unset   | extra comma-separated filter directives |
//! | `SWITCHYARD_LOG_INCLUDE_LOCATION` | `false` | include file and line in events  |
//!
//! `RUST_LOG`, when set, takes precedence over `SWITCHYARD_LOG_LEVEL`.

use anyhow::{Context, Result};
use tracing::{warn, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const LOG_LEVEL_ENV: &str = "SWITCHYARD_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "SWITCHYARD_LOG_FORMAT";
pub const LOG_TARGET_FILTER_ENV: &str = "SWITCHYARD_LOG_TARGET_FILTER";
pub const LOG_INCLUDE_LOCATION_ENV: &str = "SWITCHYARD_LOG_INCLUDE_LOCATION";

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Anything other than `pretty` selects JSON.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Read the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            log_level: lookup(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            format: lookup(LOG_FORMAT_ENV)
                .map(|value| LogFormat::parse(&value))
                .unwrap_or(defaults.format),
            target_filter: lookup(LOG_TARGET_FILTER_ENV).filter(|value| !value.trim().is_empty()),
            include_location: lookup(LOG_INCLUDE_LOCATION_ENV)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(defaults.include_location),
        }
    }

    /// Configuration for local development: debug level, pretty output.
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
            include_location: true,
        }
    }

    /// Parsed level; unknown names fall back to `INFO`.
    #[must_use]
    pub fn level(&self) -> Level {
        match self.log_level.trim().to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use switchyard::logging::{init_logging, LogConfig};
///
/// init_logging(&LogConfig::from_env()).expect("Failed to initialize logging");
/// ```
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));

    let mut rejected = Vec::new();
    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',').map(str::trim) {
            if filter.is_empty() {
                continue;
            }
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => rejected.push(filter.to_string()),
            }
        }
    }

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    for filter in rejected {
        warn!(directive = %filter, "ignoring invalid log filter directive");
    }
    Ok(())
}
