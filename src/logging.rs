//! Structured logging setup.
//!
//! The library itself only emits `tracing` events. Applications that do not
//! install their own subscriber can use [`init_logging_with_config`]:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `TAGBIND_LOG_LEVEL` | `info` | any `EnvFilter` level |
//! | `TAGBIND_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `TAGBIND_LOG_TARGET_FILTER` | unset | extra comma-separated filter directives |
//!
//! `RUST_LOG`, when set, replaces the level.

use anyhow::{Context, Result};
use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Subscriber settings read from `TAGBIND_LOG_*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Pretty multi-line output instead of one JSON object per event
    pub pretty: bool,
    pub target_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            pretty: false,
            target_filter: None,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`LogConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            level: lookup("TAGBIND_LOG_LEVEL").unwrap_or(defaults.level),
            pretty: lookup("TAGBIND_LOG_FORMAT")
                .is_some_and(|f| f.eq_ignore_ascii_case("pretty")),
            target_filter: lookup("TAGBIND_LOG_TARGET_FILTER"),
        }
    }

    /// `RUST_LOG` or the configured level, plus the target directives.
    ///
    /// # Errors
    ///
    /// Fails on a level or directive `EnvFilter` cannot parse.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&self.level)
                .with_context(|| format!("Invalid log level '{}'", self.level))?,
        };
        for directive in self
            .target_filter
            .iter()
            .flat_map(|f| f.split(','))
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            let parsed = directive
                .parse()
                .with_context(|| format!("Invalid log filter directive '{directive}'"))?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }
}

/// Install a global subscriber writing to stdout.
///
/// # Errors
///
/// Fails on an invalid filter or when a global subscriber is already
/// installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let fmt_layer = if config.pretty {
        tracing_subscriber::fmt::layer().pretty().boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")
}
