//! Structured logging setup.
//!
//! Installs a global `tracing` subscriber: an [`EnvFilter`], a human or JSON
//! layer on stderr and, optionally, a plain-text layer appending to a file.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `cura_probe=debug`
    pub level: String,
    /// Emit JSON lines on stderr
    pub json: bool,
    /// Also append plain-text records to this file
    pub file: Option<PathBuf>,
    /// Use `level` even when `RUST_LOG` is set
    #[serde(skip)]
    pub force_level: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
            force_level: false,
        }
    }
}

impl LogConfig {
    /// Set the filter directive
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Enable JSON output
    #[must_use]
    pub const fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Make `level` win over `RUST_LOG`
    #[must_use]
    pub const fn with_forced_level(mut self, force: bool) -> Self {
        self.force_level = force;
        self
    }

    /// Append to a log file
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

/// Filter for `config` given the value of `RUST_LOG`, if any.
///
/// `RUST_LOG` wins over the configured level unless the level is forced.
/// A directive that does not parse falls back to the configured level,
/// then to `info`.
#[must_use]
pub fn filter_for(config: &LogConfig, env: Option<&str>) -> EnvFilter {
    let directive = match env.map(str::trim) {
        Some(env) if !env.is_empty() && !config.force_level => env,
        _ => config.level.as_str(),
    };
    EnvFilter::try_new(directive)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an I/O error if the log file cannot be opened, or
/// [`ProbeError::InvalidConfig`] if a subscriber is already installed.
pub fn init(config: &LogConfig) -> ProbeResult<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = filter_for(config, env.as_deref());

    let file_layer = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| ProbeError::config(format!("logging already initialized: {e}")))
}
