//! Result and error types for cura-probe.

use crate::locator::Locator;
use std::time::Duration;
use thiserror::Error;

/// Result type for cura-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving pages, probes and API checks
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No element matched the locator before the wait deadline
    #[error("Element {locator} not found within {}ms", timeout.as_millis())]
    ElementNotFound {
        /// Locator that never resolved
        locator: Locator,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// An element matched but never became displayed and enabled
    #[error("Element {locator} not clickable within {}ms", timeout.as_millis())]
    ElementNotClickable {
        /// Locator that never became clickable
        locator: Locator,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// Click or type failed after the allowed attempts
    #[error("Failed to interact with {description} after {attempts} attempt(s): {cause}")]
    InteractionFailed {
        /// Human-readable name of the target
        description: String,
        /// Attempts made before giving up
        attempts: u32,
        /// Last underlying failure
        #[source]
        cause: Box<ProbeError>,
    },

    /// Element handle is no longer attached to the DOM
    #[error("Stale element reference for {locator}")]
    StaleElement {
        /// Locator the handle was resolved from
        locator: String,
    },

    /// Select box has no option with the requested visible text
    #[error("No option with visible text {text:?}")]
    OptionNotFound {
        /// Requested visible text
        text: String,
    },

    /// Locator could not be built or parsed
    #[error("Invalid locator: {message}")]
    InvalidLocator {
        /// Error message
        message: String,
    },

    /// Any other failure reported by the remote driver
    #[error("WebDriver error ({error}): {message}")]
    WebDriver {
        /// W3C error code (e.g. "element click intercepted")
        error: String,
        /// Error message
        message: String,
    },

    /// Session could not be created or is unusable
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Configuration failed validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// REST API answered with an unexpected status
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// HTTP transport error
    #[cfg(any(feature = "webdriver", feature = "api"))]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Base64 decoding error
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl ProbeError {
    /// Create a WebDriver error
    #[must_use]
    pub fn webdriver(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WebDriver {
            error: error.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Whether this is a wait deadline expiry
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::ElementNotClickable { .. }
        )
    }

    /// Whether the element handle went stale
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }
}
