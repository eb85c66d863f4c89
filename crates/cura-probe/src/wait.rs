//! Wait engine.
//!
//! Bounded polling that resolves a [`Locator`] to a live element once a
//! [`Condition`] holds. Each poll performs a fresh lookup; nothing is
//! cached between polls.
//!
//! A wait never fails before its timeout and never runs later than the
//! timeout plus one polling interval.

use crate::driver::{Driver, Element};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// CONDITION
// =============================================================================

/// Readiness condition for a located element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Attached to the DOM
    Presence,
    /// Attached and rendered
    Visible,
    /// Attached, rendered and enabled
    Clickable,
}

impl Condition {
    /// Get condition name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Presence => "presence",
            Self::Visible => "visible",
            Self::Clickable => "clickable",
        }
    }

    fn holds<E: Element>(self, element: &E) -> ProbeResult<bool> {
        match self {
            Self::Presence => Ok(true),
            Self::Visible => element.is_displayed(),
            Self::Clickable => Ok(element.is_displayed()? && element.is_enabled()?),
        }
    }

    fn timeout_error(self, locator: &Locator, timeout: Duration) -> ProbeError {
        let locator = locator.clone();
        match self {
            Self::Presence => ProbeError::ElementNotFound { locator, timeout },
            Self::Visible | Self::Clickable => ProbeError::ElementNotClickable { locator, timeout },
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// WAITER IMPLEMENTATION
// =============================================================================

/// Polls a driver until a condition holds or the deadline passes
pub struct Waiter<'d, D: Driver> {
    driver: &'d D,
    poll_interval: Duration,
}

impl<D: Driver> Clone for Waiter<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: Driver> Copy for Waiter<'_, D> {}

impl<D: Driver> fmt::Debug for Waiter<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl<'d, D: Driver> Waiter<'d, D> {
    /// Create a waiter polling at `options.poll_interval()`
    #[must_use]
    pub fn new(driver: &'d D, options: &WaitOptions) -> Self {
        Self {
            driver,
            poll_interval: options.poll_interval().max(Duration::from_millis(1)),
        }
    }

    /// Get the polling interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `probe` until it yields a value or `timeout` elapses.
    ///
    /// Returns `Ok(None)` on timeout. Errors from `probe` stop the wait.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `probe`.
    pub fn poll<T, F>(&self, timeout: Duration, mut probe: F) -> ProbeResult<Option<T>>
    where
        F: FnMut() -> ProbeResult<Option<T>>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = probe()? {
                return Ok(Some(value));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            std::thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    /// Wait for `locator` to satisfy `condition`, `None` on timeout.
    ///
    /// A stale handle during a check counts as "not yet".
    ///
    /// # Errors
    ///
    /// Propagates driver failures other than staleness.
    pub fn until(
        &self,
        locator: &Locator,
        condition: Condition,
        timeout: Duration,
    ) -> ProbeResult<Option<D::Element>> {
        let start = Instant::now();
        let found = self.poll(timeout, || {
            let Some(element) = self.driver.find_element(locator)? else {
                return Ok(None);
            };
            match condition.holds(&element) {
                Ok(true) => Ok(Some(element)),
                Ok(false) => Ok(None),
                Err(e) if e.is_stale() => Ok(None),
                Err(e) => Err(e),
            }
        })?;
        if found.is_some() {
            debug!(
                %locator,
                %condition,
                elapsed_ms = millis(start.elapsed()),
                "element resolved"
            );
        }
        Ok(found)
    }

    /// Wait for `locator` to satisfy `condition`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ElementNotFound`] (presence) or
    /// [`ProbeError::ElementNotClickable`] (visible/clickable) carrying the
    /// locator and timeout when the deadline passes.
    pub fn require(
        &self,
        locator: &Locator,
        condition: Condition,
        timeout: Duration,
    ) -> ProbeResult<D::Element> {
        match self.until(locator, condition, timeout)? {
            Some(element) => Ok(element),
            None => {
                error!(%locator, %condition, timeout_ms = millis(timeout), "wait timed out");
                Err(condition.timeout_error(locator, timeout))
            }
        }
    }

    /// Wait until the element is attached to the DOM
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ElementNotFound`] on timeout.
    pub fn for_presence(&self, locator: &Locator, timeout: Duration) -> ProbeResult<D::Element> {
        self.require(locator, Condition::Presence, timeout)
    }

    /// Wait until the element is rendered
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ElementNotClickable`] on timeout.
    pub fn for_visible(&self, locator: &Locator, timeout: Duration) -> ProbeResult<D::Element> {
        self.require(locator, Condition::Visible, timeout)
    }

    /// Wait until the element is rendered and enabled
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ElementNotClickable`] on timeout.
    pub fn for_clickable(&self, locator: &Locator, timeout: Duration) -> ProbeResult<D::Element> {
        self.require(locator, Condition::Clickable, timeout)
    }

    /// Wait until the current URL contains `fragment`
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub fn for_url_containing(&self, fragment: &str, timeout: Duration) -> ProbeResult<bool> {
        let matched = self.poll(timeout, || {
            let url = self.driver.current_url()?;
            Ok(url.contains(fragment).then_some(()))
        })?;
        Ok(matched.is_some())
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// TESTS
// =============================================================================
