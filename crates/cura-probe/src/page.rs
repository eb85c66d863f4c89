//! Page Object Model base.
//!
//! [`BasePage`] holds the shared session reference plus the wait and retry
//! settings every page uses. Concrete pages wrap a `BasePage` and implement
//! [`Page`], which provides the resolve/click/type capabilities by
//! delegation.
//!
//! ```ignore
//! let base = BasePage::new(&driver).with_options(WaitOptions::new().with_timeout(15_000));
//! let login: LoginPage<_> = base.page();
//! login.go_to_login()?;
//! login.login("John Doe", "ThisIsNotAPassword")?;
//! ```

use crate::driver::{Driver, Element};
use crate::interaction::{retry, InteractionPolicy};
use crate::locator::Locator;
use crate::result::ProbeResult;
use crate::wait::{Condition, WaitOptions, Waiter};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared building block for every page object.
///
/// Cheap to copy: a session reference and two small settings structs.
pub struct BasePage<'d, D: Driver> {
    driver: &'d D,
    options: WaitOptions,
    policy: InteractionPolicy,
}

impl<D: Driver> Clone for BasePage<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: Driver> Copy for BasePage<'_, D> {}

impl<D: Driver> fmt::Debug for BasePage<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasePage")
            .field("options", &self.options)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<'d, D: Driver> BasePage<'d, D> {
    /// Create a base page with default wait and retry settings
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self {
            driver,
            options: WaitOptions::default(),
            policy: InteractionPolicy::default(),
        }
    }

    /// Set wait options
    #[must_use]
    pub const fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    /// Set retry policy for clicks
    #[must_use]
    pub const fn with_policy(mut self, policy: InteractionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build a concrete page sharing this base
    #[must_use]
    pub fn page<P: Page<'d, D>>(self) -> P {
        P::from_base(self)
    }

    /// Get the session
    #[must_use]
    pub const fn driver(&self) -> &'d D {
        self.driver
    }

    /// Get the wait options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Get the retry policy
    #[must_use]
    pub const fn policy(&self) -> &InteractionPolicy {
        &self.policy
    }

    /// Default wait timeout
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.options.timeout()
    }

    /// A waiter bound to this page's session and poll interval
    #[must_use]
    pub fn waiter(&self) -> Waiter<'d, D> {
        Waiter::new(self.driver, &self.options)
    }

    /// Wait until `locator` is attached to the DOM
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::ElementNotFound`] on timeout.
    pub fn wait_for_presence(&self, locator: &Locator, timeout: Duration) -> ProbeResult<D::Element> {
        self.waiter().for_presence(locator, timeout)
    }

    /// Wait until `locator` is displayed and enabled
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::ElementNotClickable`] on timeout.
    pub fn wait_for_clickable(&self, locator: &Locator, timeout: Duration) -> ProbeResult<D::Element> {
        self.waiter().for_clickable(locator, timeout)
    }

    /// Click with the page's retry policy.
    ///
    /// Every attempt re-resolves the locator.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::InteractionFailed`] once all attempts fail.
    pub fn click(&self, locator: &Locator, description: &str) -> ProbeResult<()> {
        self.click_with_attempts(locator, description, self.policy.max_attempts)
    }

    /// Click with an explicit attempt budget
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::InteractionFailed`] once all attempts fail.
    pub fn click_with_attempts(
        &self,
        locator: &Locator,
        description: &str,
        max_attempts: u32,
    ) -> ProbeResult<()> {
        let policy = self.policy.with_max_attempts(max_attempts);
        retry(&policy, description, |attempt| {
            let element = self.wait_for_clickable(locator, self.default_timeout())?;
            element.click()?;
            info!(element = description, %locator, attempt, "clicked");
            Ok(())
        })
    }

    /// Type into a field, clearing it first when `clear_first` is set.
    ///
    /// Typing is not retried.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::InteractionFailed`] with one attempt.
    pub fn type_text(
        &self,
        locator: &Locator,
        text: &str,
        description: &str,
        clear_first: bool,
    ) -> ProbeResult<()> {
        retry(&InteractionPolicy::once(), description, |_| {
            let element = self.wait_for_presence(locator, self.default_timeout())?;
            if clear_first {
                element.clear()?;
            }
            element.send_keys(text)?;
            info!(element = description, %locator, chars = text.chars().count(), "typed");
            Ok(())
        })
    }

    /// Click an element that may legitimately be absent.
    ///
    /// Returns `Ok(false)` when nothing clickable appears within `timeout`.
    ///
    /// # Errors
    ///
    /// Propagates a failed click on an element that did appear.
    pub fn try_click_optional(
        &self,
        locator: &Locator,
        timeout: Duration,
        description: &str,
    ) -> ProbeResult<bool> {
        match self.waiter().until(locator, Condition::Clickable, timeout)? {
            Some(element) => {
                element.click()?;
                info!(element = description, %locator, "clicked optional element");
                Ok(true)
            }
            None => {
                debug!(element = description, %locator, "optional element absent");
                Ok(false)
            }
        }
    }

    /// Immediate presence check, no waiting
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub fn is_present(&self, locator: &Locator) -> ProbeResult<bool> {
        Ok(self.driver.find_element(locator)?.is_some())
    }

    /// Wait for presence and read the element's text
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::ElementNotFound`] on timeout.
    pub fn text_of(&self, locator: &Locator, timeout: Duration) -> ProbeResult<String> {
        let element = self.wait_for_presence(locator, timeout)?;
        Ok(element.text()?.trim().to_string())
    }

    /// Like [`Self::text_of`], but returns `fallback` on timeout
    ///
    /// # Errors
    ///
    /// Propagates failures other than a wait timeout or stale handle.
    pub fn text_or(&self, locator: &Locator, timeout: Duration, fallback: &str) -> ProbeResult<String> {
        match self.text_of(locator, timeout) {
            Ok(text) => Ok(text),
            Err(e) if e.is_timeout() || e.is_stale() => {
                warn!(%locator, error = %e, fallback, "using fallback text");
                Ok(fallback.to_string())
            }
            Err(e) => Err(e),
        }
    }
}

/// Capabilities shared by every page.
///
/// Implementors supply [`Page::from_base`], [`Page::base`] and the anchor
/// locator that proves the page is loaded; everything else delegates to
/// [`BasePage`].
pub trait Page<'d, D: Driver + 'd> {
    /// Page name for logging
    const NAME: &'static str;

    /// Element whose presence means the page is loaded
    const ANCHOR: Locator;

    /// Wrap a base page
    fn from_base(base: BasePage<'d, D>) -> Self
    where
        Self: Sized;

    /// Get the shared base
    fn base(&self) -> &BasePage<'d, D>;

    /// Resolve `locator` once it is attached
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::ElementNotFound`] on timeout.
    fn resolve_presence(&self, locator: &Locator) -> ProbeResult<D::Element> {
        let base = self.base();
        base.wait_for_presence(locator, base.default_timeout())
    }

    /// Resolve `locator` once it is displayed and enabled
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::ElementNotClickable`] on timeout.
    fn resolve_clickable(&self, locator: &Locator) -> ProbeResult<D::Element> {
        let base = self.base();
        base.wait_for_clickable(locator, base.default_timeout())
    }

    /// Click with retries
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::InteractionFailed`] once all attempts fail.
    fn click(&self, locator: &Locator, description: &str) -> ProbeResult<()> {
        self.base().click(locator, description)
    }

    /// Clear then type
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::InteractionFailed`].
    fn type_text(&self, locator: &Locator, text: &str, description: &str) -> ProbeResult<()> {
        self.base().type_text(locator, text, description, true)
    }

    /// Click `locator` if it becomes clickable within `timeout`
    ///
    /// # Errors
    ///
    /// Propagates a failed click on an element that did appear.
    fn try_click_optional(
        &self,
        locator: &Locator,
        timeout: Duration,
        description: &str,
    ) -> ProbeResult<bool> {
        self.base().try_click_optional(locator, timeout, description)
    }

    /// Whether `locator` matches right now
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    fn is_present(&self, locator: &Locator) -> ProbeResult<bool> {
        self.base().is_present(locator)
    }

    /// Whether the anchor element is present right now
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    fn is_loaded(&self) -> ProbeResult<bool> {
        self.is_present(&Self::ANCHOR)
    }

    /// Wait for the anchor element
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::ElementNotFound`] on timeout.
    fn wait_until_loaded(&self) -> ProbeResult<()> {
        debug!(page = Self::NAME, "waiting for page");
        self.resolve_presence(&Self::ANCHOR).map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};
    use crate::result::ProbeError;

    fn fast_base(driver: &MockDriver) -> BasePage<'_, MockDriver> {
        BasePage::new(driver)
            .with_options(WaitOptions::new().with_timeout(60).with_poll_interval(5))
            .with_policy(InteractionPolicy::new().with_backoff(1))
    }

    mod click_tests {
        use super::*;

        #[test]
        fn test_click_succeeds_first_try() {
            let driver = MockDriver::new();
            let btn = driver.add_element(Locator::id("btn-login"), MockElement::new("button"));
            fast_base(&driver).click(&Locator::id("btn-login"), "login button").unwrap();
            assert_eq!(btn.click_count(), 1);
        }

        #[test]
        fn test_click_recovers_from_transient_failure() {
            let driver = MockDriver::new();
            let btn = driver.add_element(
                Locator::id("btn-login"),
                MockElement::new("button").fail_clicks(2),
            );
            fast_base(&driver).click(&Locator::id("btn-login"), "login button").unwrap();
            assert_eq!(btn.click_count(), 1);
            assert_eq!(driver.lookup_count(&Locator::id("btn-login")), 3);
        }

        #[test]
        fn test_click_attempts_are_bounded() {
            let driver = MockDriver::new();
            driver.add_element(
                Locator::id("btn-book-appointment"),
                MockElement::new("button").fail_clicks(u32::MAX),
            );
            let err = fast_base(&driver)
                .click_with_attempts(&Locator::id("btn-book-appointment"), "book button", 2)
                .unwrap_err();
            assert!(matches!(err, ProbeError::InteractionFailed { attempts: 2, .. }));
            let failed = driver.calls().iter().filter(|c| c.starts_with("click-failed")).count();
            assert_eq!(failed, 2);
        }

        #[test]
        fn test_click_on_missing_element_wraps_timeout() {
            let driver = MockDriver::new();
            let err = fast_base(&driver)
                .with_policy(InteractionPolicy::once())
                .click(&Locator::id("nope"), "ghost")
                .unwrap_err();
            match err {
                ProbeError::InteractionFailed { cause, attempts, .. } => {
                    assert_eq!(attempts, 1);
                    assert!(matches!(*cause, ProbeError::ElementNotClickable { .. }));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    mod type_tests {
        use super::*;

        #[test]
        fn test_type_clears_first() {
            let driver = MockDriver::new();
            let field = driver.add_element(
                Locator::id("txt-username"),
                MockElement::new("input").with_value("stale"),
            );
            let base = fast_base(&driver);
            base.type_text(&Locator::id("txt-username"), "John Doe", "username", true)
                .unwrap();
            assert_eq!(field.value(), "John Doe");
        }

        #[test]
        fn test_type_without_clear_appends() {
            let driver = MockDriver::new();
            let field = driver.add_element(
                Locator::id("txt_comment"),
                MockElement::new("textarea").with_value("a"),
            );
            fast_base(&driver)
                .type_text(&Locator::id("txt_comment"), "b", "comment", false)
                .unwrap();
            assert_eq!(field.value(), "ab");
        }

        #[test]
        fn test_type_failure_is_single_attempt() {
            let driver = MockDriver::new();
            let err = fast_base(&driver)
                .type_text(&Locator::id("missing"), "x", "missing field", true)
                .unwrap_err();
            assert!(matches!(err, ProbeError::InteractionFailed { attempts: 1, .. }));
            assert!(!driver.was_called("send_keys"));
        }
    }

    mod optional_tests {
        use super::*;

        #[test]
        fn test_optional_absent_is_not_error() {
            let driver = MockDriver::new();
            let clicked = fast_base(&driver)
                .try_click_optional(&Locator::xpath("//button"), Duration::from_millis(10), "popup")
                .unwrap();
            assert!(!clicked);
        }

        #[test]
        fn test_optional_present_is_clicked() {
            let driver = MockDriver::new();
            let ok = driver.add_element(Locator::xpath("//button"), MockElement::new("button"));
            let clicked = fast_base(&driver)
                .try_click_optional(&Locator::xpath("//button"), Duration::from_millis(10), "popup")
                .unwrap();
            assert!(clicked);
            assert_eq!(ok.click_count(), 1);
        }

        #[test]
        fn test_optional_click_failure_propagates() {
            let driver = MockDriver::new();
            driver.add_element(
                Locator::xpath("//button"),
                MockElement::new("button").fail_clicks(1),
            );
            assert!(fast_base(&driver)
                .try_click_optional(&Locator::xpath("//button"), Duration::from_millis(10), "popup")
                .is_err());
        }
    }

    mod text_tests {
        use super::*;

        #[test]
        fn test_text_or_fallback() {
            let driver = MockDriver::new();
            driver.add_element(Locator::id("facility"), MockElement::new("p").with_text(" Tokyo "));
            let base = fast_base(&driver);
            let timeout = Duration::from_millis(10);
            assert_eq!(base.text_or(&Locator::id("facility"), timeout, "N/A").unwrap(), "Tokyo");
            assert_eq!(base.text_or(&Locator::id("comment"), timeout, "N/A").unwrap(), "N/A");
        }
    }
}
