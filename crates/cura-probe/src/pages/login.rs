//! Landing and login page.

use crate::config::Credentials;
use crate::driver::{Driver, Element};
use crate::locator::Locator;
use crate::page::{BasePage, Page};
use crate::result::ProbeResult;
use crate::wait::Condition;
use std::fmt;
use std::time::Duration;
use tracing::info;

/// "Make Appointment" button on the landing page
pub const MAKE_APPOINTMENT: Locator = Locator::link_text("Make Appointment");
/// Username field
pub const USERNAME: Locator = Locator::id("txt-username");
/// Password field
pub const PASSWORD: Locator = Locator::id("txt-password");
/// Login button
pub const LOGIN_BTN: Locator = Locator::id("btn-login");
/// Error banner shown after a rejected login
pub const ERROR_MESSAGE: Locator = Locator::css(".text-danger");
/// Facility select; its presence means login succeeded
pub const APPOINTMENT_FORM: Locator = Locator::id("combo_facility");

/// Login page
pub struct LoginPage<'d, D: Driver> {
    base: BasePage<'d, D>,
}

impl<D: Driver> fmt::Debug for LoginPage<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginPage").field("base", &self.base).finish()
    }
}

impl<'d, D: Driver> Page<'d, D> for LoginPage<'d, D> {
    const NAME: &'static str = "login";
    const ANCHOR: Locator = USERNAME;

    fn from_base(base: BasePage<'d, D>) -> Self {
        Self { base }
    }

    fn base(&self) -> &BasePage<'d, D> {
        &self.base
    }
}

impl<'d, D: Driver> LoginPage<'d, D> {
    /// Create with default wait and retry settings
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self::from_base(BasePage::new(driver))
    }

    /// Open the login form from the landing page
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::InteractionFailed`] if the button
    /// cannot be clicked.
    pub fn go_to_login(&self) -> ProbeResult<()> {
        self.click(&MAKE_APPOINTMENT, "Make Appointment button")
    }

    /// Fill the form and submit
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::InteractionFailed`] for the first
    /// field or button that fails.
    pub fn login(&self, username: &str, password: &str) -> ProbeResult<()> {
        info!(username, "logging in");
        self.type_text(&USERNAME, username, "username field")?;
        self.type_text(&PASSWORD, password, "password field")?;
        self.click(&LOGIN_BTN, "login button")
    }

    /// Log in and wait for the appointment form
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::ElementNotFound`] for
    /// [`APPOINTMENT_FORM`] if the site never shows it.
    pub fn login_and_wait(&self, credentials: &Credentials) -> ProbeResult<()> {
        self.login(&credentials.username, &credentials.password)?;
        self.resolve_presence(&APPOINTMENT_FORM)?;
        info!("login successful");
        Ok(())
    }

    /// Error banner text, if one appears within `timeout`
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub fn error_text(&self, timeout: Duration) -> ProbeResult<Option<String>> {
        match self
            .base
            .waiter()
            .until(&ERROR_MESSAGE, Condition::Presence, timeout)?
        {
            Some(banner) => Ok(Some(banner.text()?.trim().to_string())),
            None => Ok(None),
        }
    }
}
