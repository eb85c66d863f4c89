//! Side menu and logout.

use crate::driver::Driver;
use crate::locator::Locator;
use crate::page::{BasePage, Page};
use crate::result::ProbeResult;
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Hamburger toggle
pub const MENU_TOGGLE: Locator = Locator::xpath("//*[@id=\"menu-toggle\"]");
/// Logout link inside the menu
pub const LOGOUT: Locator = Locator::link_text("Logout");
/// OK button of Chrome's "change your password" prompt
pub const PASSWORD_POPUP_OK: Locator = Locator::xpath("//button[normalize-space()='OK']");

/// How long to look for the password prompt
pub const POPUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Menu page
pub struct MenuPage<'d, D: Driver> {
    base: BasePage<'d, D>,
}

impl<D: Driver> fmt::Debug for MenuPage<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuPage").field("base", &self.base).finish()
    }
}

impl<'d, D: Driver> Page<'d, D> for MenuPage<'d, D> {
    const NAME: &'static str = "menu";
    const ANCHOR: Locator = MENU_TOGGLE;

    fn from_base(base: BasePage<'d, D>) -> Self {
        Self { base }
    }

    fn base(&self) -> &BasePage<'d, D> {
        &self.base
    }
}

impl<'d, D: Driver> MenuPage<'d, D> {
    /// Create with default wait and retry settings
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self::from_base(BasePage::new(driver))
    }

    /// Dismiss the password prompt if it shows up within [`POPUP_TIMEOUT`]
    /// (or the page's wait timeout, if shorter).
    ///
    /// Returns whether a prompt was dismissed.
    ///
    /// # Errors
    ///
    /// Propagates a failed click on a prompt that did appear.
    pub fn dismiss_password_popup(&self) -> ProbeResult<bool> {
        let timeout = POPUP_TIMEOUT.min(self.base.default_timeout());
        self.base
            .try_click_optional(&PASSWORD_POPUP_OK, timeout, "password prompt OK button")
    }

    /// Open the menu
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::InteractionFailed`] if the toggle
    /// cannot be clicked.
    pub fn open(&self) -> ProbeResult<()> {
        self.click(&MENU_TOGGLE, "menu toggle")
    }

    /// Dismiss any prompt, open the menu and log out
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::InteractionFailed`] for the toggle or
    /// the logout link.
    pub fn logout(&self) -> ProbeResult<()> {
        self.dismiss_password_popup()?;
        self.open()?;
        self.click(&LOGOUT, "logout link")?;
        info!("logged out");
        Ok(())
    }
}
