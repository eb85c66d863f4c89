//! Session lifetime and the end-to-end booking scenario.
//!
//! ```text
//! navigate ─► login ─► book ─► confirm ─► screenshot ─► logout
//!    │          │        │        │
//!    └──────────┴────────┴────────┴──► <step>_error_<ts>.png, then Err
//! ```

use crate::config::ProbeConfig;
use crate::driver::Driver;
use crate::locator::Locator;
use crate::page::{BasePage, Page};
use crate::pages::{AppointmentDetails, AppointmentPage, ConfirmationPage, LoginPage, MenuPage};
use crate::result::ProbeResult;
use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Document body; present once the first page has rendered
pub const BODY: Locator = Locator::tag_name("body");

/// Per-field timeout when reading the confirmation page
pub const CONFIRMATION_FIELD_TIMEOUT: Duration = Duration::from_secs(5);

/// File name stamp, e.g. `20250725_143000`
#[must_use]
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

// =============================================================================
// SESSION
// =============================================================================

/// Owns a driver and quits it exactly once.
///
/// Dropping without [`Session::close`] still quits; a failing quit is
/// logged, never raised from `Drop`.
pub struct Session<D: Driver> {
    driver: D,
    released: bool,
}

impl<D: Driver> fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl<D: Driver> Session<D> {
    /// Take ownership of a driver
    #[must_use]
    pub const fn new(driver: D) -> Self {
        Self {
            driver,
            released: false,
        }
    }

    /// Borrow the driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Base page over this session
    #[must_use]
    pub fn base_page(&self, config: &ProbeConfig) -> BasePage<'_, D> {
        BasePage::new(&self.driver)
            .with_options(config.wait)
            .with_policy(config.interaction)
    }

    /// Save a screenshot as `<dir>/<name>`, creating `dir` if needed
    ///
    /// # Errors
    ///
    /// Returns an I/O or driver error.
    pub fn capture_screenshot(&self, dir: &Path, name: &str) -> ProbeResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(name);
        self.driver.save_screenshot(&path)?;
        info!(path = %path.display(), "screenshot saved");
        Ok(path)
    }

    /// Best-effort `<step>_error_<timestamp>.png`
    pub fn failure_screenshot(&self, dir: &Path, step: &str) -> Option<PathBuf> {
        let name = format!("{step}_error_{}.png", timestamp());
        match self.capture_screenshot(dir, &name) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(step, error = %e, "could not capture failure screenshot");
                None
            }
        }
    }

    /// Quit the driver now
    ///
    /// # Errors
    ///
    /// Returns the driver's quit error. The session counts as released
    /// either way.
    pub fn close(mut self) -> ProbeResult<()> {
        self.release()
    }

    fn release(&mut self) -> ProbeResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        info!("closing browser session");
        self.driver.quit()
    }
}

impl<D: Driver> Drop for Session<D> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "failed to quit browser session");
        }
    }
}

// =============================================================================
// BOOKING SCENARIO
// =============================================================================

/// Result of a successful booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingOutcome {
    /// Confirmation page contents
    pub details: AppointmentDetails,
    /// Confirmation screenshot
    pub screenshot: PathBuf,
}

/// Login, book, confirm and log out on one session
#[derive(Debug, Clone, Copy)]
pub struct BookingScenario<'c> {
    config: &'c ProbeConfig,
    logout: bool,
}

impl<'c> BookingScenario<'c> {
    /// Create a scenario over `config`
    #[must_use]
    pub const fn new(config: &'c ProbeConfig) -> Self {
        Self {
            config,
            logout: true,
        }
    }

    /// Whether to log out at the end (default true)
    #[must_use]
    pub const fn with_logout(mut self, logout: bool) -> Self {
        self.logout = logout;
        self
    }

    /// Run every step in order.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error after saving a failure
    /// screenshot.
    pub fn run<D: Driver>(&self, session: &Session<D>) -> ProbeResult<BookingOutcome> {
        let config = self.config;
        config.appointment.validate()?;
        let base = session.base_page(config);
        let login: LoginPage<'_, D> = base.page();
        let appointment: AppointmentPage<'_, D> = base.page();
        let confirmation: ConfirmationPage<'_, D> = base.page();
        let menu: MenuPage<'_, D> = base.page();

        self.step(session, "navigate", || {
            session.driver().navigate(&config.site.base_url)?;
            base.wait_for_presence(&BODY, base.default_timeout()).map(|_| ())
        })?;
        self.step(session, "login", || {
            login.go_to_login()?;
            login.login_and_wait(&config.credentials)
        })?;
        self.step(session, "booking", || {
            appointment.book_appointment(&config.appointment)
        })?;
        let details = self.step(session, "confirmation", || {
            confirmation.wait_until_loaded()?;
            confirmation.details_lenient(CONFIRMATION_FIELD_TIMEOUT.min(base.default_timeout()))
        })?;
        for mismatch in details.mismatches(&config.appointment) {
            warn!(%mismatch, "confirmation differs from booking");
        }
        let screenshot = self.step(session, "screenshot", || {
            session.capture_screenshot(
                &config.artifacts_dir,
                &format!("cura_screenshot_{}.png", timestamp()),
            )
        })?;
        if self.logout {
            self.step(session, "logout", || menu.logout())?;
        }
        info!(facility = %details.facility, visit_date = %details.visit_date, "booking complete");
        Ok(BookingOutcome {
            details,
            screenshot,
        })
    }

    fn step<D: Driver, T>(
        &self,
        session: &Session<D>,
        name: &str,
        action: impl FnOnce() -> ProbeResult<T>,
    ) -> ProbeResult<T> {
        info!(step = name, "starting step");
        action().map_err(|e| {
            error!(step = name, error = %e, "step failed");
            session.failure_screenshot(&self.config.artifacts_dir, name);
            e
        })
    }
}
