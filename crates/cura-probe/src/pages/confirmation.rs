//! Appointment confirmation page.

use crate::config::AppointmentConfig;
use crate::driver::Driver;
use crate::locator::Locator;
use crate::page::{BasePage, Page};
use crate::result::ProbeResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// "Appointment Confirmation" heading
pub const HEADER: Locator = Locator::xpath("//h2[contains(text(), 'Appointment Confirmation')]");
/// Facility value
pub const FACILITY: Locator = Locator::id("facility");
/// Readmission value ("Yes"/"No")
pub const READMISSION: Locator = Locator::id("hospital_readmission");
/// Program value
pub const PROGRAM: Locator = Locator::id("program");
/// Visit date value
pub const VISIT_DATE: Locator = Locator::id("visit_date");
/// Comment value
pub const COMMENT: Locator = Locator::id("comment");

/// Placeholder for fields that never appeared
pub const NOT_AVAILABLE: &str = "N/A";

/// Values shown after a successful booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    /// Facility name
    pub facility: String,
    /// "Yes" or "No"
    pub readmission: String,
    /// Program label
    pub program: String,
    /// Visit date as `dd/mm/YYYY`
    pub visit_date: String,
    /// Comment
    pub comment: String,
}

/// A confirmation field that differs from what was booked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMismatch {
    /// Field name
    pub field: &'static str,
    /// Value entered into the form
    pub expected: String,
    /// Value on the confirmation page
    pub actual: String,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {:?}, got {:?}", self.field, self.expected, self.actual)
    }
}

impl AppointmentDetails {
    /// Compare against the booked values
    #[must_use]
    pub fn mismatches(&self, booked: &AppointmentConfig) -> Vec<FieldMismatch> {
        let pairs = [
            ("facility", booked.facility.visible_text().to_string(), &self.facility),
            ("readmission", booked.readmission_text().to_string(), &self.readmission),
            ("program", booked.program.label().to_string(), &self.program),
            ("visit_date", booked.visit_date_text(), &self.visit_date),
            ("comment", booked.comment.trim().to_string(), &self.comment),
        ];
        pairs
            .into_iter()
            .filter(|(_, expected, actual)| expected != *actual)
            .map(|(field, expected, actual)| FieldMismatch {
                field,
                expected,
                actual: actual.clone(),
            })
            .collect()
    }

    /// Whether every field matches
    #[must_use]
    pub fn matches(&self, booked: &AppointmentConfig) -> bool {
        self.mismatches(booked).is_empty()
    }
}

/// Confirmation page
pub struct ConfirmationPage<'d, D: Driver> {
    base: BasePage<'d, D>,
}

impl<D: Driver> fmt::Debug for ConfirmationPage<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationPage").field("base", &self.base).finish()
    }
}

impl<'d, D: Driver> Page<'d, D> for ConfirmationPage<'d, D> {
    const NAME: &'static str = "confirmation";
    const ANCHOR: Locator = HEADER;

    fn from_base(base: BasePage<'d, D>) -> Self {
        Self { base }
    }

    fn base(&self) -> &BasePage<'d, D> {
        &self.base
    }
}

impl<'d, D: Driver> ConfirmationPage<'d, D> {
    /// Create with default wait and retry settings
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self::from_base(BasePage::new(driver))
    }

    /// Wait for the heading, then read all five fields.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::ElementNotFound`] for the heading or
    /// the first missing field.
    pub fn details(&self) -> ProbeResult<AppointmentDetails> {
        self.wait_until_loaded()?;
        let timeout = self.base.default_timeout();
        let read = |locator: &Locator| self.base.text_of(locator, timeout);
        let details = AppointmentDetails {
            facility: read(&FACILITY)?,
            readmission: read(&READMISSION)?,
            program: read(&PROGRAM)?,
            visit_date: read(&VISIT_DATE)?,
            comment: read(&COMMENT)?,
        };
        info!(?details, "appointment confirmed");
        Ok(details)
    }

    /// Read what is there within `timeout` per field; missing fields are
    /// reported as [`NOT_AVAILABLE`].
    ///
    /// # Errors
    ///
    /// Propagates driver failures other than timeouts.
    pub fn details_lenient(&self, timeout: Duration) -> ProbeResult<AppointmentDetails> {
        let read = |locator: &Locator| self.base.text_or(locator, timeout, NOT_AVAILABLE);
        Ok(AppointmentDetails {
            facility: read(&FACILITY)?,
            readmission: read(&READMISSION)?,
            program: read(&PROGRAM)?,
            visit_date: read(&VISIT_DATE)?,
            comment: read(&COMMENT)?,
        })
    }
}
