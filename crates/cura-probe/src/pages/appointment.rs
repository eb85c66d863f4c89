//! Appointment booking form.

use crate::config::{AppointmentConfig, HealthcareProgram};
use crate::driver::{select_by_visible_text, Driver, Element};
use crate::locator::Locator;
use crate::page::{BasePage, Page};
use crate::result::ProbeResult;
use std::fmt;
use tracing::{debug, info};

/// Facility select
pub const FACILITY: Locator = Locator::id("combo_facility");
/// "Apply for hospital readmission" checkbox (id misspelled on the site)
pub const READMISSION: Locator = Locator::id("chk_hospotal_readmission");
/// Medicare radio
pub const PROGRAM_MEDICARE: Locator = Locator::id("radio_program_medicare");
/// Medicaid radio
pub const PROGRAM_MEDICAID: Locator = Locator::id("radio_program_medicaid");
/// "None" radio
pub const PROGRAM_NONE: Locator = Locator::id("radio_program_none");
/// Visit date input
pub const VISIT_DATE: Locator = Locator::id("txt_visit_date");
/// Comment textarea
pub const COMMENT: Locator = Locator::id("txt_comment");
/// Submit button
pub const BOOK_BTN: Locator = Locator::id("btn-book-appointment");

/// Radio button for a program
#[must_use]
pub const fn program_locator(program: HealthcareProgram) -> Locator {
    match program {
        HealthcareProgram::Medicare => PROGRAM_MEDICARE,
        HealthcareProgram::Medicaid => PROGRAM_MEDICAID,
        HealthcareProgram::None => PROGRAM_NONE,
    }
}

/// Appointment page
pub struct AppointmentPage<'d, D: Driver> {
    base: BasePage<'d, D>,
}

impl<D: Driver> fmt::Debug for AppointmentPage<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppointmentPage").field("base", &self.base).finish()
    }
}

impl<'d, D: Driver> Page<'d, D> for AppointmentPage<'d, D> {
    const NAME: &'static str = "appointment";
    const ANCHOR: Locator = FACILITY;

    fn from_base(base: BasePage<'d, D>) -> Self {
        Self { base }
    }

    fn base(&self) -> &BasePage<'d, D> {
        &self.base
    }
}

impl<'d, D: Driver> AppointmentPage<'d, D> {
    /// Create with default wait and retry settings
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self::from_base(BasePage::new(driver))
    }

    /// Select the facility by its visible option text
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::OptionNotFound`] if the select lacks it.
    pub fn select_facility(&self, config: &AppointmentConfig) -> ProbeResult<()> {
        let select = self.resolve_presence(&FACILITY)?;
        select_by_visible_text(&select, config.facility.visible_text())?;
        info!(facility = %config.facility, "facility selected");
        Ok(())
    }

    /// Make the readmission checkbox match `wanted`, clicking only on change
    ///
    /// # Errors
    ///
    /// Propagates lookup and click failures.
    pub fn set_readmission(&self, wanted: bool) -> ProbeResult<()> {
        let checkbox = self.resolve_presence(&READMISSION)?;
        if checkbox.is_selected()? == wanted {
            debug!(wanted, "readmission already set");
            return Ok(());
        }
        self.click(&READMISSION, "readmission checkbox")?;
        info!(readmission = wanted, "readmission toggled");
        Ok(())
    }

    /// Choose the program radio
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProbeError::InteractionFailed`] if the radio
    /// cannot be clicked.
    pub fn select_program(&self, program: HealthcareProgram) -> ProbeResult<()> {
        self.click(&program_locator(program), &format!("{program} program radio"))
    }

    /// Fill every field and submit.
    ///
    /// Order: facility, readmission, program, visit date, comment, submit.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error; later steps are not run.
    pub fn book_appointment(&self, config: &AppointmentConfig) -> ProbeResult<()> {
        info!(
            facility = %config.facility,
            program = %config.program,
            visit_date = %config.visit_date_text(),
            "booking appointment"
        );
        self.select_facility(config)?;
        self.set_readmission(config.readmission)?;
        self.select_program(config.program)?;
        self.type_text(&VISIT_DATE, &config.visit_date_text(), "visit date field")?;
        self.type_text(&COMMENT, &config.comment, "comment field")?;
        self.click(&BOOK_BTN, "Book Appointment button")
    }
}
