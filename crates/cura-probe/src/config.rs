//! Typed configuration.
//!
//! A single YAML document maps onto [`ProbeConfig`]. Every section has
//! defaults so an empty file is valid; the `appointment` section, when
//! present, must name `facility` and `healthcare_program`.

use crate::driver::DriverConfig;
use crate::interaction::InteractionPolicy;
use crate::logging::LogConfig;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::WaitOptions;
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Demo site root
pub const DEFAULT_BASE_URL: &str = "https://katalon-demo-cura.herokuapp.com/";

/// Date format used by the appointment form
pub const VISIT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Default artifacts directory (screenshots)
pub const DEFAULT_ARTIFACTS_DIR: &str = "target/cura-artifacts";

// =============================================================================
// APPOINTMENT
// =============================================================================

/// Healthcare facility offered by the booking form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facility {
    /// Tokyo CURA Healthcare Center
    #[serde(rename = "Tokyo CURA Healthcare Center", alias = "tokyo", alias = "Tokyo")]
    Tokyo,
    /// Hongkong CURA Healthcare Center
    #[serde(
        rename = "Hongkong CURA Healthcare Center",
        alias = "hongkong",
        alias = "Hongkong"
    )]
    Hongkong,
    /// Seoul CURA Healthcare Center
    #[serde(rename = "Seoul CURA Healthcare Center", alias = "seoul", alias = "Seoul")]
    Seoul,
}

impl Facility {
    /// All facilities, in form order
    pub const ALL: [Self; 3] = [Self::Tokyo, Self::Hongkong, Self::Seoul];

    /// Visible option text in the facility select
    #[must_use]
    pub const fn visible_text(&self) -> &'static str {
        match self {
            Self::Tokyo => "Tokyo CURA Healthcare Center",
            Self::Hongkong => "Hongkong CURA Healthcare Center",
            Self::Seoul => "Seoul CURA Healthcare Center",
        }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.visible_text())
    }
}

impl FromStr for Facility {
    type Err = ProbeError;

    fn from_str(s: &str) -> ProbeResult<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| {
                f.visible_text().eq_ignore_ascii_case(s)
                    || f.visible_text()
                        .split_whitespace()
                        .next()
                        .is_some_and(|city| city.eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| ProbeError::config(format!("unknown facility {s:?}")))
    }
}

/// Healthcare program radio button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthcareProgram {
    /// Medicare
    #[serde(alias = "medicare")]
    Medicare,
    /// Medicaid
    #[serde(alias = "medicaid")]
    Medicaid,
    /// No program
    #[serde(alias = "none")]
    None,
}

impl HealthcareProgram {
    /// All programs, in form order
    pub const ALL: [Self; 3] = [Self::Medicare, Self::Medicaid, Self::None];

    /// Label shown on the form and the confirmation page
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Medicare => "Medicare",
            Self::Medicaid => "Medicaid",
            Self::None => "None",
        }
    }
}

impl fmt::Display for HealthcareProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HealthcareProgram {
    type Err = ProbeError;

    fn from_str(s: &str) -> ProbeResult<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProbeError::config(format!("unknown healthcare program {s:?}")))
    }
}

fn tomorrow() -> NaiveDate {
    Local::now().date_naive() + ChronoDuration::days(1)
}

fn default_comment() -> String {
    "Automated appointment booking via cura-probe".to_string()
}

/// Parse `dd/mm/YYYY` or ISO `YYYY-mm-dd`
///
/// # Errors
///
/// Returns [`ProbeError::InvalidConfig`] for any other shape.
pub fn parse_visit_date(s: &str) -> ProbeResult<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, VISIT_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|e| ProbeError::config(format!("invalid visit date {s:?}: {e}")))
}

mod visit_date_format {
    use super::{parse_visit_date, VISIT_DATE_FORMAT};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(VISIT_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_visit_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// Values entered into the booking form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentConfig {
    /// Facility to select
    pub facility: Facility,
    /// Whether to tick "Apply for hospital readmission"
    #[serde(default)]
    pub readmission: bool,
    /// Program radio to select
    #[serde(rename = "healthcare_program", alias = "program")]
    pub program: HealthcareProgram,
    /// Visit date
    #[serde(default = "tomorrow", with = "visit_date_format")]
    pub visit_date: NaiveDate,
    /// Free-text comment
    #[serde(default = "default_comment")]
    pub comment: String,
}

impl Default for AppointmentConfig {
    fn default() -> Self {
        Self::new(Facility::Tokyo, HealthcareProgram::Medicare)
    }
}

impl AppointmentConfig {
    /// Create a booking for tomorrow with the default comment
    #[must_use]
    pub fn new(facility: Facility, program: HealthcareProgram) -> Self {
        Self {
            facility,
            readmission: false,
            program,
            visit_date: tomorrow(),
            comment: default_comment(),
        }
    }

    /// Set readmission
    #[must_use]
    pub const fn with_readmission(mut self, readmission: bool) -> Self {
        self.readmission = readmission;
        self
    }

    /// Set visit date
    #[must_use]
    pub const fn with_visit_date(mut self, date: NaiveDate) -> Self {
        self.visit_date = date;
        self
    }

    /// Set comment
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Visit date as typed into the form
    #[must_use]
    pub fn visit_date_text(&self) -> String {
        self.visit_date.format(VISIT_DATE_FORMAT).to_string()
    }

    /// Readmission as shown on the confirmation page
    #[must_use]
    pub const fn readmission_text(&self) -> &'static str {
        if self.readmission {
            "Yes"
        } else {
            "No"
        }
    }

    /// Check field constraints
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidConfig`] if the comment is blank.
    pub fn validate(&self) -> ProbeResult<()> {
        if self.comment.trim().is_empty() {
            return Err(ProbeError::config("appointment comment must not be empty"));
        }
        Ok(())
    }
}

// =============================================================================
// CREDENTIALS / SITE
// =============================================================================

/// Login credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("John Doe", "ThisIsNotAPassword")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Copy with the password masked
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self::new(self.username.clone(), "***")
    }
}

/// Target site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root, e.g. `https://katalon-demo-cura.herokuapp.com/`
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl SiteConfig {
    /// Resolve `path` against the site root
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Login page URL
    #[must_use]
    pub fn login_url(&self) -> String {
        self.url("profile.php#login")
    }
}

// =============================================================================
// TOP LEVEL
// =============================================================================

/// Complete probe configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Target site
    pub site: SiteConfig,
    /// Login credentials
    pub credentials: Credentials,
    /// Browser session
    pub driver: DriverConfig,
    /// Wait timeout and polling
    pub wait: WaitOptions,
    /// Click retry policy
    pub interaction: InteractionPolicy,
    /// Booking form values
    pub appointment: AppointmentConfig,
    /// Where screenshots are written
    pub artifacts_dir: PathBuf,
    /// Logging
    pub log: LogConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            credentials: Credentials::default(),
            driver: DriverConfig::default(),
            wait: WaitOptions::default(),
            interaction: InteractionPolicy::default(),
            appointment: AppointmentConfig::default(),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            log: LogConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Parse and validate a YAML document
    ///
    /// # Errors
    ///
    /// Returns a YAML error for malformed input or
    /// [`ProbeError::InvalidConfig`] if validation fails.
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise as
    /// [`Self::from_yaml_str`].
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    ///
    /// Returns a YAML error if serialization fails.
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidConfig`] describing the first violation.
    pub fn validate(&self) -> ProbeResult<()> {
        let base = &self.site.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ProbeError::config(format!(
                "site.base_url must be an http(s) URL, got {base:?}"
            )));
        }
        if self.credentials.username.is_empty() {
            return Err(ProbeError::config("credentials.username must not be empty"));
        }
        if self.wait.timeout_ms == 0 || self.wait.poll_interval_ms == 0 {
            return Err(ProbeError::config("wait timeout and poll interval must be positive"));
        }
        if self.interaction.max_attempts == 0 {
            return Err(ProbeError::config("interaction.max_attempts must be at least 1"));
        }
        self.appointment.validate()
    }
}
