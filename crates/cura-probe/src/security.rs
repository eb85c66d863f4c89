//! Security probes for the login form and the booking flow.
//!
//! Probes drive the real pages and turn what they observe into
//! [`Finding`]s. A check that cannot complete is reported as a warning and
//! the probe moves on to the next check.

use crate::config::ProbeConfig;
use crate::driver::{Driver, Element};
use crate::page::{BasePage, Page};
use crate::pages::confirmation::{self, ConfirmationPage};
use crate::pages::login::{self, LoginPage};
use crate::pages::{AppointmentPage, MenuPage};
use crate::result::{ProbeError, ProbeResult};
use crate::scenario::Session;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{error, info, warn};

/// Classic login-bypass payloads
pub const SQL_INJECTION_PAYLOADS: [&str; 5] = [
    "' OR '1'='1",
    "' OR '1'='1' --",
    "admin' --",
    "' UNION SELECT 1, username, password FROM users --",
    "'; DROP TABLE users; --",
];

/// Markup that runs script when a page renders it unescaped
pub const XSS_PAYLOADS: [&str; 3] = [
    "<script>alert(1)</script>",
    "\"><img src=x onerror=alert(1)>",
    "<svg onload=alert(1)>",
];

/// Messages that indicate brute-force protection
pub const DEFAULT_LOCKOUT_PATTERN: &str = r"(?i)locked|too many attempts";

/// How long to let the page settle after a submit
pub const DEFAULT_SETTLE_MS: u64 = 2_000;

const AUTHENTICATED_MARKER: &str = "appointment.php";
const LOGIN_MARKER: &str = "profile.php#login";

// =============================================================================
// FINDINGS
// =============================================================================

/// How bad a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected behavior observed
    Info,
    /// Missing hardening or incomplete check
    Warning,
    /// Exploitable weakness
    Critical,
}

impl Severity {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Check that produced it
    pub check: String,
    /// Severity
    pub severity: Severity,
    /// What was observed
    pub message: String,
    /// Input that triggered it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl Finding {
    /// Create a finding
    #[must_use]
    pub fn new(check: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            severity,
            message: message.into(),
            payload: None,
        }
    }

    /// Attach the triggering input
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

/// Findings from one probe run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityReport {
    /// Probe name
    pub probe: String,
    /// Findings in the order observed
    pub findings: Vec<Finding>,
}

impl SecurityReport {
    /// Empty report for `probe`
    #[must_use]
    pub fn new(probe: impl Into<String>) -> Self {
        Self {
            probe: probe.into(),
            findings: Vec::new(),
        }
    }

    /// Record and log a finding
    pub fn push(&mut self, finding: Finding) {
        match finding.severity {
            Severity::Info => info!(check = %finding.check, "{}", finding.message),
            Severity::Warning => warn!(check = %finding.check, "{}", finding.message),
            Severity::Critical => error!(check = %finding.check, "{}", finding.message),
        }
        self.findings.push(finding);
    }

    /// Whether any finding is critical
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Critical)
    }

    /// Number of findings at `severity`
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    /// Highest severity seen
    #[must_use]
    pub fn worst(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

impl SecurityReport {
    /// Report for a probe that could not start at all
    #[must_use]
    pub fn aborted(probe: impl Into<String>, err: &ProbeError) -> Self {
        let probe = probe.into();
        let mut report = Self::new(probe.clone());
        report.push(aborted(&probe, err));
        report
    }
}

fn aborted(check: &str, err: &ProbeError) -> Finding {
    Finding::new(check, Severity::Warning, format!("check aborted: {err}"))
}

// =============================================================================
// SQL INJECTION
// =============================================================================

/// Submits injection payloads through the login form
#[derive(Debug, Clone)]
pub struct SqlInjectionProbe<'c> {
    config: &'c ProbeConfig,
    payloads: Vec<String>,
    settle: Duration,
}

impl<'c> SqlInjectionProbe<'c> {
    /// Report name
    pub const NAME: &'static str = "sql_injection";

    /// Probe with the standard payload set
    #[must_use]
    pub fn new(config: &'c ProbeConfig) -> Self {
        Self {
            config,
            payloads: SQL_INJECTION_PAYLOADS.iter().map(ToString::to_string).collect(),
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
        }
    }

    /// Replace the payload set
    #[must_use]
    pub fn with_payloads<I, S>(mut self, payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.payloads = payloads.into_iter().map(Into::into).collect();
        self
    }

    /// Set the post-submit settle time
    #[must_use]
    pub const fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Payloads that will be submitted
    #[must_use]
    pub fn payloads(&self) -> &[String] {
        &self.payloads
    }

    /// Try every payload
    ///
    /// # Errors
    ///
    /// Returns an error only if the login form cannot be reached at all.
    pub fn run<D: Driver>(&self, session: &Session<D>) -> ProbeResult<SecurityReport> {
        const CHECK: &str = SqlInjectionProbe::NAME;
        let base = session.base_page(self.config);
        let login: LoginPage<'_, D> = base.page();
        let menu: MenuPage<'_, D> = base.page();
        let mut report = SecurityReport::new(CHECK);

        session.driver().navigate(&self.config.site.base_url)?;
        login.go_to_login()?;

        for payload in &self.payloads {
            match self.attempt(&base, &login, payload) {
                Ok(true) => {
                    report.push(
                        Finding::new(CHECK, Severity::Critical, "login bypassed with injection payload")
                            .with_payload(payload),
                    );
                    if let Err(e) = menu.logout().and_then(|()| login.go_to_login()) {
                        warn!(error = %e, "could not return to login form after bypass");
                        session.driver().navigate(&self.config.site.login_url())?;
                    }
                }
                Ok(false) => report.push(
                    Finding::new(CHECK, Severity::Info, "payload rejected").with_payload(payload),
                ),
                Err(e) => {
                    session.failure_screenshot(&self.config.artifacts_dir, CHECK);
                    report.push(aborted(CHECK, &e).with_payload(payload));
                    session.driver().navigate(&self.config.site.login_url())?;
                }
            }
        }
        Ok(report)
    }

    fn attempt<D: Driver>(
        &self,
        base: &BasePage<'_, D>,
        login: &LoginPage<'_, D>,
        payload: &str,
    ) -> ProbeResult<bool> {
        info!(payload, "submitting injection payload");
        login.login(payload, payload)?;
        if base.waiter().for_url_containing(AUTHENTICATED_MARKER, self.settle)? {
            return Ok(true);
        }
        login.is_present(&login::APPOINTMENT_FORM)
    }
}

// =============================================================================
// CROSS-SITE SCRIPTING
// =============================================================================

/// Submits markup through the login fields and the booking comment and
/// checks whether the page renders it
#[derive(Debug, Clone)]
pub struct XssProbe<'c> {
    config: &'c ProbeConfig,
    payloads: Vec<String>,
    settle: Duration,
}

impl<'c> XssProbe<'c> {
    /// Report name
    pub const NAME: &'static str = "xss";
    const LOGIN_CHECK: &'static str = "xss_login";
    const COMMENT_CHECK: &'static str = "xss_comment";

    /// Probe with the standard payload set
    #[must_use]
    pub fn new(config: &'c ProbeConfig) -> Self {
        Self {
            config,
            payloads: XSS_PAYLOADS.iter().map(ToString::to_string).collect(),
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
        }
    }

    /// Replace the payload set
    #[must_use]
    pub fn with_payloads<I, S>(mut self, payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.payloads = payloads.into_iter().map(Into::into).collect();
        self
    }

    /// Set the post-submit settle time
    #[must_use]
    pub const fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Payloads that will be submitted
    #[must_use]
    pub fn payloads(&self) -> &[String] {
        &self.payloads
    }

    /// Submit every payload through the login form, then through the
    /// booking comment.
    ///
    /// # Errors
    ///
    /// Failed attempts are recorded as warnings; the run itself does not
    /// fail.
    pub fn run<D: Driver>(&self, session: &Session<D>) -> ProbeResult<SecurityReport> {
        let mut report = SecurityReport::new(Self::NAME);
        for payload in &self.payloads {
            let outcome = self.login_reflection(session, payload);
            self.record(session, &mut report, Self::LOGIN_CHECK, payload, outcome);
        }
        for payload in &self.payloads {
            let outcome = self.comment_reflection(session, payload);
            self.record(session, &mut report, Self::COMMENT_CHECK, payload, outcome);
        }
        Ok(report)
    }

    fn record<D: Driver>(
        &self,
        session: &Session<D>,
        report: &mut SecurityReport,
        check: &str,
        payload: &str,
        outcome: ProbeResult<Finding>,
    ) {
        match outcome {
            Ok(finding) => report.push(finding.with_payload(payload)),
            Err(e) => {
                session.failure_screenshot(&self.config.artifacts_dir, check);
                report.push(aborted(check, &e).with_payload(payload));
            }
        }
    }

    fn login_reflection<D: Driver>(&self, session: &Session<D>, payload: &str) -> ProbeResult<Finding> {
        let base = session.base_page(self.config);
        let login: LoginPage<'_, D> = base.page();

        session.driver().navigate(&self.config.site.base_url)?;
        login.go_to_login()?;
        info!(payload, "submitting markup through the login form");
        login.login(payload, payload)?;
        let banner = login.error_text(self.settle)?;

        let finding = if rendered_in(session.driver(), "body", payload)? {
            Finding::new(Self::LOGIN_CHECK, Severity::Critical, "login input rendered as markup")
        } else if banner.is_some() {
            Finding::new(Self::LOGIN_CHECK, Severity::Info, "login rejected without rendering input")
        } else {
            Finding::new(Self::LOGIN_CHECK, Severity::Info, "login input not reflected")
        };
        Ok(finding)
    }

    fn comment_reflection<D: Driver>(
        &self,
        session: &Session<D>,
        payload: &str,
    ) -> ProbeResult<Finding> {
        let base = session.base_page(self.config);
        let login: LoginPage<'_, D> = base.page();
        let appointment: AppointmentPage<'_, D> = base.page();
        let summary: ConfirmationPage<'_, D> = base.page();
        let menu: MenuPage<'_, D> = base.page();

        session.driver().navigate(&self.config.site.base_url)?;
        login.go_to_login()?;
        login.login_and_wait(&self.config.credentials)?;
        info!(payload, "booking with markup in the comment");
        appointment.book_appointment(&self.config.appointment.clone().with_comment(payload))?;
        summary.wait_until_loaded()?;

        let shown = base
            .waiter()
            .for_visible(&confirmation::COMMENT, base.default_timeout())?
            .text()?;
        let rendered = rendered_in(session.driver(), "#comment", payload)?;
        menu.logout()?;

        let finding = if rendered {
            Finding::new(
                Self::COMMENT_CHECK,
                Severity::Critical,
                "comment rendered as markup on the confirmation page",
            )
        } else if shown.trim() == payload.trim() {
            Finding::new(Self::COMMENT_CHECK, Severity::Info, "comment shown as escaped text")
        } else {
            Finding::new(
                Self::COMMENT_CHECK,
                Severity::Info,
                format!("comment not echoed verbatim: {:?}", shown.trim()),
            )
        };
        Ok(finding)
    }
}

/// Whether the markup of the first element matching `selector` contains
/// `payload` unescaped
fn rendered_in<D: Driver>(driver: &D, selector: &str, payload: &str) -> ProbeResult<bool> {
    let script = format!(
        "var el = document.querySelector({}); return !!el && el.innerHTML.indexOf({}) !== -1;",
        serde_json::to_string(selector)?,
        serde_json::to_string(payload)?,
    );
    Ok(driver.execute_script(&script)?.as_bool().unwrap_or(false))
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

/// Brute force, direct access and post-logout session checks
#[derive(Debug, Clone)]
pub struct AuthProbe<'c> {
    config: &'c ProbeConfig,
    attempts: u32,
    lockout_pattern: String,
    settle: Duration,
}

impl<'c> AuthProbe<'c> {
    /// Report name
    pub const NAME: &'static str = "authentication";

    /// Probe with five wrong-password attempts
    #[must_use]
    pub fn new(config: &'c ProbeConfig) -> Self {
        Self {
            config,
            attempts: 5,
            lockout_pattern: DEFAULT_LOCKOUT_PATTERN.to_string(),
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
        }
    }

    /// Set the number of wrong-password attempts
    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the lockout message regex
    #[must_use]
    pub fn with_lockout_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.lockout_pattern = pattern.into();
        self
    }

    /// Set the post-submit settle time
    #[must_use]
    pub const fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Run all three checks
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidConfig`] if the lockout pattern is not
    /// a valid regex. Failures inside a check become warnings.
    pub fn run<D: Driver>(&self, session: &Session<D>) -> ProbeResult<SecurityReport> {
        let lockout = Regex::new(&self.lockout_pattern)
            .map_err(|e| ProbeError::config(format!("invalid lockout pattern: {e}")))?;
        let mut report = SecurityReport::new(Self::NAME);

        for name in ["brute_force", "direct_access", "session_after_logout"] {
            info!(check = name, "running authentication check");
            let outcome = match name {
                "brute_force" => self.brute_force(session, &lockout),
                "direct_access" => self.direct_access(session),
                _ => self.session_after_logout(session),
            };
            match outcome {
                Ok(finding) => report.push(finding),
                Err(e) => {
                    session.failure_screenshot(&self.config.artifacts_dir, name);
                    report.push(aborted(name, &e));
                }
            }
        }
        Ok(report)
    }

    fn brute_force<D: Driver>(&self, session: &Session<D>, lockout: &Regex) -> ProbeResult<Finding> {
        const CHECK: &str = "brute_force";
        let base = session.base_page(self.config);
        let login: LoginPage<'_, D> = base.page();

        session.driver().navigate(&self.config.site.base_url)?;
        login.go_to_login()?;
        for attempt in 1..=self.attempts {
            login.login(
                &self.config.credentials.username,
                &format!("wrong_password_{attempt}"),
            )?;
            let message = login.error_text(self.settle)?.unwrap_or_default();
            info!(attempt, message = %message, "wrong password rejected");
            if lockout.is_match(&message) {
                return Ok(Finding::new(
                    CHECK,
                    Severity::Info,
                    format!("account lockout after {attempt} failed attempt(s): {message}"),
                ));
            }
        }
        Ok(Finding::new(
            CHECK,
            Severity::Warning,
            format!("no lockout after {} failed attempts", self.attempts),
        ))
    }

    fn direct_access<D: Driver>(&self, session: &Session<D>) -> ProbeResult<Finding> {
        const CHECK: &str = "direct_access";
        let base = session.base_page(self.config);
        session.driver().navigate(&self.config.site.url("#appointment"))?;
        if base.waiter().for_url_containing(LOGIN_MARKER, self.settle)? {
            Ok(Finding::new(CHECK, Severity::Info, "redirected to login"))
        } else {
            let url = session.driver().current_url()?;
            Ok(Finding::new(
                CHECK,
                Severity::Critical,
                format!("appointment page reachable without login ({url})"),
            ))
        }
    }

    fn session_after_logout<D: Driver>(&self, session: &Session<D>) -> ProbeResult<Finding> {
        const CHECK: &str = "session_after_logout";
        let base = session.base_page(self.config);
        let login: LoginPage<'_, D> = base.page();
        let menu: MenuPage<'_, D> = base.page();

        session.driver().navigate(&self.config.site.login_url())?;
        login.login_and_wait(&self.config.credentials)?;
        menu.logout()?;
        session.driver().back()?;
        session.driver().back()?;
        if base.waiter().for_url_containing(LOGIN_MARKER, self.settle)? {
            Ok(Finding::new(CHECK, Severity::Info, "session invalidated after logout"))
        } else {
            let url = session.driver().current_url()?;
            Ok(Finding::new(
                CHECK,
                Severity::Critical,
                format!("protected page reachable after logout ({url})"),
            ))
        }
    }
}
