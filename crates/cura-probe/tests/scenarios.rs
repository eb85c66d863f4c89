//! End-to-end booking scenario and security probes against the scripted
//! CURA site.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{cura_site, fast_config, LoginBehavior};
use cura_probe::{
    AuthProbe, BookingScenario, Driver, ProbeError, Session, Severity, SqlInjectionProbe,
    XssProbe,
};
use std::path::Path;
use std::time::Duration;

const SETTLE: Duration = Duration::from_millis(20);

fn artifacts_named(dir: &Path, prefix: &str) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().to_string())
                .filter(|name| name.starts_with(prefix))
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// BOOKING
// =============================================================================

mod booking {
    use super::*;

    #[test]
    fn test_booking_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = cura_site(&config, LoginBehavior::Accept);
        let probe = site.driver.clone();

        let outcome = {
            let session = Session::new(site.driver.clone());
            BookingScenario::new(&config).run(&session).unwrap()
        };

        assert!(outcome.details.matches(&config.appointment));
        assert_eq!(outcome.details.comment, "Integration booking");
        assert_eq!(outcome.details.readmission, "Yes");
        assert!(outcome.screenshot.exists());
        assert!(outcome
            .screenshot
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("cura_screenshot_"));
        assert_eq!(site.logout.click_count(), 1);
        assert_eq!(probe.current_url().unwrap(), common::BASE_URL);
        assert_eq!(probe.quit_count(), 1);
    }

    #[test]
    fn test_booking_without_logout() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = cura_site(&config, LoginBehavior::Accept);
        let session = Session::new(site.driver.clone());

        BookingScenario::new(&config)
            .with_logout(false)
            .run(&session)
            .unwrap();

        assert_eq!(site.logout.click_count(), 0);
        session.close().unwrap();
        assert_eq!(site.driver.quit_count(), 1);
    }

    #[test]
    fn test_failed_login_captures_step_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = cura_site(&config, LoginBehavior::Reject);
        let session = Session::new(site.driver.clone());

        let err = BookingScenario::new(&config).run(&session).unwrap_err();

        assert!(matches!(err, ProbeError::ElementNotFound { .. }), "got {err}");
        assert_eq!(artifacts_named(dir.path(), "login_error_").len(), 1);
        assert!(!site.driver.was_called("click:id=btn-book-appointment"));
        drop(session);
        assert_eq!(site.driver.quit_count(), 1);
    }

    #[test]
    fn test_invalid_appointment_fails_before_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fast_config(dir.path());
        config.appointment.comment = "   ".to_string();
        let site = cura_site(&config, LoginBehavior::Accept);
        let session = Session::new(site.driver.clone());

        let err = BookingScenario::new(&config).run(&session).unwrap_err();

        assert!(matches!(err, ProbeError::InvalidConfig { .. }));
        assert!(!site.driver.was_called("navigate:"));
    }
}

// =============================================================================
// SECURITY PROBES
// =============================================================================

mod sql_injection {
    use super::*;

    #[test]
    fn test_rejected_payloads_are_info() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = cura_site(&config, LoginBehavior::Reject);
        let session = Session::new(site.driver.clone());

        let report = SqlInjectionProbe::new(&config)
            .with_settle(SETTLE)
            .run(&session)
            .unwrap();

        assert_eq!(report.findings.len(), 5);
        assert_eq!(report.count(Severity::Info), 5);
        assert!(!report.has_critical());
        assert!(site
            .driver
            .was_called("send_keys:id=txt-username:' OR '1'='1"));
    }

    #[test]
    fn test_bypass_is_critical_and_logs_out() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = cura_site(&config, LoginBehavior::Accept);
        let session = Session::new(site.driver.clone());

        let report = SqlInjectionProbe::new(&config)
            .with_payloads(["admin' --"])
            .with_settle(SETTLE)
            .run(&session)
            .unwrap();

        assert!(report.has_critical());
        assert_eq!(report.findings[0].payload.as_deref(), Some("admin' --"));
        assert_eq!(site.logout.click_count(), 1);
    }
}

mod xss {
    use super::*;
    use serde_json::json;

    const SCRIPT_TAG: &str = "<script>alert(1)</script>";

    #[test]
    fn test_comment_rendered_as_markup_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = cura_site(&config, LoginBehavior::Accept);
        // login page escapes, confirmation page renders the comment raw
        site.driver.push_script_result(json!(false));
        site.driver.push_script_result(json!(true));
        let session = Session::new(site.driver.clone());

        let report = XssProbe::new(&config)
            .with_payloads([SCRIPT_TAG])
            .with_settle(SETTLE)
            .run(&session)
            .unwrap();

        let checks: Vec<_> = report.findings.iter().map(|f| f.check.as_str()).collect();
        assert_eq!(checks, ["xss_login", "xss_comment"]);
        assert_eq!(report.findings[0].severity, Severity::Info);
        assert_eq!(report.findings[1].severity, Severity::Critical);
        assert_eq!(report.findings[1].payload.as_deref(), Some(SCRIPT_TAG));
        assert!(site
            .driver
            .was_called("send_keys:id=txt_comment:<script>alert(1)</script>"));
        assert!(site.driver.was_called("send_keys:id=txt-username:<script>"));
        assert_eq!(site.logout.click_count(), 1);
    }

    #[test]
    fn test_escaped_comment_is_info() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fast_config(dir.path());
        // the confirmation page echoes the comment back as plain text
        config.appointment.comment = SCRIPT_TAG.to_string();
        let site = cura_site(&config, LoginBehavior::Accept);
        let session = Session::new(site.driver.clone());

        let report = XssProbe::new(&config)
            .with_payloads([SCRIPT_TAG])
            .with_settle(SETTLE)
            .run(&session)
            .unwrap();

        assert!(!report.has_critical());
        assert_eq!(report.count(Severity::Info), 2);
        assert_eq!(report.findings[1].message, "comment shown as escaped text");
        assert!(site.driver.was_called("script:var el = document.querySelector(\"#comment\")"));
    }

    #[test]
    fn test_rejected_login_and_failed_booking() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = cura_site(&config, LoginBehavior::Reject);
        let session = Session::new(site.driver.clone());

        let report = XssProbe::new(&config).with_settle(SETTLE).run(&session).unwrap();

        assert_eq!(report.findings.len(), 6);
        assert_eq!(report.count(Severity::Info), 3);
        assert!(report.findings[..3]
            .iter()
            .all(|f| f.message == "login rejected without rendering input"));
        // the booking half cannot log in on this site
        assert_eq!(report.count(Severity::Warning), 3);
        assert!(!artifacts_named(dir.path(), "xss_comment_error_").is_empty());
    }
}

mod authentication {
    use super::*;

    fn redirecting_site(config: &cura_probe::ProbeConfig, behavior: LoginBehavior) -> common::CuraSite {
        let site = cura_site(config, behavior);
        site.driver
            .add_redirect(config.site.url("#appointment"), config.site.login_url());
        site
    }

    #[test]
    fn test_hardened_site_reports_no_critical() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = redirecting_site(&config, LoginBehavior::Accept);
        let session = Session::new(site.driver.clone());

        let report = AuthProbe::new(&config)
            .with_settle(SETTLE)
            .run(&session)
            .unwrap();

        let checks: Vec<_> = report.findings.iter().map(|f| f.check.as_str()).collect();
        assert_eq!(checks, ["brute_force", "direct_access", "session_after_logout"]);
        assert_eq!(report.findings[0].severity, Severity::Warning);
        assert_eq!(report.findings[1].severity, Severity::Info);
        assert_eq!(report.findings[2].severity, Severity::Info);
        assert!(!report.has_critical());
    }

    #[test]
    fn test_unprotected_appointment_page_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = cura_site(&config, LoginBehavior::Accept);
        let session = Session::new(site.driver.clone());

        let report = AuthProbe::new(&config)
            .with_attempts(1)
            .with_settle(SETTLE)
            .run(&session)
            .unwrap();

        let direct = report
            .findings
            .iter()
            .find(|f| f.check == "direct_access")
            .unwrap();
        assert_eq!(direct.severity, Severity::Critical);
        assert!(report.has_critical());
    }

    #[test]
    fn test_lockout_message_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = redirecting_site(&config, LoginBehavior::Reject);
        let session = Session::new(site.driver.clone());

        let report = AuthProbe::new(&config)
            .with_lockout_pattern("(?i)login failed")
            .with_settle(SETTLE)
            .run(&session)
            .unwrap();

        let brute = &report.findings[0];
        assert_eq!(brute.severity, Severity::Info);
        assert!(brute.message.contains("after 1 failed attempt"));
        // login never succeeds on this site, so the logout check aborts
        assert_eq!(report.findings[2].severity, Severity::Warning);
        assert!(report.findings[2].message.starts_with("check aborted"));
        assert_eq!(artifacts_named(dir.path(), "session_after_logout_error_").len(), 1);
    }

    #[test]
    fn test_invalid_lockout_pattern_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let site = cura_site(&config, LoginBehavior::Reject);
        let session = Session::new(site.driver.clone());

        let err = AuthProbe::new(&config)
            .with_lockout_pattern("(")
            .run(&session)
            .unwrap_err();

        assert!(matches!(err, ProbeError::InvalidConfig { .. }));
        assert!(!site.driver.was_called("navigate:"));
    }
}
