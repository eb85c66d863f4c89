//! `RUST_LOG` handling of the global subscriber.
//!
//! Lives in its own test binary because `init` installs a process-wide
//! subscriber.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use cura_probe::logging::init;
use cura_probe::LogConfig;

#[test]
fn test_rust_log_overrides_default_level() {
    std::env::set_var("RUST_LOG", "debug");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cura_automation.log");

    init(&LogConfig::default().with_file(&path)).unwrap();
    tracing::debug!("polling for login form");
    tracing::info!("login successful");

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("polling for login form"), "{written}");
    assert!(written.contains("login successful"), "{written}");
}
