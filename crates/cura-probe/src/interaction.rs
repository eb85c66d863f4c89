//! Safe-interaction retry policy.
//!
//! Clicks on a freshly rendered page fail transiently (overlays, animations,
//! re-rendered nodes). [`retry`] repeats a whole resolve-and-act cycle up to
//! `max_attempts` times with a fixed backoff, then reports the last failure.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};

/// Default number of attempts for a click
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts (1 second)
pub const DEFAULT_BACKOFF_MS: u64 = 1_000;

/// Retry configuration for clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionPolicy {
    /// Attempts before giving up (at least 1)
    pub max_attempts: u32,
    /// Pause between attempts in milliseconds
    pub backoff_ms: u64,
}

impl Default for InteractionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}

impl InteractionPolicy {
    /// Create a policy with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt budget
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the backoff in milliseconds
    #[must_use]
    pub const fn with_backoff(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    /// A single attempt, no backoff
    #[must_use]
    pub const fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }

    /// Get backoff as Duration
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Attempt budget, never below one
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Run `op` until it succeeds or the policy's attempts are spent.
///
/// `op` receives the 1-based attempt number. Each failure is logged at
/// warn; exhaustion is logged at error.
///
/// # Errors
///
/// Returns [`ProbeError::InteractionFailed`] wrapping the last failure.
pub fn retry<T, F>(policy: &InteractionPolicy, description: &str, mut op: F) -> ProbeResult<T>
where
    F: FnMut(u32) -> ProbeResult<T>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(cause) => {
                warn!(
                    element = description,
                    attempt,
                    max_attempts,
                    error = %cause,
                    "interaction attempt failed"
                );
                if attempt >= max_attempts {
                    error!(element = description, attempts = attempt, "giving up");
                    return Err(ProbeError::InteractionFailed {
                        description: description.to_string(),
                        attempts: attempt,
                        cause: Box::new(cause),
                    });
                }
                std::thread::sleep(policy.backoff());
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::cell::Cell;

    mod policy_tests {
        use super::*;

        #[test]
        fn test_default() {
            let policy = InteractionPolicy::default();
            assert_eq!(policy.max_attempts, 3);
            assert_eq!(policy.backoff(), Duration::from_secs(1));
        }

        #[test]
        fn test_zero_attempts_means_one() {
            assert_eq!(InteractionPolicy::new().with_max_attempts(0).attempts(), 1);
        }

        #[test]
        fn test_yaml() {
            let policy: InteractionPolicy = serde_yaml_ng::from_str("backoff_ms: 250").unwrap();
            assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
            assert_eq!(policy.backoff_ms, 250);
        }
    }

    mod retry_tests {
        use super::*;

        fn fast(max: u32) -> InteractionPolicy {
            InteractionPolicy::new().with_max_attempts(max).with_backoff(1)
        }

        #[test]
        fn test_immediate_success() {
            let calls = Cell::new(0);
            let value = retry(&fast(3), "button", |_| {
                calls.set(calls.get() + 1);
                Ok(7)
            })
            .unwrap();
            assert_eq!(value, 7);
            assert_eq!(calls.get(), 1);
        }

        #[test]
        fn test_eventual_success() {
            let value = retry(&fast(3), "button", |attempt| {
                if attempt < 3 {
                    Err(ProbeError::webdriver("element click intercepted", "overlay"))
                } else {
                    Ok(attempt)
                }
            })
            .unwrap();
            assert_eq!(value, 3);
        }

        #[test]
        fn test_exhaustion_is_exact() {
            let calls = Cell::new(0_u32);
            let err = retry::<(), _>(&fast(4), "book button", |_| {
                calls.set(calls.get() + 1);
                Err(ProbeError::webdriver("element not interactable", "hidden"))
            })
            .unwrap_err();
            assert_eq!(calls.get(), 4);
            match err {
                ProbeError::InteractionFailed {
                    description,
                    attempts,
                    cause,
                } => {
                    assert_eq!(description, "book button");
                    assert_eq!(attempts, 4);
                    assert!(cause.to_string().contains("element not interactable"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_backoff_applied_between_attempts() {
            let policy = InteractionPolicy::new().with_max_attempts(3).with_backoff(20);
            let start = std::time::Instant::now();
            let _ = retry::<(), _>(&policy, "x", |_| Err(ProbeError::session("down")));
            assert!(start.elapsed() >= Duration::from_millis(40));
        }
    }
}
