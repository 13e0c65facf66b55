//! Error types used by the retry controller and its collaborators.
//!
//! - [`AttemptError`]: a single recognition attempt (or success check) failed.
//! - [`PreflightError`]: required elements were missing before a run started.
//! - [`ConfigError`]: a configuration or run specification is invalid.
//!
//! None of these ever escape [`RetryController::run`](crate::RetryController::run):
//! attempt errors are counted, preflight errors abort to `Idle`. They exist so
//! collaborators can report *why* something went wrong and subscribers can log it.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by one attempt.
///
/// Every variant counts as a failed attempt; the controller never stops early
/// because of one.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// The recognition call exceeded the per-attempt timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The collaborator reported a failure (no result, malformed result, I/O...).
    #[error("attempt failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// The collaborator panicked; the panic was caught by the runner.
    #[error("attempt panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },

    /// The attempt observed cancellation and gave up.
    #[error("attempt cancelled")]
    Canceled,
}

impl AttemptError {
    /// Shorthand for [`AttemptError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        AttemptError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use retryvisor::AttemptError;
    ///
    /// assert_eq!(AttemptError::fail("no digits").as_label(), "attempt_fail");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AttemptError::Timeout { .. } => "attempt_timeout",
            AttemptError::Fail { .. } => "attempt_fail",
            AttemptError::Panicked { .. } => "attempt_panicked",
            AttemptError::Canceled => "attempt_canceled",
        }
    }

    /// Whether another attempt may help.
    ///
    /// Transient and permanent failures are treated alike, so everything except
    /// cancellation is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AttemptError::Canceled)
    }
}

/// Required elements were not present when a run was triggered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("required elements missing: {}", missing.join(", "))]
pub struct PreflightError {
    /// Names of the missing elements.
    pub missing: Vec<String>,
}

impl PreflightError {
    pub fn new<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }
}

/// Invalid configuration or run specification.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `max_attempts` must be greater than zero.
    #[error("max_attempts must be greater than zero")]
    ZeroAttempts,

    /// Observation factor must be finite and positive.
    #[error("observation factor must be finite and > 0, got {factor}")]
    InvalidFactor {
        /// The rejected factor.
        factor: f64,
    },

    /// Event bus needs room for at least one event.
    #[error("bus_capacity must be greater than zero")]
    ZeroBusCapacity,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroAttempts => "config_zero_attempts",
            ConfigError::InvalidFactor { .. } => "config_invalid_factor",
            ConfigError::ZeroBusCapacity => "config_zero_bus_capacity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let timeout = AttemptError::Timeout {
            timeout: Duration::from_secs(1),
        };
        assert_eq!(timeout.as_label(), "attempt_timeout");
        assert_eq!(AttemptError::Canceled.as_label(), "attempt_canceled");
        assert_eq!(ConfigError::ZeroAttempts.as_label(), "config_zero_attempts");
    }

    #[test]
    fn only_cancellation_is_final() {
        assert!(AttemptError::fail("x").is_retryable());
        assert!(
            AttemptError::Panicked {
                info: "boom".into()
            }
            .is_retryable()
        );
        assert!(!AttemptError::Canceled.is_retryable());
    }

    #[test]
    fn preflight_lists_missing_elements() {
        let err = PreflightError::new(["image", "input"]);
        assert_eq!(err.to_string(), "required elements missing: image, input");
    }
}
