//! # Controller configuration.
//!
//! [`Config`] centralizes settings for a [`RetryController`](crate::RetryController)
//! and the defaults inherited by [`RunSpec::with_defaults`](crate::RunSpec::with_defaults).
//!
//! ## Sentinel values
//! - `attempt_timeout = 0s` → no per-attempt timeout
//!
//! Config deserializes from any serde format; durations use humantime strings:
//! ```rust
//! use std::time::Duration;
//! use retryvisor::Config;
//!
//! let cfg: Config = serde_json::from_str(
//!     r#"{ "max_attempts": 5, "attempt_timeout": "10s", "observation": { "first": "1s" } }"#,
//! ).unwrap();
//!
//! assert_eq!(cfg.max_attempts, 5);
//! assert_eq!(cfg.attempt_timeout(), Some(Duration::from_secs(10)));
//! assert_eq!(cfg.observation.first, Duration::from_secs(1));
//! assert_eq!(cfg.bus_capacity, 1024);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policies::ObservationPolicy;

/// Settings for the retry controller.
///
/// ## Field semantics
/// - `max_attempts`: default attempt bound per run (must be `> 0`)
/// - `observation`: default wait between an attempt and its success check
/// - `attempt_timeout`: default bound on one recognition call (`0s` = none)
/// - `bus_capacity`: event bus ring buffer size
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attempts per run before the run is `Exhausted`.
    pub max_attempts: u32,

    /// Observation window after each attempt.
    pub observation: ObservationPolicy,

    /// Maximum duration of one recognition call.
    ///
    /// - `Duration::ZERO` = wait for the recognizer forever
    /// - `> 0` = the attempt fails with `AttemptError::Timeout` once exceeded
    #[serde(with = "humantime_serde")]
    pub attempt_timeout: Duration,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Listeners that lag behind more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the per-attempt timeout as an `Option`.
    #[inline]
    pub fn attempt_timeout(&self) -> Option<Duration> {
        if self.attempt_timeout == Duration::ZERO {
            None
        } else {
            Some(self.attempt_timeout)
        }
    }

    /// Checks every field for values the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::ZeroBusCapacity);
        }
        self.observation.validate()
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_attempts = 10`
    /// - `observation = ObservationPolicy::default()` (constant 2s)
    /// - `attempt_timeout = 30s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_attempts: 10,
            observation: ObservationPolicy::default(),
            attempt_timeout: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_timeout_means_none() {
        let cfg = Config {
            attempt_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.attempt_timeout(), None);
    }

    #[test]
    fn zero_attempts_rejected() {
        let cfg = Config {
            max_attempts: 0,
            ..Config::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroAttempts));
    }

    #[test]
    fn zero_bus_capacity_rejected() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroBusCapacity));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn serializes_durations_as_text() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["attempt_timeout"], "30s");
        assert_eq!(json["observation"]["first"], "2s");
    }
}
