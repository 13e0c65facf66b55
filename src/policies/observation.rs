//! # Observation window policy.
//!
//! After each recognition attempt the controller waits before it asks the
//! success check, so downstream effects (a form update, a page redraw) can
//! settle. [`ObservationPolicy`] computes that wait.
//!
//! The delay after attempt `n` (1-based) is `first × factor^(n-1)`, clamped to
//! `max`, then jittered. The default is a constant 2s window with no jitter.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use retryvisor::{JitterPolicy, ObservationPolicy};
//!
//! let policy = ObservationPolicy {
//!     first: Duration::from_millis(500),
//!     factor: 2.0,
//!     max: Duration::from_secs(3),
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(policy.delay_after(1), Duration::from_millis(500));
//! assert_eq!(policy.delay_after(2), Duration::from_secs(1));
//! assert_eq!(policy.delay_after(5), Duration::from_secs(3));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policies::jitter::JitterPolicy;

/// Computes the observation window after each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationPolicy {
    /// Window after the first attempt.
    #[serde(with = "humantime_serde")]
    pub first: Duration,
    /// Multiplicative growth per attempt (`1.0` = constant).
    pub factor: f64,
    /// Upper bound for the window.
    #[serde(with = "humantime_serde")]
    pub max: Duration,
    /// Randomization applied after clamping.
    pub jitter: JitterPolicy,
}

impl Default for ObservationPolicy {
    /// Constant 2s window, capped at 30s, no jitter.
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}

impl ObservationPolicy {
    /// A constant window of `delay` after every attempt.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            first: delay,
            factor: 1.0,
            max: delay.max(Duration::from_secs(30)),
            jitter: JitterPolicy::None,
        }
    }

    /// Checks that the factor can produce a finite, positive delay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.factor.is_finite() || self.factor <= 0.0 {
            return Err(ConfigError::InvalidFactor {
                factor: self.factor,
            });
        }
        Ok(())
    }

    /// Delay to wait after attempt `attempt` (1-based; 0 is treated as 1).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}
