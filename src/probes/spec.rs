//! # Run specification.
//!
//! [`RunSpec`] bundles everything one run needs: the recognizer, the success
//! check, an optional preflight, the attempt bound, the observation policy and
//! the per-attempt timeout.
//!
//! A spec can be created:
//! - **Explicitly** with [`RunSpec::new`]
//! - **From config** with [`RunSpec::with_defaults`]
//!
//! Both reject `max_attempts == 0`, so a spec that exists is always runnable.

use std::time::Duration;

use crate::{
    config::Config,
    error::ConfigError,
    policies::ObservationPolicy,
    probes::{CheckRef, PreflightRef, RecognizerRef},
};

/// Everything the controller needs for one run.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use retryvisor::{AttemptError, CheckFn, Config, RecognizeFn, RunSpec};
///
/// let ocr = RecognizeFn::arc("ocr", |_ctx: CancellationToken| async { Ok::<_, AttemptError>(true) });
/// let check = CheckFn::arc(|| async { Ok::<_, AttemptError>(true) });
///
/// let spec = RunSpec::new(ocr.clone(), check.clone(), 10, Duration::from_secs(2)).unwrap();
/// assert_eq!(spec.max_attempts(), 10);
///
/// let from_cfg = RunSpec::with_defaults(ocr, check, &Config::default()).unwrap();
/// assert_eq!(from_cfg.attempt_timeout(), Some(Duration::from_secs(30)));
///
/// assert!(RunSpec::new(
///     RecognizeFn::arc("x", |_c: CancellationToken| async { Ok::<_, AttemptError>(false) }),
///     CheckFn::arc(|| async { Ok::<_, AttemptError>(false) }),
///     0,
///     Duration::ZERO,
/// ).is_err());
/// ```
#[derive(Clone)]
pub struct RunSpec {
    recognizer: RecognizerRef,
    check: CheckRef,
    preflight: Option<PreflightRef>,
    max_attempts: u32,
    observation: ObservationPolicy,
    attempt_timeout: Option<Duration>,
}

impl RunSpec {
    /// Creates a spec with a constant observation window and no attempt timeout.
    pub fn new(
        recognizer: RecognizerRef,
        check: CheckRef,
        max_attempts: u32,
        observation_delay: Duration,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(Self {
            recognizer,
            check,
            preflight: None,
            max_attempts,
            observation: ObservationPolicy::fixed(observation_delay),
            attempt_timeout: None,
        })
    }

    /// Creates a spec inheriting bound, observation policy and timeout from `cfg`.
    pub fn with_defaults(
        recognizer: RecognizerRef,
        check: CheckRef,
        cfg: &Config,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            recognizer,
            check,
            preflight: None,
            max_attempts: cfg.max_attempts,
            observation: cfg.observation,
            attempt_timeout: cfg.attempt_timeout(),
        })
    }

    pub fn recognizer(&self) -> &RecognizerRef {
        &self.recognizer
    }

    pub fn check(&self) -> &CheckRef {
        &self.check
    }

    pub fn preflight(&self) -> Option<&PreflightRef> {
        self.preflight.as_ref()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn observation(&self) -> ObservationPolicy {
        self.observation
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    /// Returns a new spec that runs `preflight` before the first attempt.
    pub fn with_preflight(mut self, preflight: PreflightRef) -> Self {
        self.preflight = Some(preflight);
        self
    }

    /// Returns a new spec with an updated observation policy.
    pub fn with_observation(mut self, observation: ObservationPolicy) -> Result<Self, ConfigError> {
        observation.validate()?;
        self.observation = observation;
        Ok(self)
    }

    /// Returns a new spec with an updated attempt timeout (`None` or zero = no timeout).
    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout.filter(|d| !d.is_zero());
        self
    }
}
