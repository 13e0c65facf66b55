//! # LogWriter: events as `tracing` records
//!
//! Forwards every [`Event`] to `tracing` with structured fields, so any
//! `tracing-subscriber` setup (fmt, json, OpenTelemetry) picks them up.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO  retryvisor::log: run triggered run=1 max_attempts=10
//! DEBUG retryvisor::log: attempt starting run=1 attempt=1 max_attempts=10
//! WARN  retryvisor::log: attempt failed run=1 attempt=1 reason="attempt failed: no digits"
//! DEBUG retryvisor::log: observing run=1 attempt=1 delay_ms=2000
//! INFO  retryvisor::log: run exhausted run=1 attempts=10
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Tracing-backed event writer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::RunTriggered => {
                tracing::info!(target: "retryvisor::log", run = e.run, max_attempts = e.max_attempts, "run triggered");
            }
            EventKind::RunRejected => {
                tracing::warn!(target: "retryvisor::log", run = e.run, attempt = e.attempt, "already running, trigger ignored");
            }
            EventKind::RunAborted => {
                tracing::warn!(target: "retryvisor::log", run = e.run, reason, "run aborted");
            }
            EventKind::RunSucceeded => {
                tracing::info!(target: "retryvisor::log", run = e.run, attempts = e.attempt, max_attempts = e.max_attempts, "run succeeded");
            }
            EventKind::RunExhausted => {
                tracing::info!(target: "retryvisor::log", run = e.run, attempts = e.attempt, "run exhausted");
            }
            EventKind::RunCancelled => {
                tracing::info!(target: "retryvisor::log", run = e.run, attempts = e.attempt, "run cancelled");
            }
            EventKind::AttemptStarting => {
                tracing::debug!(target: "retryvisor::log", run = e.run, attempt = e.attempt, max_attempts = e.max_attempts, "attempt starting");
            }
            EventKind::AttemptCompleted => {
                tracing::debug!(target: "retryvisor::log", run = e.run, attempt = e.attempt, recognized = e.recognized, "attempt completed");
            }
            EventKind::AttemptFailed => {
                tracing::warn!(target: "retryvisor::log", run = e.run, attempt = e.attempt, reason, "attempt failed");
            }
            EventKind::AttemptTimedOut => {
                tracing::warn!(target: "retryvisor::log", run = e.run, attempt = e.attempt, timeout_ms = e.timeout_ms, "attempt timed out");
            }
            EventKind::ObservationScheduled => {
                tracing::debug!(target: "retryvisor::log", run = e.run, attempt = e.attempt, delay_ms = e.delay_ms, "observing");
            }
            EventKind::CheckPending => {
                tracing::debug!(target: "retryvisor::log", run = e.run, attempt = e.attempt, reason, "not accepted yet");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "retryvisor::log", reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "retryvisor::log", reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
