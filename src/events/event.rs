//! # Events emitted by the retry controller and the attempt runner.
//!
//! The [`EventKind`] enum classifies events in three groups:
//! - **Run events**: trigger, rejection, abort and the terminal outcome of a run
//! - **Attempt events**: one recognition call and its observation window
//! - **Subscriber events**: overflow/panic reports from the fan-out workers
//!
//! Each [`Event`] carries a globally unique, monotonically increasing `seq`
//! and the id of the run it belongs to, so subscribers can restore order
//! and group attempts even when delivery is interleaved.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use retryvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::AttemptTimedOut)
//!     .with_run(7)
//!     .with_attempt(3)
//!     .with_max_attempts(10)
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::AttemptTimedOut);
//! assert_eq!(ev.attempt, Some(3));
//! assert_eq!(ev.timeout_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of controller events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Run events ===
    /// A run was accepted and moved the controller to `Running`.
    ///
    /// Sets: `run`, `max_attempts`
    RunTriggered,

    /// A trigger arrived while a run was already active and was ignored.
    ///
    /// Sets: `run` (the active run), `attempt` (current counter), `max_attempts`
    RunRejected,

    /// Preflight reported missing elements; no attempt was made.
    ///
    /// Sets: `run`, `reason` (missing elements)
    RunAborted,

    /// The success check held after an attempt.
    ///
    /// Sets: `run`, `attempt`, `max_attempts`
    RunSucceeded,

    /// All attempts were consumed without success.
    ///
    /// Sets: `run`, `attempt`, `max_attempts`
    RunExhausted,

    /// The run was cancelled from outside and returned to `Idle`.
    ///
    /// Sets: `run`, `attempt` (attempts consumed so far), `max_attempts`
    RunCancelled,

    // === Attempt events ===
    /// A recognition call is about to start.
    ///
    /// Sets: `run`, `attempt` (1-based), `max_attempts`
    AttemptStarting,

    /// The recognizer returned normally.
    ///
    /// Sets: `run`, `attempt`, `max_attempts`, `recognized`
    AttemptCompleted,

    /// The recognizer returned an error, panicked or timed out.
    ///
    /// Sets: `run`, `attempt`, `max_attempts`, `reason`
    AttemptFailed,

    /// The recognizer exceeded the per-attempt timeout.
    ///
    /// Always followed by `AttemptFailed` for the same attempt.
    ///
    /// Sets: `run`, `attempt`, `timeout_ms`
    AttemptTimedOut,

    /// The observation window before the success check started.
    ///
    /// Sets: `run`, `attempt`, `delay_ms`
    ObservationScheduled,

    /// The success check did not hold after an attempt.
    ///
    /// Sets: `run`, `attempt`, `max_attempts`, `reason` (only when the check itself failed)
    CheckPending,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (subscriber name and panic info)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (subscriber name and cause)
    SubscriberOverflow,
}

/// Controller event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Id of the run this event belongs to.
    pub run: Option<u64>,
    /// Attempt number (starting from 1; 0 before the first attempt).
    pub attempt: Option<u32>,
    /// Attempt bound of the run.
    pub max_attempts: Option<u32>,
    /// Whether the recognizer produced and applied a usable result.
    pub recognized: Option<bool>,
    /// Attempt timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Observation delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, missing elements, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            run: None,
            attempt: None,
            max_attempts: None,
            recognized: None,
            timeout_ms: None,
            delay_ms: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_run(mut self, run: u64) -> Self {
        self.run = Some(run);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }

    #[inline]
    pub fn with_recognized(mut self, recognized: bool) -> Self {
        self.recognized = Some(recognized);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt timeout (stored as milliseconds, saturating).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an observation delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// True for events that close a run (success, exhaustion, cancel, abort).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::RunSucceeded
                | EventKind::RunExhausted
                | EventKind::RunCancelled
                | EventKind::RunAborted
        )
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::AttemptStarting);
        let b = Event::new(EventKind::AttemptStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn huge_durations_saturate() {
        let ev = Event::new(EventKind::ObservationScheduled).with_delay(Duration::MAX);
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn terminal_kinds() {
        assert!(Event::new(EventKind::RunExhausted).is_terminal());
        assert!(Event::new(EventKind::RunAborted).is_terminal());
        assert!(!Event::new(EventKind::RunRejected).is_terminal());
        assert!(!Event::new(EventKind::CheckPending).is_terminal());
    }
}
