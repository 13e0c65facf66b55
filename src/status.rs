//! # Run status and progress.
//!
//! [`Progress`] is the single piece of state a [`RetryController`](crate::RetryController)
//! owns: the [`RunStatus`], the attempt counter and the attempt bound. The
//! controller hands it by reference to a [`Present`] callback after every change
//! and also publishes it through a `tokio::sync::watch` channel.
//!
//! ## Transitions
//! ```text
//!            trigger                 check holds
//!   Idle ─────────────► Running ─────────────────► Succeeded
//!    ▲                   │   │
//!    │    cancelled      │   │ attempt == max
//!    └───────────────────┘   └───────────────────► Exhausted
//!
//! Succeeded / Exhausted / Idle ── trigger ──► Running (attempt = 0)
//! ```

use std::fmt;

/// Status of the controller's current (or last) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// No run active; never ran, aborted by preflight, or cancelled.
    #[default]
    Idle,
    /// A run is active.
    Running,
    /// The last run ended with the success check holding.
    Succeeded,
    /// The last run consumed every attempt without success.
    Exhausted,
}

impl RunStatus {
    /// Whether a run ended here (`Succeeded` or `Exhausted`).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Exhausted)
    }

    /// Returns a short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Snapshot of the controller state.
///
/// `Display` renders the indicator text shown to a user:
/// ```rust
/// use retryvisor::{Progress, RunStatus};
///
/// let p = Progress { status: RunStatus::Running, attempt: 3, max_attempts: 10 };
/// assert_eq!(p.to_string(), "Attempt 3 / 10");
/// assert_eq!(Progress::default().to_string(), "Ready");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub status: RunStatus,
    /// Attempts started in the current run (0 before the first).
    pub attempt: u32,
    /// Attempt bound of the current run (0 before the first run).
    pub max_attempts: u32,
}

impl Progress {
    /// Fresh state for a run that is about to start.
    pub(crate) fn started(max_attempts: u32) -> Self {
        Self {
            status: RunStatus::Running,
            attempt: 0,
            max_attempts,
        }
    }

    /// Attempts still available in this run.
    pub fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            RunStatus::Idle => f.write_str("Ready"),
            RunStatus::Running => write!(f, "Attempt {} / {}", self.attempt, self.max_attempts),
            RunStatus::Succeeded => {
                write!(f, "Solved after {} / {}", self.attempt, self.max_attempts)
            }
            RunStatus::Exhausted => write!(f, "Max attempts reached ({})", self.max_attempts),
        }
    }
}

/// Presentation callback.
///
/// Called synchronously by the active run after every progress change, so it
/// must return quickly (update a label, set a gauge). For async consumers use
/// [`RetryController::watch`](crate::RetryController::watch) or a
/// [`Subscribe`](crate::Subscribe) implementation instead.
pub trait Present: Send + Sync + 'static {
    fn render(&self, progress: &Progress);
}

/// Closure-backed [`Present`].
pub struct PresentFn<F>(pub F);

impl<F> Present for PresentFn<F>
where
    F: Fn(&Progress) + Send + Sync + 'static,
{
    fn render(&self, progress: &Progress) {
        (self.0)(progress)
    }
}
