//! # Run a single recognition attempt.
//!
//! - **Execute ONE attempt** of the recognizer with a child cancellation token
//! - **Apply timeout** if configured (wraps the call in `tokio::time::timeout`)
//! - **Catch panics** so a misbehaving recognizer counts as a failed attempt
//! - **Publish events** for observability
//!
//! ## Event flow
//! ```text
//! Ok(recognized):  recognize() → publish AttemptCompleted{recognized}
//! Err(e):          recognize() → publish AttemptFailed{reason}
//! Panic:           recognize() → caught → publish AttemptFailed{panicked}
//! Timeout:         elapsed → cancel child → publish AttemptTimedOut
//!                                         → publish AttemptFailed{timeout}
//! Run cancelled:   parent fires → cancel child → publish AttemptFailed{canceled}
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `AttemptCompleted` or `AttemptFailed`
//! - `AttemptTimedOut` is published **in addition to** `AttemptFailed`
//! - Child cancellation never affects the parent (run) token

use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    error::AttemptError,
    events::{Bus, Event, EventKind},
    probes::Recognize,
};

/// Identifies the attempt being executed, for event metadata.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AttemptCtx {
    pub run: u64,
    pub attempt: u32,
    pub max_attempts: u32,
}

impl AttemptCtx {
    pub(crate) fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_run(self.run)
            .with_attempt(self.attempt)
            .with_max_attempts(self.max_attempts)
    }
}

/// Executes one attempt of `recognizer`, publishing its terminal event to `bus`.
///
/// Returns `Ok(recognized)` when the recognizer returned normally. Errors,
/// panics and timeouts come back as `Err`; the caller counts them and moves on.
/// Cancelling `parent` ends the attempt with `Err(AttemptError::Canceled)`.
pub(crate) async fn run_once<R: Recognize + ?Sized>(
    recognizer: &R,
    parent: &CancellationToken,
    timeout: Option<Duration>,
    ctx: AttemptCtx,
    bus: &Bus,
) -> Result<bool, AttemptError> {
    let child = parent.child_token();
    let call = std::panic::AssertUnwindSafe(recognizer.recognize(child.clone()))
        .catch_unwind()
        .map(|res| {
            res.unwrap_or_else(|panic| {
                Err(AttemptError::Panicked {
                    info: super::panic_info(panic.as_ref()),
                })
            })
        });

    let bounded = async {
        match timeout.filter(|d| !d.is_zero()) {
            Some(dur) => match time::timeout(dur, call).await {
                Ok(r) => r,
                Err(_elapsed) => {
                    child.cancel();
                    bus.publish(ctx.event(EventKind::AttemptTimedOut).with_timeout(dur));
                    Err(AttemptError::Timeout { timeout: dur })
                }
            },
            None => call.await,
        }
    };

    let res = tokio::select! {
        biased;
        _ = parent.cancelled() => {
            child.cancel();
            Err(AttemptError::Canceled)
        }
        res = bounded => res,
    };

    match &res {
        Ok(recognized) => {
            bus.publish(
                ctx.event(EventKind::AttemptCompleted)
                    .with_recognized(*recognized),
            );
        }
        Err(AttemptError::Canceled) => {
            tracing::debug!(
                recognizer = recognizer.name(),
                run = ctx.run,
                attempt = ctx.attempt,
                "recognition attempt cancelled"
            );
            bus.publish(
                ctx.event(EventKind::AttemptFailed)
                    .with_reason(AttemptError::Canceled.to_string()),
            );
        }
        Err(e) => {
            tracing::warn!(
                recognizer = recognizer.name(),
                run = ctx.run,
                attempt = ctx.attempt,
                error = %e,
                "recognition attempt failed"
            );
            bus.publish(ctx.event(EventKind::AttemptFailed).with_reason(e.to_string()));
        }
    }
    res
}
