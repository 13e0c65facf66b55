//! # RetryController: bounded retry loop around a recognition call.
//!
//! The controller owns the only mutable state of the crate, a [`Progress`]
//! value, and runs at most one loop at a time.
//!
//! ## Lifecycle
//! ```text
//! run(&RunSpec)
//!   ├─► already Running? ── yes ─► publish RunRejected, return Running (no-op)
//!   ├─► Progress = Running{attempt: 0}, publish RunTriggered
//!   ├─► preflight() ── missing ─► publish RunAborted, Idle (zero attempts)
//!   │
//!   loop {
//!   │  ├─► cancelled?               → Idle
//!   │  ├─► attempt == max?          → Exhausted
//!   │  ├─► attempt += 1, publish AttemptStarting
//!   │  ├─► run_once(recognizer)     (errors/panics/timeouts counted, never fatal)
//!   │  ├─► publish ObservationScheduled, sleep(observation.delay_after(attempt))
//!   │  └─► is_successful()?
//!   │         ├─ true  → Succeeded
//!   │         └─ false → publish CheckPending, continue
//!   }
//!   └─► Progress.status = outcome, publish RunSucceeded/RunExhausted/RunCancelled
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially**; recognition and observation are never concurrent.
//! - Cancellation is checked before every attempt and raced against the
//!   recognition call, the observation sleep and the success check.
//! - Progress is written by the active run only; the start test-and-set and
//!   the final write happen under the same lock so runs never interleave.
//! - A run future dropped mid-flight releases the controller to `Idle`.
//! - The presenter is never called while the lock is held.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    core::runner::{AttemptCtx, run_once},
    error::AttemptError,
    events::{Bus, Event, EventKind},
    probes::RunSpec,
    status::{Present, Progress, RunStatus},
};

use super::builder::ControllerBuilder;

/// The run currently holding the controller.
struct ActiveRun {
    id: u64,
    token: CancellationToken,
}

/// Bounded retry controller.
///
/// Created through [`RetryController::builder`]; shared as `Arc<RetryController>`.
pub struct RetryController {
    cfg: Config,
    bus: Bus,
    progress: watch::Sender<Progress>,
    presenter: Option<Arc<dyn Present>>,
    active: Mutex<Option<ActiveRun>>,
    next_run: AtomicU64,
    /// Cancels the active run and refuses new ones.
    root: CancellationToken,
    /// Stops the bus → subscriber listener.
    listener_stop: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl RetryController {
    /// Starts building a controller with the given configuration.
    pub fn builder(cfg: Config) -> ControllerBuilder {
        ControllerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        presenter: Option<Arc<dyn Present>>,
        listener_stop: CancellationToken,
        listener: JoinHandle<()>,
    ) -> Self {
        let (progress, _rx) = watch::channel(Progress::default());
        Self {
            cfg,
            bus,
            progress,
            presenter,
            active: Mutex::new(None),
            next_run: AtomicU64::new(1),
            root: CancellationToken::new(),
            listener_stop,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Configuration the controller was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> Progress {
        *self.progress.borrow()
    }

    /// Current run status.
    pub fn status(&self) -> RunStatus {
        self.progress.borrow().status
    }

    /// Receiver that observes every progress change.
    pub fn watch(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Receiver for raw controller events.
    pub fn events(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs `spec` to completion and returns the final status.
    ///
    /// - `Succeeded`: the success check held after some attempt `k <= max_attempts`.
    /// - `Exhausted`: `max_attempts` attempts ran without success.
    /// - `Idle`: preflight failed, the run was cancelled, or the controller is shut down.
    /// - `Running`: another run is active; this call changed nothing.
    ///
    /// Dropping the returned future mid-run behaves like [`cancel`](Self::cancel):
    /// the controller goes back to `Idle` and accepts new triggers.
    pub async fn run(&self, spec: &RunSpec) -> RunStatus {
        let Some(mut guard) = self.try_start(spec.max_attempts()) else {
            return if self.root.is_cancelled() {
                RunStatus::Idle
            } else {
                RunStatus::Running
            };
        };
        let run = guard.run;
        tracing::info!(
            run,
            recognizer = spec.recognizer().name(),
            max_attempts = spec.max_attempts(),
            "retry run started"
        );

        if let Some(preflight) = spec.preflight() {
            let checked = tokio::select! {
                biased;
                _ = guard.token.cancelled() => None,
                res = preflight.preflight() => Some(res),
            };
            match checked {
                None => return guard.finish(RunStatus::Idle),
                Some(Err(e)) => {
                    tracing::warn!(run, error = %e, "required elements missing, run aborted");
                    self.bus.publish(
                        Event::new(EventKind::RunAborted)
                            .with_run(run)
                            .with_attempt(0)
                            .with_reason(e.to_string()),
                    );
                    return guard.finish_silent(RunStatus::Idle);
                }
                Some(Ok(())) => {}
            }
        }

        let outcome = self.drive(&mut guard, spec).await;
        guard.finish(outcome)
    }

    /// Runs `spec` on a background task.
    ///
    /// Convenience for trigger sources that cannot await (key handlers, timers).
    pub fn spawn(self: &Arc<Self>, spec: RunSpec) -> JoinHandle<RunStatus> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(&spec).await })
    }

    /// Cancels the active run, if any. Returns whether a run was signalled.
    ///
    /// The run notices promptly, writes `Idle` itself and publishes `RunCancelled`.
    pub fn cancel(&self) -> bool {
        match self.lock_active().as_ref() {
            Some(active) => {
                tracing::info!(run = active.id, "cancelling retry run");
                active.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels the active run, refuses new ones and drains all subscribers.
    pub async fn shutdown(&self) {
        self.root.cancel();

        let mut rx = self.progress.subscribe();
        let _ = rx.wait_for(|p| p.status != RunStatus::Running).await;

        self.listener_stop.cancel();
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = listener {
            let _ = handle.await;
        }
    }

    /// The attempt loop. Returns the outcome status; never fails.
    async fn drive(&self, guard: &mut RunGuard<'_>, spec: &RunSpec) -> RunStatus {
        let run = guard.run;
        let token = guard.token.clone();
        let max_attempts = spec.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            if token.is_cancelled() {
                return RunStatus::Idle;
            }
            if attempt >= max_attempts {
                return RunStatus::Exhausted;
            }

            attempt += 1;
            self.update(|p| p.attempt = attempt);
            let ctx = AttemptCtx {
                run,
                attempt,
                max_attempts,
            };
            self.bus.publish(ctx.event(EventKind::AttemptStarting));

            guard.open = Some(ctx);
            let _ = run_once(
                spec.recognizer().as_ref(),
                &token,
                spec.attempt_timeout(),
                ctx,
                &self.bus,
            )
            .await;
            guard.open = None;
            if token.is_cancelled() {
                return RunStatus::Idle;
            }

            let delay = spec.observation().delay_after(attempt);
            self.bus
                .publish(ctx.event(EventKind::ObservationScheduled).with_delay(delay));
            tokio::select! {
                biased;
                _ = token.cancelled() => return RunStatus::Idle,
                _ = tokio::time::sleep(delay) => {}
            }

            let checked = tokio::select! {
                biased;
                _ = token.cancelled() => return RunStatus::Idle,
                res = spec.check().is_successful() => res,
            };
            match checked {
                Ok(true) => return RunStatus::Succeeded,
                Ok(false) => {
                    tracing::debug!(run, attempt, "value not accepted yet, retrying");
                    self.bus.publish(ctx.event(EventKind::CheckPending));
                }
                Err(e) => {
                    tracing::warn!(run, attempt, error = %e, "success check failed, retrying");
                    self.bus
                        .publish(ctx.event(EventKind::CheckPending).with_reason(e.to_string()));
                }
            }
        }
    }

    /// Atomically claims the controller for a new run.
    ///
    /// Returns `None` when a run is already active or the controller is shut down.
    fn try_start(&self, max_attempts: u32) -> Option<RunGuard<'_>> {
        let guard = {
            let mut active = self.lock_active();
            if self.root.is_cancelled() {
                return None;
            }
            if let Some(current) = active.as_ref() {
                let p = self.progress();
                tracing::warn!(run = current.id, attempt = p.attempt, "already running, trigger ignored");
                self.bus.publish(
                    Event::new(EventKind::RunRejected)
                        .with_run(current.id)
                        .with_attempt(p.attempt)
                        .with_max_attempts(p.max_attempts),
                );
                return None;
            }

            let id = self.next_run.fetch_add(1, Ordering::Relaxed);
            let token = self.root.child_token();
            *active = Some(ActiveRun {
                id,
                token: token.clone(),
            });
            self.progress.send_replace(Progress::started(max_attempts));
            self.bus.publish(
                Event::new(EventKind::RunTriggered)
                    .with_run(id)
                    .with_attempt(0)
                    .with_max_attempts(max_attempts),
            );
            RunGuard {
                ctl: self,
                run: id,
                token,
                open: None,
                armed: true,
            }
        };
        self.present();
        Some(guard)
    }

    /// Publishes the terminal event for `outcome`, then releases the controller.
    fn finish(&self, run: u64, outcome: RunStatus) -> RunStatus {
        let p = self.progress();
        let kind = match outcome {
            RunStatus::Succeeded => EventKind::RunSucceeded,
            RunStatus::Exhausted => EventKind::RunExhausted,
            RunStatus::Idle | RunStatus::Running => EventKind::RunCancelled,
        };
        tracing::info!(run, attempts = p.attempt, outcome = %outcome, "retry run finished");
        self.bus.publish(
            Event::new(kind)
                .with_run(run)
                .with_attempt(p.attempt)
                .with_max_attempts(p.max_attempts),
        );
        self.release(run, outcome)
    }

    /// Writes the outcome and releases the controller without publishing.
    fn release(&self, run: u64, outcome: RunStatus) -> RunStatus {
        let written = {
            let mut active = self.lock_active();
            if active.as_ref().is_some_and(|a| a.id == run) {
                self.progress.send_modify(|p| p.status = outcome);
                *active = None;
                true
            } else {
                false
            }
        };
        if written {
            self.present();
        }
        outcome
    }

    fn update(&self, f: impl FnOnce(&mut Progress)) {
        self.progress.send_modify(f);
        self.present();
    }

    fn present(&self) {
        if let Some(presenter) = &self.presenter {
            let snapshot = self.progress();
            presenter.render(&snapshot);
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the controller for one run.
///
/// Released through [`finish`](Self::finish) or
/// [`finish_silent`](Self::finish_silent). If the run future is dropped
/// first, `Drop` cancels the run, closes the open attempt and writes `Idle`.
struct RunGuard<'a> {
    ctl: &'a RetryController,
    run: u64,
    token: CancellationToken,
    /// Attempt whose terminal event has not been published yet.
    open: Option<AttemptCtx>,
    armed: bool,
}

impl RunGuard<'_> {
    fn finish(mut self, outcome: RunStatus) -> RunStatus {
        self.armed = false;
        self.ctl.finish(self.run, outcome)
    }

    fn finish_silent(mut self, outcome: RunStatus) -> RunStatus {
        self.armed = false;
        self.ctl.release(self.run, outcome)
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.token.cancel();
        if let Some(ctx) = self.open.take() {
            self.ctl.bus.publish(
                ctx.event(EventKind::AttemptFailed)
                    .with_reason(AttemptError::Canceled.to_string()),
            );
        }
        tracing::warn!(run = self.run, "run dropped before completion");
        self.ctl.finish(self.run, RunStatus::Idle);
    }
}

impl Drop for RetryController {
    fn drop(&mut self) {
        self.root.cancel();
        self.listener_stop.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::{
        error::{AttemptError, PreflightError},
        policies::ObservationPolicy,
        probes::{CheckFn, CheckRef, PreflightFn, RecognizeFn, RecognizerRef},
        status::PresentFn,
        subscribers::Subscribe,
    };

    /// Recognizer that counts calls and always reports a usable result.
    fn counting(calls: Arc<AtomicU32>) -> RecognizerRef {
        RecognizeFn::arc("counting", move |_ctx: CancellationToken| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AttemptError>(true)
            }
        })
    }

    /// Check that holds from its `n`-th evaluation on (never for `n == 0`).
    fn holds_on(n: u32) -> CheckRef {
        let evaluated = Arc::new(AtomicU32::new(0));
        CheckFn::arc(move || {
            let evaluated = evaluated.clone();
            async move {
                let k = evaluated.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, AttemptError>(n > 0 && k >= n)
            }
        })
    }

    fn controller() -> Arc<RetryController> {
        RetryController::builder(Config::default()).build().unwrap()
    }

    fn spec(recognizer: RecognizerRef, check: CheckRef, max: u32) -> RunSpec {
        RunSpec::new(recognizer, check, max, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn never_successful_runs_exactly_max_attempts() {
        let ctl = controller();
        let calls = Arc::new(AtomicU32::new(0));

        let status = ctl.run(&spec(counting(calls.clone()), holds_on(0), 10)).await;

        assert_eq!(status, RunStatus::Exhausted);
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(
            ctl.progress(),
            Progress {
                status: RunStatus::Exhausted,
                attempt: 10,
                max_attempts: 10
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_successful_check() {
        let ctl = controller();
        let calls = Arc::new(AtomicU32::new(0));

        let status = ctl.run(&spec(counting(calls.clone()), holds_on(3), 10)).await;

        assert_eq!(status, RunStatus::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(ctl.progress().attempt, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_observation_window_before_each_check() {
        let ctl = controller();
        let started = tokio::time::Instant::now();

        ctl.run(&spec(counting(Arc::default()), holds_on(3), 10)).await;

        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_recognizer_still_counts_and_continues() {
        let ctl = controller();
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let flaky = RecognizeFn::arc("flaky", move |_ctx: CancellationToken| {
            let seen = seen.clone();
            async move {
                match seen.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(AttemptError::fail("malformed result")),
                    1 => panic!("ocr engine crashed"),
                    _ => Ok(false),
                }
            }
        });

        let status = ctl.run(&spec(flaky, holds_on(4), 5)).await;

        assert_eq!(status, RunStatus::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_recognizer_is_bounded_by_attempt_timeout() {
        let ctl = controller();
        let hung = RecognizeFn::arc("hung", |_ctx: CancellationToken| async {
            std::future::pending::<()>().await;
            Ok::<_, AttemptError>(true)
        });
        let spec = spec(hung, holds_on(0), 3).with_attempt_timeout(Some(Duration::from_secs(1)));

        let started = tokio::time::Instant::now();
        assert_eq!(ctl.run(&spec).await, RunStatus::Exhausted);
        assert_eq!(started.elapsed(), Duration::from_secs(3 * (1 + 2)));
    }

    #[tokio::test(start_paused = true)]
    async fn erroring_check_is_treated_as_not_yet() {
        let ctl = controller();
        let broken = CheckFn::arc(|| async { Err::<bool, _>(AttemptError::fail("input gone")) });

        assert_eq!(
            ctl.run(&spec(counting(Arc::default()), broken, 2)).await,
            RunStatus::Exhausted
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_elements_abort_without_attempts() {
        let ctl = controller();
        let calls = Arc::new(AtomicU32::new(0));
        let missing = PreflightFn::arc(|| async { Err::<(), _>(PreflightError::new(["captcha input"])) });
        let spec = spec(counting(calls.clone()), holds_on(1), 10).with_preflight(missing);

        assert_eq!(ctl.run(&spec).await, RunStatus::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctl.progress().attempt, 0);
        assert_eq!(ctl.status(), RunStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn passing_preflight_runs_normally() {
        let ctl = controller();
        let present = PreflightFn::arc(|| async { Ok::<_, PreflightError>(()) });
        let spec = spec(counting(Arc::default()), holds_on(1), 10).with_preflight(present);

        assert_eq!(ctl.run(&spec).await, RunStatus::Succeeded);
    }

    /// Recognizer that parks until released, to hold a run in `Running`.
    fn gated(gate: Arc<Notify>) -> RecognizerRef {
        RecognizeFn::arc("gated", move |_ctx: CancellationToken| {
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Ok::<_, AttemptError>(true)
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_while_running_is_a_no_op() {
        let ctl = controller();
        let gate = Arc::new(Notify::new());
        let first = ctl.spawn(spec(gated(gate.clone()), holds_on(1), 10));

        ctl.watch().wait_for(|p| p.attempt == 1).await.unwrap();
        let before = ctl.progress();

        let calls = Arc::new(AtomicU32::new(0));
        let second = ctl.run(&spec(counting(calls.clone()), holds_on(1), 3)).await;

        assert_eq!(second, RunStatus::Running);
        assert_eq!(ctl.progress(), before);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), RunStatus::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_promptly_and_returns_idle() {
        let ctl = controller();
        let gate = Arc::new(Notify::new());
        let run = ctl.spawn(spec(gated(gate), holds_on(0), 10));

        ctl.watch().wait_for(|p| p.attempt == 1).await.unwrap();
        assert!(ctl.cancel());

        assert_eq!(run.await.unwrap(), RunStatus::Idle);
        assert_eq!(ctl.status(), RunStatus::Idle);
        assert_eq!(ctl.progress().attempt, 1);
        assert!(!ctl.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_attempt_still_gets_terminal_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ctl = RetryController::builder(Config::default())
            .with_subscribers(vec![Arc::new(Recorder(seen.clone()))])
            .build()
            .unwrap();
        let gate = Arc::new(Notify::new());
        let run = ctl.spawn(spec(gated(gate), holds_on(0), 10));

        ctl.watch().wait_for(|p| p.attempt == 1).await.unwrap();
        ctl.cancel();
        assert_eq!(run.await.unwrap(), RunStatus::Idle);
        ctl.shutdown().await;

        let events = seen.lock().unwrap();
        let count = |kind| events.iter().filter(|e| e.kind == kind).count();
        assert_eq!(count(EventKind::AttemptStarting), 1);
        assert_eq!(count(EventKind::AttemptCompleted) + count(EventKind::AttemptFailed), 1);
        let failed = events
            .iter()
            .find(|e| e.kind == EventKind::AttemptFailed)
            .unwrap();
        assert_eq!(failed.reason.as_deref(), Some("attempt cancelled"));
        assert_eq!(count(EventKind::RunCancelled), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_run_future_releases_controller() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ctl = RetryController::builder(Config::default())
            .with_subscribers(vec![Arc::new(Recorder(seen.clone()))])
            .build()
            .unwrap();
        let gate = Arc::new(Notify::new());
        let stuck = spec(gated(gate), holds_on(0), 10);

        let dropped = tokio::time::timeout(Duration::from_secs(1), ctl.run(&stuck)).await;
        assert!(dropped.is_err());
        assert_eq!(ctl.status(), RunStatus::Idle);
        assert!(!ctl.cancel());

        let calls = Arc::new(AtomicU32::new(0));
        assert_eq!(
            ctl.run(&spec(counting(calls.clone()), holds_on(1), 3)).await,
            RunStatus::Succeeded
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::timeout(Duration::from_secs(60), ctl.shutdown())
            .await
            .unwrap();

        let events = seen.lock().unwrap();
        let count = |kind| events.iter().filter(|e| e.kind == kind).count();
        assert_eq!(count(EventKind::AttemptStarting), 2);
        assert_eq!(count(EventKind::AttemptCompleted) + count(EventKind::AttemptFailed), 2);
        assert_eq!(count(EventKind::RunCancelled), 1);
        assert_eq!(count(EventKind::RunSucceeded), 1);
    }

    #[tokio::test]
    async fn aborted_spawned_run_releases_controller() {
        let ctl = controller();
        let gate = Arc::new(Notify::new());
        let run = ctl.spawn(spec(gated(gate), holds_on(0), 10));
        ctl.watch().wait_for(|p| p.attempt == 1).await.unwrap();

        run.abort();
        assert!(run.await.unwrap_err().is_cancelled());

        assert_eq!(ctl.status(), RunStatus::Idle);
        ctl.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn presenter_may_call_back_into_controller() {
        let handle: Arc<std::sync::OnceLock<std::sync::Weak<RetryController>>> = Arc::default();
        let cancels = Arc::new(AtomicU32::new(0));
        let (slot, hits) = (handle.clone(), cancels.clone());
        let ctl = RetryController::builder(Config::default())
            .with_presenter(Arc::new(PresentFn(move |_p: &Progress| {
                if let Some(ctl) = slot.get().and_then(std::sync::Weak::upgrade) {
                    if ctl.cancel() {
                        hits.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })))
            .build()
            .unwrap();
        handle.set(Arc::downgrade(&ctl)).unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let status = ctl.run(&spec(counting(calls.clone()), holds_on(1), 3)).await;

        assert_eq!(status, RunStatus::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_observation_window() {
        let ctl = controller();
        let calls = Arc::new(AtomicU32::new(0));
        let run = ctl.spawn(spec(counting(calls.clone()), holds_on(0), 10));

        tokio::time::sleep(Duration::from_secs(3)).await;
        ctl.cancel();

        assert_eq!(run.await.unwrap(), RunStatus::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn new_run_resets_counter() {
        let ctl = controller();
        let calls = Arc::new(AtomicU32::new(0));

        assert_eq!(
            ctl.run(&spec(counting(calls.clone()), holds_on(0), 4)).await,
            RunStatus::Exhausted
        );
        assert_eq!(
            ctl.run(&spec(counting(calls.clone()), holds_on(2), 4)).await,
            RunStatus::Succeeded
        );
        assert_eq!(ctl.progress().attempt, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn presenter_sees_every_step() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = frames.clone();
        let ctl = RetryController::builder(Config::default())
            .with_presenter(Arc::new(PresentFn(move |p: &Progress| {
                sink.lock().unwrap().push(p.to_string());
            })))
            .build()
            .unwrap();

        ctl.run(&spec(counting(Arc::default()), holds_on(0), 2)).await;

        assert_eq!(
            *frames.lock().unwrap(),
            vec![
                "Attempt 0 / 2",
                "Attempt 1 / 2",
                "Attempt 2 / 2",
                "Max attempts reached (2)"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn growing_observation_policy_is_applied() {
        let ctl = controller();
        let policy = ObservationPolicy {
            first: Duration::from_secs(1),
            factor: 2.0,
            max: Duration::from_secs(60),
            ..ObservationPolicy::default()
        };
        let spec = spec(counting(Arc::default()), holds_on(0), 3)
            .with_observation(policy)
            .unwrap();

        let started = tokio::time::Instant::now();
        ctl.run(&spec).await;
        assert_eq!(started.elapsed(), Duration::from_secs(1 + 2 + 4));
    }

    struct Recorder(Arc<Mutex<Vec<Event>>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.clone());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_one_terminal_event_per_attempt() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ctl = RetryController::builder(Config::default())
            .with_subscribers(vec![Arc::new(Recorder(seen.clone()))])
            .build()
            .unwrap();

        ctl.run(&spec(counting(Arc::default()), holds_on(3), 5)).await;
        ctl.shutdown().await;

        let events = seen.lock().unwrap();
        let count = |kind| events.iter().filter(|e| e.kind == kind).count();
        assert_eq!(count(EventKind::RunTriggered), 1);
        assert_eq!(count(EventKind::AttemptStarting), 3);
        assert_eq!(count(EventKind::AttemptCompleted) + count(EventKind::AttemptFailed), 3);
        assert_eq!(count(EventKind::CheckPending), 2);
        assert_eq!(count(EventKind::RunSucceeded), 1);
        assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
        assert!(events.last().unwrap().is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_and_refuses_new_runs() {
        let ctl = controller();
        let gate = Arc::new(Notify::new());
        let run = ctl.spawn(spec(gated(gate), holds_on(0), 10));
        ctl.watch().wait_for(|p| p.attempt == 1).await.unwrap();

        ctl.shutdown().await;

        assert_eq!(run.await.unwrap(), RunStatus::Idle);
        let calls = Arc::new(AtomicU32::new(0));
        assert_eq!(
            ctl.run(&spec(counting(calls.clone()), holds_on(1), 3)).await,
            RunStatus::Idle
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_by_builder() {
        let cfg = Config {
            max_attempts: 0,
            ..Config::default()
        };
        assert!(matches!(
            RetryController::builder(cfg).build(),
            Err(crate::ConfigError::ZeroAttempts)
        ));
    }
}
