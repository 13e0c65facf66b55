//! # retryvisor
//!
//! **Retryvisor** drives a bounded retry loop around an external recognition
//! call: run an attempt, wait an observation window, ask an external success
//! check, repeat up to a fixed bound. Attempt count and run status are
//! observable at any time, so a UI can show "attempt k / N".
//!
//! ## Architecture
//! ```text
//!   trigger (key handler, timer, CLI...)
//!        │
//!        ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ RetryController                                              │
//! │  - Progress { status, attempt, max_attempts }  ──► watch rx   │
//! │                                                ──► Present    │
//! │  - one active run at a time (reentrant trigger = no-op)      │
//! └───────┬───────────────────────────────────────────────┬──────┘
//!         │ per attempt                                   │ publish
//!         ▼                                               ▼
//!   run_once(Recognize)   sleep(observation)   SuccessCheck    Bus ──► SubscriberSet
//!   (timeout, panics,          │                    │                  ├─► LogWriter
//!    errors → failed attempt)  └────────────────────┘                  └─► custom
//! ```
//!
//! ## Run lifecycle
//! ```text
//! Idle ──run()──► Running ──check holds──────────► Succeeded
//!                    │ └────attempt == max────────► Exhausted
//!                    └──────cancel()──────────────► Idle
//! ```
//!
//! ## Features
//! | Area              | Description                                             | Key types / traits                      |
//! |-------------------|---------------------------------------------------------|-----------------------------------------|
//! | **Controller**    | Bounded retry loop, cancellation, reentrancy guard.     | [`RetryController`], [`RunStatus`]      |
//! | **Collaborators** | Recognition call, success check, preflight.             | [`Recognize`], [`SuccessCheck`], [`Preflight`] |
//! | **Policies**      | Observation window growth and jitter.                   | [`ObservationPolicy`], [`JitterPolicy`] |
//! | **Presentation**  | Progress snapshots, watch channel, render callback.     | [`Progress`], [`Present`]               |
//! | **Events**        | Lifecycle events for logging/metrics.                   | [`Event`], [`Subscribe`]                |
//! | **Errors**        | Typed errors with stable labels.                        | [`AttemptError`], [`ConfigError`]       |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a `tracing`-backed subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use retryvisor::{AttemptError, CheckFn, Config, RecognizeFn, RetryController, RunSpec, RunStatus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = RetryController::builder(Config::default()).build()?;
//!
//!     let attempts = Arc::new(AtomicU32::new(0));
//!     let seen = attempts.clone();
//!     let ocr = RecognizeFn::arc("ocr", move |_ctx: CancellationToken| {
//!         let seen = seen.clone();
//!         async move {
//!             seen.fetch_add(1, Ordering::SeqCst);
//!             Ok::<_, AttemptError>(true)
//!         }
//!     });
//!     let counter = attempts.clone();
//!     let accepted = CheckFn::arc(move || {
//!         let counter = counter.clone();
//!         async move { Ok::<_, AttemptError>(counter.load(Ordering::SeqCst) >= 2) }
//!     });
//!
//!     let spec = RunSpec::new(ocr, accepted, 10, Duration::from_millis(10))?;
//!     assert_eq!(controller.run(&spec).await, RunStatus::Succeeded);
//!     assert_eq!(controller.progress().attempt, 2);
//!
//!     controller.shutdown().await;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod policies;
mod probes;
mod status;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{ControllerBuilder, RetryController, wait_for_shutdown_signal};
pub use error::{AttemptError, ConfigError, PreflightError};
pub use events::{Bus, Event, EventKind};
pub use policies::{JitterPolicy, ObservationPolicy};
pub use probes::{
    Charset, CheckFn, CheckRef, CodeFormat, Preflight, PreflightFn, PreflightRef, Recognize,
    RecognizeFn, RecognizerRef, RunSpec, SuccessCheck,
};
pub use status::{Present, PresentFn, Progress, RunStatus};
pub use subscribers::{Subscribe, SubscriberSet};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
