//! # Event subscribers.
//!
//! ```text
//! RetryController ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                               │
//!                                               ┌───────────────┼──────────────┐
//!                                               ▼               ▼              ▼
//!                                           LogWriter        Metrics        Custom
//! ```
//!
//! - [`Subscribe`] trait for custom handlers
//! - [`SubscriberSet`] non-blocking fan-out with per-subscriber queues
//! - `LogWriter` tracing-backed writer (feature `logging`)

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
