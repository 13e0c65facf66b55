//! Timing policies.
//!
//! ## Contents
//! - [`ObservationPolicy`] how long to wait after an attempt before checking success
//! - [`JitterPolicy`] randomization applied to that wait
//!
//! ## Defaults
//! - `ObservationPolicy::default()` → constant 2s window, max=30s, jitter=None.

mod jitter;
mod observation;

pub use jitter::JitterPolicy;
pub use observation::ObservationPolicy;
