//! # External collaborators of a run.
//!
//! - [`Recognize`] / [`RecognizeFn`] - the recognition call, one per attempt
//! - [`SuccessCheck`] / [`CheckFn`] - predicate evaluated after each observation window
//! - [`Preflight`] / [`PreflightFn`] - required-element check before the first attempt
//! - [`RunSpec`] - bundles the collaborators with the run's bounds and timing
//! - [`CodeFormat`] - helper for turning raw recognizer text into a fixed-length code

mod check;
mod code;
mod recognize;
mod spec;

pub use check::{CheckFn, CheckRef, Preflight, PreflightFn, PreflightRef, SuccessCheck};
pub use code::{Charset, CodeFormat};
pub use recognize::{Recognize, RecognizeFn, RecognizerRef};
pub use spec::RunSpec;
