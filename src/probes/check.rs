//! # Success and preflight collaborators.
//!
//! - [`SuccessCheck`] answers "does the target now hold an accepted value?"
//!   after every observation window.
//! - [`Preflight`] answers "are the required elements there at all?" once,
//!   before a run consumes any attempt.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AttemptError, PreflightError};

/// Shared handle to a success check.
pub type CheckRef = Arc<dyn SuccessCheck>;

/// Shared handle to a preflight check.
pub type PreflightRef = Arc<dyn Preflight>;

/// External success predicate.
///
/// An `Err` is logged and treated as "not successful yet".
#[async_trait]
pub trait SuccessCheck: Send + Sync + 'static {
    async fn is_successful(&self) -> Result<bool, AttemptError>;
}

/// Verifies required elements before a run starts.
#[async_trait]
pub trait Preflight: Send + Sync + 'static {
    async fn preflight(&self) -> Result<(), PreflightError>;
}

/// Function-backed [`SuccessCheck`].
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use retryvisor::{AttemptError, CheckFn, CheckRef};
///
/// let accepted = Arc::new(AtomicBool::new(false));
/// let flag = accepted.clone();
/// let check: CheckRef = CheckFn::arc(move || {
///     let flag = flag.clone();
///     async move { Ok::<_, AttemptError>(flag.load(Ordering::SeqCst)) }
/// });
/// # let _ = check;
/// ```
pub struct CheckFn<F>(F);

impl<F> CheckFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }

    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self(f))
    }
}

#[async_trait]
impl<F, Fut> SuccessCheck for CheckFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, AttemptError>> + Send + 'static,
{
    async fn is_successful(&self) -> Result<bool, AttemptError> {
        (self.0)().await
    }
}

/// Function-backed [`Preflight`].
pub struct PreflightFn<F>(F);

impl<F> PreflightFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }

    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self(f))
    }
}

#[async_trait]
impl<F, Fut> Preflight for PreflightFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), PreflightError>> + Send + 'static,
{
    async fn preflight(&self) -> Result<(), PreflightError> {
        (self.0)().await
    }
}
