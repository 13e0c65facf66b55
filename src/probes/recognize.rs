//! # Recognition collaborator.
//!
//! A [`Recognize`] implementation performs one recognition call: inspect a
//! rendered artifact, extract a value, apply it. It reports `Ok(true)` when a
//! usable result was produced and applied, `Ok(false)` when it ran but got
//! nothing usable, and `Err` when it failed outright. The controller treats all
//! three alike for the attempt bound; only the success check ends a run.
//!
//! The [`CancellationToken`] handed to each call is a per-attempt child token.
//! It is cancelled when the attempt times out or the run is cancelled, so
//! long-running recognizers should watch it.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AttemptError;

/// Shared handle to a recognizer.
pub type RecognizerRef = Arc<dyn Recognize>;

/// # One recognition call.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use retryvisor::{AttemptError, CodeFormat, Recognize};
///
/// struct StaticOcr(&'static str);
///
/// #[async_trait]
/// impl Recognize for StaticOcr {
///     fn name(&self) -> &str { "static-ocr" }
///
///     async fn recognize(&self, _ctx: CancellationToken) -> Result<bool, AttemptError> {
///         Ok(CodeFormat::digits(4).extract(self.0).is_some())
///     }
/// }
/// ```
#[async_trait]
pub trait Recognize: Send + Sync + 'static {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    /// Runs one recognition call.
    async fn recognize(&self, ctx: CancellationToken) -> Result<bool, AttemptError>;
}

/// Function-backed recognizer.
///
/// Wraps a closure that creates a fresh future per attempt; no state is
/// shared between attempts unless the closure captures an `Arc` explicitly.
///
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use retryvisor::{AttemptError, RecognizeFn, RecognizerRef};
///
/// let r: RecognizerRef = RecognizeFn::arc("ocr", |_ctx: CancellationToken| async {
///     Ok::<_, AttemptError>(true)
/// });
/// assert_eq!(r.name(), "ocr");
/// ```
pub struct RecognizeFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> RecognizeFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the recognizer as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Recognize for RecognizeFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, AttemptError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn recognize(&self, ctx: CancellationToken) -> Result<bool, AttemptError> {
        (self.f)(ctx).await
    }
}
