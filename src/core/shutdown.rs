//! # OS signal handling.
//!
//! [`wait_for_shutdown_signal`] completes when the process receives a
//! termination signal; [`RetryController::cancel_on_shutdown_signal`] wires it
//! to cancellation, the way a page unload stops a solver mid-run.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT`. **Other platforms:** Ctrl-C.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::controller::RetryController;

/// Waits for a termination signal.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

impl RetryController {
    /// Spawns a task that shuts the controller down on the first termination signal.
    ///
    /// The active run, if any, ends `Idle`; later triggers are refused.
    pub fn cancel_on_shutdown_signal(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(()) => {
                    tracing::info!("shutdown signal received, stopping retry controller");
                    this.shutdown().await;
                }
                Err(e) => tracing::error!(error = %e, "failed to install signal handlers"),
            }
        })
    }
}
