//! Controller core: the retry loop and its wiring.
//!
//! Internal modules:
//! - [`controller`]: the bounded retry loop, progress state and cancellation;
//! - [`runner`]: executes one recognition attempt with timeout and panic capture;
//! - [`builder`]: validates config and wires bus, subscribers and presenter;
//! - [`shutdown`]: OS termination signals → controller shutdown.

mod builder;
mod controller;
mod runner;
mod shutdown;

pub use builder::ControllerBuilder;
pub use controller::RetryController;
pub use shutdown::wait_for_shutdown_signal;

/// Renders a caught panic payload as text.
pub(crate) fn panic_info(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
