use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    error::ConfigError,
    events::{Bus, Event},
    status::Present,
    subscribers::{Subscribe, SubscriberSet},
};

use super::controller::RetryController;

/// Builder for a [`RetryController`].
pub struct ControllerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    presenter: Option<Arc<dyn Present>>,
}

impl ControllerBuilder {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            presenter: None,
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets its own bounded queue and worker task.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the presentation callback invoked on every progress change.
    pub fn with_presenter(mut self, presenter: Arc<dyn Present>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Validates the config, spawns the subscriber listener and returns the controller.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Arc<RetryController>, ConfigError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity);
        let set = SubscriberSet::new(self.subscribers, bus.clone());
        let listener_stop = CancellationToken::new();
        let listener = tokio::spawn(subscriber_listener(
            bus.subscribe(),
            set,
            listener_stop.clone(),
        ));

        Ok(Arc::new(RetryController::new_internal(
            self.cfg,
            bus,
            self.presenter,
            listener_stop,
            listener,
        )))
    }
}

/// Forwards bus events to the subscriber set until stopped, then drains and shuts it down.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    stop: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            res = rx.recv() => match res {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event listener lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            },
            _ = stop.cancelled() => {
                while let Ok(ev) = rx.try_recv() {
                    set.emit(&ev);
                }
                break;
            }
        }
    }
    set.shutdown().await;
}
