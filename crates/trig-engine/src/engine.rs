//! `TriggerEngine`: the registry plus one poller task per active trigger.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use trig_core::{FiredTrigger, Price, Trigger, TriggerKey};
use trig_quote::QuoteProvider;
use trig_registry::{Book, Registration, TriggerRegistry};
use trig_telemetry::Metrics;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::poller::ConditionPoller;

/// Register/activate/cancel entry point used by the request handlers.
pub struct TriggerEngine {
    registry: Arc<TriggerRegistry>,
    quotes: Arc<dyn QuoteProvider>,
    /// Taken on shutdown so the dispatcher sees the channel close once the
    /// last poller exits.
    completion_tx: Mutex<Option<mpsc::Sender<FiredTrigger>>>,
    pollers: TaskTracker,
    poll_interval: Duration,
}

impl TriggerEngine {
    /// Create the engine and the receiving end of its completion channel.
    pub fn new(
        registry: Arc<TriggerRegistry>,
        quotes: Arc<dyn QuoteProvider>,
        config: &EngineConfig,
    ) -> (Self, mpsc::Receiver<FiredTrigger>) {
        let (tx, rx) = mpsc::channel(config.completion_capacity.max(1));
        let engine = Self {
            registry,
            quotes,
            completion_tx: Mutex::new(Some(tx)),
            pollers: TaskTracker::new(),
            poll_interval: config.poll_interval(),
        };
        (engine, rx)
    }

    pub fn registry(&self) -> &Arc<TriggerRegistry> {
        &self.registry
    }

    /// Register a PENDING trigger. Replaces any trigger holding the key.
    pub fn register(
        &self,
        key: TriggerKey,
        transaction_number: i64,
        share_amount: u64,
    ) -> Registration {
        let registration = self.registry.register(key, transaction_number, share_amount);
        Metrics::registered(registration.trigger.action().as_str());
        info!(
            key = %registration.trigger.key,
            id = %registration.trigger.id,
            transnum = transaction_number,
            amount = share_amount,
            replaced = registration.replaced.is_some(),
            "Trigger added but not started"
        );
        registration
    }

    /// Activate a pending trigger and start its poller.
    pub fn activate(&self, key: &TriggerKey, threshold: Price) -> EngineResult<Trigger> {
        let tx = self
            .completion_tx
            .lock()
            .clone()
            .ok_or(EngineError::ShuttingDown)?;
        if self.registry.is_shutdown() {
            return Err(EngineError::ShuttingDown);
        }

        let activation = self.registry.activate(key, threshold)?;
        let trigger = activation.trigger.clone();
        Metrics::activated(trigger.action().as_str());

        let poller = ConditionPoller::new(activation, self.quotes.clone(), tx, self.poll_interval);
        self.pollers.spawn(async move {
            let outcome = poller.run().await;
            debug!(?outcome, "Poller exited");
        });

        info!(
            key = %trigger.key,
            id = %trigger.id,
            threshold = %threshold,
            "Trigger started"
        );
        Ok(trigger)
    }

    /// Cancel a pending or active trigger.
    pub fn cancel(&self, key: &TriggerKey) -> EngineResult<Trigger> {
        let trigger = self.registry.cancel(key)?;
        info!(key = %trigger.key, id = %trigger.id, "Trigger cancelled");
        Ok(trigger)
    }

    pub fn snapshot(&self, book: Book) -> Vec<Trigger> {
        self.registry.snapshot(book)
    }

    /// Number of running poller tasks.
    pub fn poller_count(&self) -> usize {
        self.pollers.len()
    }

    /// Stop every poller and release the completion sender.
    ///
    /// Returns once all pollers have exited. The dispatcher then drains
    /// whatever was already fired and stops on its own.
    pub async fn shutdown(&self) {
        info!(pollers = self.pollers.len(), "Stopping trigger engine");
        self.registry.shutdown();
        self.completion_tx.lock().take();
        self.pollers.close();
        self.pollers.wait().await;
        info!("Trigger engine stopped");
    }
}

impl std::fmt::Debug for TriggerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerEngine")
            .field("registry", &self.registry)
            .field("pollers", &self.pollers.len())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
