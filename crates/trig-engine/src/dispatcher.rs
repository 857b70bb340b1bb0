//! Completion dispatcher.
//!
//! Single consumer of the fired-trigger channel. Each fire is completed in
//! the registry and then delivered to the ledger, strictly in arrival
//! order. A failed delivery is logged and the loop moves on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use trig_core::FiredTrigger;
use trig_registry::{RegistryError, TriggerRegistry};
use trig_telemetry::Metrics;

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::ledger::LedgerNotifier;

/// Result of dispatching one fired trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Completed and delivered to the ledger.
    Delivered,
    /// Completed, but every delivery attempt failed.
    Failed(LedgerError),
    /// The trigger was cancelled or replaced before completion.
    DroppedRace,
}

impl DispatchOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed(_) => "failed",
            Self::DroppedRace => "dropped_race",
        }
    }
}

/// Totals reported when the dispatcher exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl DispatchStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Delivered => self.delivered += 1,
            DispatchOutcome::Failed(_) => self.failed += 1,
            DispatchOutcome::DroppedRace => self.dropped += 1,
        }
    }
}

pub struct CompletionDispatcher {
    registry: Arc<TriggerRegistry>,
    notifier: Arc<dyn LedgerNotifier>,
    rx: mpsc::Receiver<FiredTrigger>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl CompletionDispatcher {
    pub fn new(
        registry: Arc<TriggerRegistry>,
        notifier: Arc<dyn LedgerNotifier>,
        rx: mpsc::Receiver<FiredTrigger>,
        config: &LedgerConfig,
    ) -> Self {
        Self {
            registry,
            notifier,
            rx,
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
        }
    }

    /// Drain the channel until every sender is gone.
    pub async fn run(mut self) -> DispatchStats {
        info!(max_attempts = self.max_attempts, "Completion dispatcher started");
        let mut stats = DispatchStats::default();

        while let Some(fired) = self.rx.recv().await {
            let outcome = self.dispatch(&fired).await;
            stats.record(&outcome);
        }

        info!(
            delivered = stats.delivered,
            failed = stats.failed,
            dropped = stats.dropped,
            "Completion dispatcher stopped"
        );
        stats
    }

    /// Complete one fired trigger and notify the ledger.
    pub async fn dispatch(&self, fired: &FiredTrigger) -> DispatchOutcome {
        let key = &fired.trigger.key;

        let outcome = match self.registry.complete(key, fired.trigger.id) {
            Err(RegistryError::NotActive(_)) | Err(RegistryError::NotFound(_)) => {
                debug!(
                    key = %key,
                    id = %fired.trigger.id,
                    "Fired trigger no longer active, dropping"
                );
                DispatchOutcome::DroppedRace
            }
            Err(e) => {
                // complete only reports NotActive; keep the loop alive regardless.
                warn!(key = %key, error = %e, "Unexpected completion error, dropping");
                DispatchOutcome::DroppedRace
            }
            Ok(_) => match self.deliver(fired).await {
                Ok(()) => DispatchOutcome::Delivered,
                Err(e) => DispatchOutcome::Failed(e),
            },
        };

        Metrics::notify(outcome.label());
        outcome
    }

    async fn deliver(&self, fired: &FiredTrigger) -> Result<(), LedgerError> {
        let key = &fired.trigger.key;
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            let result = self.notifier.notify(fired).await;
            Metrics::notify_latency(started.elapsed().as_secs_f64() * 1_000.0);

            match result {
                Ok(()) => {
                    info!(
                        key = %key,
                        transnum = fired.trigger.transaction_number,
                        price = %fired.fire_price(),
                        attempt,
                        "Ledger notified of fired trigger"
                    );
                    return Ok(());
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(key = %key, attempt, error = %e, "Ledger notification failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    error!(
                        key = %key,
                        transnum = fired.trigger.transaction_number,
                        attempts = attempt,
                        error = %e,
                        "Ledger notification failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}
