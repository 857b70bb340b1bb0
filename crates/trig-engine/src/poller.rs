//! Condition poller: one task per active trigger.
//!
//! Samples the quote for the trigger's stock every tick and evaluates the
//! fire rule. Stops on the first of:
//! - fire: emits exactly one `FiredTrigger` on the completion channel
//! - stop token cancelled (cancel, replacement, shutdown): emits nothing
//!
//! Quote failures are logged and retried on the next tick.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use trig_core::{FiredTrigger, Price, Trigger};
use trig_quote::QuoteProvider;
use trig_registry::Activation;
use trig_telemetry::Metrics;

/// How a poller ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Fire rule held at this observed price; the trigger was emitted.
    Fired(Price),
    /// Stop token was cancelled before a fire was emitted.
    Stopped,
    /// Completion channel closed (dispatcher gone).
    ChannelClosed,
}

/// Monitors one active trigger.
pub struct ConditionPoller {
    trigger: Trigger,
    stop: CancellationToken,
    quotes: Arc<dyn QuoteProvider>,
    completion_tx: mpsc::Sender<FiredTrigger>,
    interval: Duration,
}

impl ConditionPoller {
    #[must_use]
    pub fn new(
        activation: Activation,
        quotes: Arc<dyn QuoteProvider>,
        completion_tx: mpsc::Sender<FiredTrigger>,
        interval: Duration,
    ) -> Self {
        Self {
            trigger: activation.trigger,
            stop: activation.stop,
            quotes,
            completion_tx,
            interval,
        }
    }

    /// Run until fired or stopped.
    pub async fn run(self) -> PollOutcome {
        let key = &self.trigger.key;
        debug!(
            key = %key,
            id = %self.trigger.id,
            threshold = ?self.trigger.threshold,
            interval_ms = self.interval.as_millis() as u64,
            "Poller started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => return self.stopped(),
                _ = ticker.tick() => {}
            }

            let started = Instant::now();
            let quote = tokio::select! {
                biased;
                _ = self.stop.cancelled() => return self.stopped(),
                quote = self.quotes.quote(&key.stock, &key.username) => quote,
            };
            Metrics::quote(started.elapsed().as_secs_f64() * 1_000.0, quote.is_ok());

            let observed = match quote {
                Ok(price) => price,
                Err(e) => {
                    warn!(key = %key, error = %e, "Quote lookup failed, retrying next tick");
                    continue;
                }
            };

            if !self.trigger.should_fire(observed) {
                trace!(key = %key, observed = %observed, "Condition not met");
                continue;
            }

            // A cancel that already reached the registry wins.
            if self.stop.is_cancelled() {
                return self.stopped();
            }

            let fired = FiredTrigger::new(self.trigger.clone(), observed);
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => return self.stopped(),
                sent = self.completion_tx.send(fired) => {
                    if sent.is_err() {
                        warn!(key = %key, "Completion channel closed, dropping fire");
                        return PollOutcome::ChannelClosed;
                    }
                }
            }

            Metrics::fired(self.trigger.action().as_str());
            info!(
                key = %key,
                id = %self.trigger.id,
                observed = %observed,
                threshold = ?self.trigger.threshold,
                "Trigger fired"
            );
            return PollOutcome::Fired(observed);
        }
    }

    fn stopped(&self) -> PollOutcome {
        debug!(key = %self.trigger.key, id = %self.trigger.id, "Poller stopped");
        PollOutcome::Stopped
    }
}
