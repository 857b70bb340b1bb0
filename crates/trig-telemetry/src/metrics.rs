//! Prometheus metrics for the trigger server.
//!
//! Covers:
//! - Trigger lifecycle (registered, activated, cancelled, fired)
//! - Live book sizes (pending / active)
//! - Quote lookups (latency, failures)
//! - Ledger notifications (outcome, latency)
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, which is a programming error that should
//! crash at startup. These panics only occur during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, register_int_gauge,
    CounterVec, Encoder, Histogram, IntCounter, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Total triggers registered.
/// Labels: action (BUY/SELL)
pub static REGISTERED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "trig_registered_total",
        "Total triggers registered (pending)",
        &["action"]
    )
    .unwrap()
});

/// Total triggers activated.
pub static ACTIVATED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "trig_activated_total",
        "Total triggers activated with a threshold",
        &["action"]
    )
    .unwrap()
});

/// Total triggers cancelled.
/// Labels: state (PENDING/ACTIVE) the trigger was cancelled from
pub static CANCELLED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "trig_cancelled_total",
        "Total triggers cancelled",
        &["state"]
    )
    .unwrap()
});

/// Total triggers whose fire condition was observed.
pub static FIRED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "trig_fired_total",
        "Total triggers fired by a poller",
        &["action"]
    )
    .unwrap()
});

/// Current pending triggers.
pub static PENDING: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("trig_pending", "Current pending triggers").unwrap());

/// Current active triggers.
pub static ACTIVE: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("trig_active", "Current active triggers").unwrap());

/// Total failed quote lookups.
pub static QUOTE_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("trig_quote_errors_total", "Total failed quote lookups").unwrap()
});

/// Quote lookup latency in milliseconds.
pub static QUOTE_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "trig_quote_latency_ms",
        "Quote lookup latency in milliseconds",
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Ledger notifications by outcome.
/// Labels: outcome (delivered/failed/dropped_race)
pub static NOTIFY_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "trig_notify_total",
        "Ledger notifications by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Ledger notification latency in milliseconds (all attempts).
pub static NOTIFY_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "trig_notify_latency_ms",
        "Ledger notification latency in milliseconds",
        vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 15000.0]
    )
    .unwrap()
});

/// Metrics helper.
pub struct Metrics;

impl Metrics {
    /// Record a registration.
    pub fn registered(action: &str) {
        REGISTERED_TOTAL.with_label_values(&[action]).inc();
    }

    /// Record an activation.
    pub fn activated(action: &str) {
        ACTIVATED_TOTAL.with_label_values(&[action]).inc();
    }

    /// Record a cancellation from the given state.
    pub fn cancelled(from_state: &str) {
        CANCELLED_TOTAL.with_label_values(&[from_state]).inc();
    }

    /// Record a fire event.
    pub fn fired(action: &str) {
        FIRED_TOTAL.with_label_values(&[action]).inc();
    }

    /// Update book sizes.
    pub fn book_sizes(pending: usize, active: usize) {
        PENDING.set(pending as i64);
        ACTIVE.set(active as i64);
    }

    /// Record a quote lookup.
    pub fn quote(latency_ms: f64, ok: bool) {
        QUOTE_LATENCY_MS.observe(latency_ms);
        if !ok {
            QUOTE_ERRORS_TOTAL.inc();
        }
    }

    /// Record a notification outcome.
    pub fn notify(outcome: &str) {
        NOTIFY_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record a notification attempt's latency.
    pub fn notify_latency(latency_ms: f64) {
        NOTIFY_LATENCY_MS.observe(latency_ms);
    }
}

/// Render all registered metrics in the Prometheus text format.
pub fn render_metrics() -> TelemetryResult<String> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buf = Vec::new();
    encoder
        .encode(&families, &mut buf)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_metrics() {
        Metrics::registered("BUY");
        Metrics::book_sizes(3, 2);
        Metrics::notify("delivered");

        let text = render_metrics().unwrap();
        assert!(text.contains("trig_registered_total"));
        assert!(text.contains("trig_pending 3"));
        assert!(text.contains("trig_active 2"));
        assert!(text.contains("outcome=\"delivered\""));
    }

    #[test]
    fn test_quote_error_counter() {
        let before = QUOTE_ERRORS_TOTAL.get();
        Metrics::quote(12.0, false);
        Metrics::quote(3.0, true);
        assert_eq!(QUOTE_ERRORS_TOTAL.get(), before + 1);
    }
}
