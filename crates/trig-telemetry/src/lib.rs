//! Prometheus metrics and structured logging for the trigger server.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters/gauges/histograms for the trigger lifecycle,
//!   quote lookups and ledger notifications

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::{render_metrics, Metrics};
