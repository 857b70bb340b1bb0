//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Quote provider error: {0}")]
    Quote(#[from] trig_quote::QuoteError),

    #[error("HTTP error: {0}")]
    Http(#[from] trig_http::HttpError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] trig_telemetry::TelemetryError),

    #[error("Task failed: {0}")]
    Task(String),
}

pub type AppResult<T> = Result<T, AppError>;
