//! Quote error types.

use thiserror::Error;

/// Transient quote lookup failure. Pollers retry on their next tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("Quote connection error: {0}")]
    Io(String),

    #[error("Quote lookup timed out after {0}ms")]
    Timeout(u64),

    #[error("Malformed quote reply: {0}")]
    Malformed(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("No quote available for {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for QuoteError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type QuoteResult<T> = Result<T, QuoteError>;
