//! Engine error types.

use thiserror::Error;
use trig_registry::RegistryError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Engine is shutting down")]
    ShuttingDown,
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Ledger notification delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Ledger connect to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    #[error("Ledger connect to {addr} timed out after {timeout_ms}ms")]
    Timeout { addr: String, timeout_ms: u64 },

    #[error("Ledger write failed: {0}")]
    Write(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
