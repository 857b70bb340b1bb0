//! Registry error types.

use thiserror::Error;
use trig_core::TriggerKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("No pending trigger for {0}")]
    NotPending(TriggerKey),

    #[error("No pending or active trigger for {0}")]
    NotFound(TriggerKey),

    #[error("No active trigger for {0}")]
    NotActive(TriggerKey),
}

impl RegistryError {
    /// Every variant is a "key not found" from the caller's point of view.
    pub fn key(&self) -> &TriggerKey {
        match self {
            Self::NotPending(k) | Self::NotFound(k) | Self::NotActive(k) => k,
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
