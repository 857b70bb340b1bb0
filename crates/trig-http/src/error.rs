//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error};

use trig_engine::EngineError;
use trig_registry::RegistryError;

#[derive(Debug, Error)]
pub enum HttpError {
    /// Malformed request parameter. Nothing was mutated.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    NotFound(#[from] RegistryError),

    #[error("Trigger server is shutting down")]
    ShuttingDown,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub type HttpResult<T> = Result<T, HttpError>;

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) | Self::Bind { .. } | Self::Serve(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<EngineError> for HttpError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Registry(e) => Self::NotFound(e),
            EngineError::ShuttingDown => Self::ShuttingDown,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trig_core::{Action, TriggerKey};

    #[test]
    fn test_status_mapping() {
        let key = TriggerKey::new(Action::Buy, "ABC", "alice");
        assert_eq!(
            HttpError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HttpError::from(EngineError::Registry(RegistryError::NotPending(key))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::from(EngineError::ShuttingDown).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
