//! Webhook relay for gitrelay
//!
//! This crate wires the pure core to the outside world:
//! - Inbound: the axum router receiving GitHub and GitLab webhooks
//! - Outbound: the chat client delivering rendered messages to Telegram
//!
//! # Example
//!
//! ```rust,ignore
//! use gitrelay_core::TelegramConfig;
//! use gitrelay_webhook::{create_relay_router, RelayState, TelegramClient};
//! use std::sync::Arc;
//!
//! let client = TelegramClient::new(&TelegramConfig::new(token))?;
//! let state = Arc::new(RelayState::new(Arc::new(client)));
//! let router = create_relay_router(state);
//! ```

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gitrelay_core::{NormalizeError, Rejection};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Relay errors, each mapped onto an HTTP status
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("{}", .0.detail())]
    Rejected(Rejection),

    #[error("Could not find destination {0}")]
    DestinationNotFound(String),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Delivery failed: {0}")]
    Delivery(DeliveryError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(_)
            | Self::DestinationNotFound(_)
            | Self::InvalidQuery(_)
            | Self::InvalidPayload(_)
            | Self::Normalize(NormalizeError::MalformedPayload { .. }) => StatusCode::BAD_REQUEST,
            // Routing never hands a provider a kind it cannot normalize
            Self::Normalize(NormalizeError::Unsupported { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Delivery(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<Rejection> for RelayError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<DeliveryError> for RelayError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::DestinationNotFound(destination) => {
                Self::DestinationNotFound(destination)
            }
            other => Self::Delivery(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Relay failed");
        }

        (status, Json(ErrorResponse { detail: self.to_string() })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use gitrelay_core::Provider;

    #[test]
    fn test_rejection_detail() {
        let err = RelayError::from(Rejection::UnknownService);
        assert_eq!(err.to_string(), "Unknown git service");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = RelayError::from(Rejection::UnknownEvent {
            provider: Provider::GitLab,
            event: "Issue Hook".to_string(),
        });
        assert_eq!(err.to_string(), "Unknown event");
    }

    #[test]
    fn test_delivery_error_mapping() {
        let err = RelayError::from(DeliveryError::DestinationNotFound("42".to_string()));
        assert!(matches!(err, RelayError::DestinationNotFound(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = RelayError::from(DeliveryError::Transport("timeout".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_malformed_payload_is_client_error() {
        let err = RelayError::from(NormalizeError::MalformedPayload {
            path: "commits[0].id".to_string(),
            message: "missing field `id`".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("commits[0].id"));
    }
}
