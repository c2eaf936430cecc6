//! Dispatch errors and their HTTP mapping.

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

/// Errors raised while dispatching an inbound sidecar call.
///
/// The response sent back to the sidecar only carries a generic message;
/// the underlying cause is logged.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No handler is registered for the channel.
    #[error("Channel not found: {0}")]
    UnknownChannel(String),
    /// No handler is registered for the route.
    #[error("Route not found: {0}")]
    UnknownRoute(String),
    /// The body is not JSON or lacks the `data` field.
    #[error("Malformed envelope on channel {channel}: {source}")]
    MalformedEnvelope {
        /// Channel the message was addressed to.
        channel: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// The channel handler returned an error or panicked.
    #[error("Handler for channel {channel} failed: {reason}")]
    HandlerFailed {
        /// Channel whose handler failed.
        channel: String,
        /// Failure description, for logs only.
        reason: String,
    },
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            DispatchError::UnknownChannel(_) | DispatchError::UnknownRoute(_) => {
                warn!(error = %self, "no handler registered");
                (StatusCode::NOT_FOUND, "No handler registered")
            }
            DispatchError::MalformedEnvelope { .. } => {
                warn!(error = %self, "rejecting message");
                (StatusCode::BAD_REQUEST, "Malformed message")
            }
            DispatchError::HandlerFailed { .. } => {
                error!(error = %self, "channel handler failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error handling message")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                DispatchError::UnknownChannel("orders".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                DispatchError::UnknownRoute("status".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                DispatchError::MalformedEnvelope {
                    channel: "orders".into(),
                    source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                DispatchError::HandlerFailed {
                    channel: "orders".into(),
                    reason: "db down".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_cause_is_not_leaked() {
        let res = DispatchError::HandlerFailed {
            channel: "orders".into(),
            reason: "password=hunter2".into(),
        }
        .into_response();

        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Error handling message"));
        assert!(!text.contains("hunter2"));
    }
}
