//! Axum handlers for inbound sidecar calls.

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::StatusCode,
    response::Response,
};
use futures_util::FutureExt;
use metrics::counter;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::debug;

use crate::dispatcher::DispatchError;
use crate::envelope::Envelope;
use crate::registry::HandlerRegistry;

const CHANNEL_MESSAGES: &str = "dapp_client_channel_messages_total";
const ROUTE_REQUESTS: &str = "dapp_client_route_requests_total";

/// Label used for messages addressed to a channel nobody registered, so
/// arbitrary inbound names never become metric series.
const UNREGISTERED: &str = "unregistered";

fn count_channel_message(channel: &str, outcome: &'static str) {
    counter!(CHANNEL_MESSAGES, "channel" => channel.to_string(), "outcome" => outcome).increment(1);
}

/// POST /channel/{name}
///
/// Unwraps the envelope and hands the payload to the channel handler.
/// Handler errors and panics are contained here and reported as 500.
pub async fn dispatch_channel(
    State(registry): State<Arc<HandlerRegistry>>,
    Path(channel): Path<String>,
    body: Bytes,
) -> Result<StatusCode, DispatchError> {
    let Some(handler) = registry.channel(&channel) else {
        count_channel_message(UNREGISTERED, "unknown");
        return Err(DispatchError::UnknownChannel(channel));
    };

    let envelope = match Envelope::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(source) => {
            count_channel_message(&channel, "malformed");
            return Err(DispatchError::MalformedEnvelope { channel, source });
        }
    };

    debug!(%channel, "dispatching channel message");

    let outcome = AssertUnwindSafe(handler.handle(envelope.into_inner()))
        .catch_unwind()
        .await;

    let reason = match outcome {
        Ok(Ok(())) => {
            count_channel_message(&channel, "ok");
            return Ok(StatusCode::OK);
        }
        Ok(Err(e)) => e.to_string(),
        Err(panic) => format!("handler panicked: {}", panic_message(panic.as_ref())),
    };

    count_channel_message(&channel, "failed");
    Err(DispatchError::HandlerFailed { channel, reason })
}

/// GET|POST|PUT|DELETE /route/{*path}
///
/// Forwards the raw request to the route handler and returns its response
/// untouched. Failures inside the handler are not intercepted.
pub async fn dispatch_route(
    State(registry): State<Arc<HandlerRegistry>>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, DispatchError> {
    let handler = registry
        .route(&path)
        .ok_or_else(|| DispatchError::UnknownRoute(path.clone()))?;

    debug!(route = %path, method = %request.method(), "dispatching route request");
    counter!(ROUTE_REQUESTS, "route" => path).increment(1);

    Ok(handler.handle(request).await)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
