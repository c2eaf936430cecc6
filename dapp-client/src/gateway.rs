//! Outbound gateway.
//!
//! Translates "publish to a channel" and "call a route on another node" into
//! HTTP requests against the sidecar's write address. Both operations wait
//! for the sidecar's answer before returning.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::envelope::Envelope;
use crate::transport::{HttpTransport, TransportError, TransportResponse};
use crate::types::{ChannelName, NodeName, ValidationError};

/// Why a delivery to the sidecar failed.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryFailure {
    /// The HTTP exchange did not complete.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The channel or node name cannot be addressed; nothing was sent.
    #[error(transparent)]
    InvalidTarget(#[from] ValidationError),
    /// The sidecar answered with a non-2xx status.
    #[error("sidecar responded with HTTP {status}: {body}")]
    Status {
        /// Status returned by the sidecar.
        status: StatusCode,
        /// Response body, for diagnosis.
        body: String,
    },
}

/// Errors surfaced to node code by outbound calls.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Publishing on a channel failed.
    #[error("failed to deliver message: channel: {channel}")]
    Publish {
        /// Target channel.
        channel: String,
        /// Underlying failure.
        #[source]
        source: DeliveryFailure,
    },
    /// Calling a route failed.
    #[error("failed to deliver message: route: {url}")]
    Call {
        /// Constructed target URL.
        url: String,
        /// Underlying failure.
        #[source]
        source: DeliveryFailure,
    },
}

impl GatewayError {
    /// The underlying delivery failure.
    #[must_use]
    pub fn failure(&self) -> &DeliveryFailure {
        match self {
            Self::Publish { source, .. } | Self::Call { source, .. } => source,
        }
    }
}

/// Sends messages and requests out through the sidecar.
#[derive(Debug, Clone)]
pub struct Gateway {
    write_address: Url,
    transport: HttpTransport,
}

impl Gateway {
    /// Creates a gateway for the given sidecar write address.
    #[must_use]
    pub fn new(write_address: Url, transport: HttpTransport) -> Self {
        Self {
            write_address,
            transport,
        }
    }

    /// The sidecar write address.
    #[must_use]
    pub fn write_address(&self) -> &Url {
        &self.write_address
    }

    /// Appends `segments` to the write address, percent-encoding each one so
    /// reserved characters stay inside their segment.
    fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<String, TransportError> {
        let mut url = self.write_address.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::InvalidUrl {
                url: self.write_address.to_string(),
                reason: "write address cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    /// Publishes a payload on a channel.
    ///
    /// The payload is wrapped as `{"data": payload}` and posted to
    /// `<write address>/channel/<channel>`, with the channel name
    /// percent-encoded as a single path segment. Any failure, including
    /// a non-2xx answer from the sidecar, is reported with the channel name.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Publish` if the message was not accepted.
    pub async fn publish<T>(&self, channel: &str, payload: &T) -> Result<(), GatewayError>
    where
        T: Serialize + ?Sized,
    {
        let fail = |source: DeliveryFailure| {
            error!(%channel, error = %source, "failed to publish message");
            GatewayError::Publish {
                channel: channel.to_string(),
                source,
            }
        };

        let target = ChannelName::new(channel).map_err(|e| fail(e.into()))?;
        let url = self
            .endpoint(["channel", target.as_str()])
            .map_err(|e| fail(e.into()))?;
        debug!(channel = %target, %url, "sending message to sidecar");

        let res = self
            .transport
            .post(&url, &Envelope::wrap(payload), &HeaderMap::new())
            .await
            .map_err(|e| fail(e.into()))?;

        if !res.is_success() {
            return Err(fail(DeliveryFailure::Status {
                status: res.status,
                body: res.text().into_owned(),
            }));
        }

        debug!(%channel, "message sent");
        Ok(())
    }

    /// Calls a route on another node and returns its response verbatim.
    ///
    /// The request goes to `<write address>/route/<node>/<path>`. A leading
    /// `/` on `path` is dropped and each segment is percent-encoded. Non-2xx
    /// statuses are returned, not raised.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Call` if the exchange with the sidecar fails.
    pub async fn call(
        &self,
        node: &str,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<TransportResponse, GatewayError> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let refuse = |url: String, source: DeliveryFailure| {
            error!(%url, error = %source, "refusing to send request");
            GatewayError::Call { url, source }
        };

        let node = NodeName::new(node).map_err(|e| {
            refuse(
                format!("{}route/{node}/{path}", self.write_address),
                e.into(),
            )
        })?;
        let url = self
            .endpoint(["route", node.as_str()].into_iter().chain(path.split('/')))
            .map_err(|e| refuse(self.write_address.to_string(), e.into()))?;

        debug!(%node, %method, %url, "sending request to sidecar");

        self.transport
            .send(method, &url, body, &HeaderMap::new())
            .await
            .map_err(|e| {
                error!(%url, error = %e, "failed to send request");
                GatewayError::Call {
                    url,
                    source: e.into(),
                }
            })
    }
}
