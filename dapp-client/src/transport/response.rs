//! Response type returned by the transport primitives.

use axum::response::IntoResponse;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONNECTION, CONTENT_LENGTH, HeaderMap, TRANSFER_ENCODING};
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// A fully received HTTP response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Bytes,
}

impl TransportResponse {
    pub(crate) async fn read(
        url: &str,
        res: reqwest::Response,
    ) -> Result<Self, super::TransportError> {
        let status = res.status();
        let headers = res.headers().clone();
        let body = res
            .bytes()
            .await
            .map_err(|e| super::TransportError::from_reqwest(url, e))?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Body decoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

impl IntoResponse for TransportResponse {
    fn into_response(self) -> axum::response::Response {
        let mut headers = self.headers;
        // Framing headers belong to the upstream connection.
        for name in [CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING] {
            headers.remove(name);
        }
        (self.status, headers, self.body).into_response()
    }
}
