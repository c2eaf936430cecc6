//! HTTP transport primitives shared by the gateway and the alias client.
//!
//! One method per verb, each sending a JSON body with optional headers and
//! returning the complete response. Both consumers go through the same
//! [`HttpTransport`], so they share error type and timeout behaviour.

mod error;
mod response;

pub use error::TransportError;
pub use response::TransportResponse;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Headers attached to every request.
    pub default_headers: HeaderMap,
}

impl TransportConfig {
    /// Creates a config with no timeout and no default headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }
}

/// JSON-over-HTTP client.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a transport from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Build` if the HTTP client cannot be created.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().default_headers(config.default_headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::Build)?;
        Ok(Self { client })
    }

    /// Wraps an existing `reqwest` client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Sends a request with an optional JSON body.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the URL is invalid, the body cannot be
    /// encoded, or the exchange does not complete.
    pub async fn send<B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        headers: &HeaderMap,
    ) -> Result<TransportResponse, TransportError>
    where
        B: Serialize + ?Sized,
    {
        let target = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut request = self
            .client
            .request(method.clone(), target)
            .headers(headers.clone());

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(|source| TransportError::Encode {
                url: url.to_string(),
                source,
            })?;
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(bytes);
        }

        debug!(%method, url, "sending request");

        let res = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;

        let response = TransportResponse::read(url, res).await?;
        debug!(%method, url, status = %response.status, "response received");
        Ok(response)
    }

    /// Sends a GET request carrying a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    pub async fn get<B>(
        &self,
        url: &str,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<TransportResponse, TransportError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::GET, url, Some(body), headers).await
    }

    /// Sends a POST request carrying a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    pub async fn post<B>(
        &self,
        url: &str,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<TransportResponse, TransportError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, url, Some(body), headers).await
    }

    /// Sends a PUT request carrying a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    pub async fn put<B>(
        &self,
        url: &str,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<TransportResponse, TransportError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, url, Some(body), headers).await
    }

    /// Sends a DELETE request carrying a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::send`].
    pub async fn delete<B>(
        &self,
        url: &str,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<TransportResponse, TransportError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::DELETE, url, Some(body), headers).await
    }
}
