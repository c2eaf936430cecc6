//! Error types for transport operations.

/// Errors raised when an HTTP exchange cannot be completed.
///
/// A response with a non-2xx status is *not* a transport error; callers
/// decide how to treat the status.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    /// The target URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why parsing failed.
        reason: String,
    },
    /// The request did not complete within the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout {
        /// Target URL.
        url: String,
    },
    /// Connection failure or malformed response.
    #[error("Request to {url} failed: {source}")]
    Request {
        /// Target URL.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The request body could not be encoded as JSON.
    #[error("Failed to encode request body for {url}: {source}")]
    Encode {
        /// Target URL.
        url: String,
        /// The underlying encoding error.
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Returns `true` if the request timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
