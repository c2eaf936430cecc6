//! Alias management client.
//!
//! Talks to the cluster controller's alias API using the same
//! [`HttpTransport`] as the gateway. Every call carries the target scope in a
//! `Scope` header; mutating calls accept a `dry` flag asking the controller to
//! compute the changes without applying them.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transport::{HttpTransport, TransportError, TransportResponse};

const ALIAS_ROUTE: &str = "alias";

/// Header carrying the scope of an alias operation.
pub const SCOPE_HEADER: HeaderName = HeaderName::from_static("scope");

/// Errors raised by alias operations.
#[derive(Debug, thiserror::Error)]
pub enum AliasError {
    /// The HTTP exchange did not complete.
    #[error("Error while sending a {operation} Alias request: {source}")]
    Transport {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },
    /// The controller answered with a non-2xx status.
    #[error("{operation} Alias request rejected with HTTP {status}: {body}")]
    Status {
        /// Operation that failed.
        operation: &'static str,
        /// Returned status.
        status: StatusCode,
        /// Returned body.
        body: String,
    },
    /// The response body could not be decoded.
    #[error("Failed to decode {operation} Alias response: {source}")]
    Decode {
        /// Operation that failed.
        operation: &'static str,
        /// Decoding error.
        #[source]
        source: serde_json::Error,
    },
    /// The scope is not a valid header value.
    #[error("Invalid scope '{0}'")]
    InvalidScope(String),
}

/// Descriptive metadata of an alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Alias name.
    #[serde(default)]
    pub name: String,
    /// Scope of the app owning the alias.
    #[serde(default)]
    pub parent: String,
    /// Controller-assigned identifier.
    #[serde(default)]
    pub uuid: String,
    /// Free-form annotations.
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub annotations: std::collections::BTreeMap<String, String>,
}

/// An alias mapping a boundary name onto a channel in another scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Alias metadata.
    #[serde(default)]
    pub meta: Metadata,
    /// Name of the channel the alias resolves to.
    #[serde(default)]
    pub resource: String,
}

/// A single field-level difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    /// Changed field.
    pub field: String,
    /// Previous value.
    pub from: String,
    /// New value.
    pub to: String,
}

/// All differences within one context of the app tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Scope the differences apply to.
    pub context: String,
    /// Field-level differences.
    #[serde(default)]
    pub diff: Vec<Difference>,
}

/// Changes produced by a mutating alias operation.
pub type Changelog = Vec<Change>;

#[derive(Serialize)]
struct KeyQuery<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct KeyDelete<'a> {
    key: &'a str,
    dry: bool,
}

#[derive(Serialize)]
struct AliasBody<'a> {
    alias: &'a Alias,
    target: &'a str,
    dry: bool,
}

/// Client for the controller's alias API.
#[derive(Debug, Clone)]
pub struct AliasClient {
    base_url: String,
    transport: HttpTransport,
}

impl AliasClient {
    /// Creates a client for the controller at `base_url`.
    pub fn new(base_url: impl Into<String>, transport: HttpTransport) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    fn url(&self) -> String {
        format!("{}/{ALIAS_ROUTE}", self.base_url.trim_end_matches('/'))
    }

    fn scope_headers(scope: &str) -> Result<HeaderMap, AliasError> {
        let value =
            HeaderValue::from_str(scope).map_err(|_| AliasError::InvalidScope(scope.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(SCOPE_HEADER, value);
        Ok(headers)
    }

    fn decode<T: DeserializeOwned>(
        operation: &'static str,
        res: &TransportResponse,
    ) -> Result<T, AliasError> {
        if !res.is_success() {
            return Err(AliasError::Status {
                operation,
                status: res.status,
                body: res.text().into_owned(),
            });
        }
        res.json()
            .map_err(|source| AliasError::Decode { operation, source })
    }

    /// Fetches the alias stored under `key` in `scope`.
    ///
    /// # Errors
    ///
    /// Returns an `AliasError` if the request fails or the answer is not an
    /// alias.
    pub async fn get(&self, scope: &str, key: &str) -> Result<Alias, AliasError> {
        const OP: &str = "Get";
        let headers = Self::scope_headers(scope)?;
        debug!(scope, key, "getting alias");

        let res = self
            .transport
            .get(&self.url(), &KeyQuery { key }, &headers)
            .await
            .map_err(|source| AliasError::Transport {
                operation: OP,
                source,
            })?;

        Self::decode(OP, &res)
    }

    /// Creates `alias` in `scope`, pointing at `target`.
    ///
    /// # Errors
    ///
    /// Returns an `AliasError` if the request fails or is rejected.
    pub async fn create(
        &self,
        scope: &str,
        target: &str,
        alias: &Alias,
        dry_run: bool,
    ) -> Result<Changelog, AliasError> {
        const OP: &str = "Create";
        let headers = Self::scope_headers(scope)?;
        debug!(scope, target, dry_run, "creating alias");

        let body = AliasBody {
            alias,
            target,
            dry: dry_run,
        };
        let res = self
            .transport
            .post(&self.url(), &body, &headers)
            .await
            .map_err(|source| AliasError::Transport {
                operation: OP,
                source,
            })?;

        Self::decode(OP, &res)
    }

    /// Replaces `alias` in `scope`, pointing at `target`.
    ///
    /// # Errors
    ///
    /// Returns an `AliasError` if the request fails or is rejected.
    pub async fn update(
        &self,
        scope: &str,
        target: &str,
        alias: &Alias,
        dry_run: bool,
    ) -> Result<Changelog, AliasError> {
        const OP: &str = "Update";
        let headers = Self::scope_headers(scope)?;
        debug!(scope, target, dry_run, "updating alias");

        let body = AliasBody {
            alias,
            target,
            dry: dry_run,
        };
        let res = self
            .transport
            .put(&self.url(), &body, &headers)
            .await
            .map_err(|source| AliasError::Transport {
                operation: OP,
                source,
            })?;

        Self::decode(OP, &res)
    }

    /// Deletes the alias stored under `key` in `scope`.
    ///
    /// # Errors
    ///
    /// Returns an `AliasError` if the request fails or is rejected.
    pub async fn delete(
        &self,
        scope: &str,
        key: &str,
        dry_run: bool,
    ) -> Result<Changelog, AliasError> {
        const OP: &str = "Delete";
        let headers = Self::scope_headers(scope)?;
        debug!(scope, key, dry_run, "deleting alias");

        let res = self
            .transport
            .delete(&self.url(), &KeyDelete { key, dry: dry_run }, &headers)
            .await
            .map_err(|source| AliasError::Transport {
                operation: OP,
                source,
            })?;

        Self::decode(OP, &res)
    }
}
