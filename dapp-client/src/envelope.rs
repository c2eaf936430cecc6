//! Wire wrapper for channel messages.
//!
//! Every message travelling over a channel is wrapped as `{"data": <payload>}`.
//! The gateway wraps before sending and the dispatcher unwraps before calling
//! a channel handler.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope carrying a channel payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The wrapped payload.
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wraps a payload.
    pub fn wrap(data: T) -> Self {
        Self { data }
    }

    /// Unwraps the payload.
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl Envelope<Value> {
    /// Parses a raw request body into an envelope.
    ///
    /// An explicit `"data": null` counts as present.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not JSON or lacks the `data` field.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}
