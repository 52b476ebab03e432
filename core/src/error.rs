//! Error types for the Airtable client.
//!
//! # Design
//! Two outcomes matter to callers: the service answered with a non-2xx
//! status (`Api`), or it answered 2xx with a body that does not have the
//! shape the operation expects (`BadResponse`). Status codes are not
//! classified further; the raw status and body are handed back as-is.
//! Failures below HTTP (DNS, refused connection, timeout) come from the
//! transport and are carried in `Transport` without reinterpretation.

use thiserror::Error;

/// Error produced by a [`Transport`](crate::http::Transport) that could not
/// obtain any HTTP response.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AirtableError>;

/// Errors returned by `AirtableClient` operations and `TableEndpoint` parsers.
#[derive(Debug, Error)]
pub enum AirtableError {
    /// The service returned a non-2xx status.
    #[error("airtable API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The service returned 2xx but the body did not match the expected shape.
    #[error("bad response from airtable: {0}")]
    BadResponse(String),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AirtableError {
    pub(crate) fn bad_response(msg: impl Into<String>) -> Self {
        AirtableError::BadResponse(msg.into())
    }

    /// HTTP status of an `Api` error, `None` for every other kind.
    pub fn status(&self) -> Option<u16> {
        match self {
            AirtableError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
