//! Error types for the BurstChain client.
//!
//! # Design
//! The service contract only knows one failure: "the call did not return
//! 200". `Status` carries the path, status code and raw body for that case.
//! The remaining variants cover the round-trip failing outright and the
//! client not being able to make sense of what it sent or received. None
//! of them are retried; the caller decides whether to stop.

use thiserror::Error;

use crate::http::TransportError;

/// Errors returned by `RestClient` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with something other than 200.
    #[error("call for {path} failed with code {status} and response of {body}")]
    Status { path: String, status: u16, body: String },

    /// No response was received (DNS, refused connection, TLS, ...).
    #[error("call for {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: TransportError,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A non-empty 200 body was not valid JSON.
    #[error("response for {path} is not valid JSON: {source}")]
    Deserialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response did not carry the field the operation extracts.
    #[error("response for {path} has no usable `{field}` field")]
    MissingField { path: String, field: &'static str },
}

impl ApiError {
    /// HTTP status of a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
