//! Error types for the content API client.
//!
//! # Design
//! Transport failures (no response at all) and HTTP error responses are
//! distinct variants so callers can tell "the server said no" from "the
//! server was never reached." `NotFound` gets its own variant because a
//! missing record is the one HTTP error callers routinely branch on.
//!
//! Responses that parse as JSON but lack the expected shape (no `data`, no
//! identifier) are not errors at all: operations degrade to `Ok(None)` or
//! skip the item.

use serde_json::Value;
use thiserror::Error;

use crate::http::TransportError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by the client, collections and records.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server returned 404, or a single-record lookup returned no data.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status} {name}: {message}")]
    Http {
        status: u16,
        name: String,
        message: String,
        details: Option<Value>,
    },

    /// The response body was not JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Collection discovery failed while connecting.
    #[error("collection discovery failed: {0}")]
    Discovery(String),

    /// No accessor is configured under this collection name.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// The record outlived the collection that produced it.
    #[error("record is detached from its collection")]
    Detached,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Transport(err.0)
    }
}
