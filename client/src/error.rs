//! Error types for the todo store client.
//!
//! # Design
//! `NotFound` and `Validation` get dedicated variants because the session
//! treats them differently from faults: a 404 on delete means the work is
//! already done, and a 422 carries a message worth showing. `Transport`
//! covers everything that never produced a response, timeouts included.

use serde::Deserialize;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The store returned 404.
    #[error("resource not found")]
    NotFound,

    /// The store rejected the input (422).
    #[error("validation failed: {0}")]
    Validation(String),

    /// No response: connection refused, reset, or timed out.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Any other non-2xx status.
    #[error("HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Build a `Validation` error from a 422 body, falling back to the raw
    /// body when it is not `{"detail": "..."}`.
    pub(crate) fn validation(body: &str) -> Self {
        #[derive(Deserialize)]
        struct Detail {
            detail: serde_json::Value,
        }
        let message = match serde_json::from_str::<Detail>(body) {
            Ok(Detail {
                detail: serde_json::Value::String(s),
            }) => s,
            Ok(Detail { detail }) => detail.to_string(),
            Err(_) => body.to_string(),
        };
        ApiError::Validation(message)
    }
}
