//! Error types for request framing and parsing failures.
//!
//! Failures here happen before a request reaches a method, so each one is
//! answered with an `INVALID_PARAMETER_FORMAT_OR_VALUE` envelope where
//! possible.

use std::io;

use thiserror::Error;

use wobridge::{ErrorEnvelope, ProxyError, RequestId};

/// Errors surfaced while reading, parsing, or answering a request line.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request line could not be parsed as JSON.
    #[error("malformed JSON: {message}")]
    MalformedJson {
        /// Parser message.
        message: String,
        /// Parser error, when one exists.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Request JSON is not a JSON-RPC request object.
    #[error("invalid request structure: {message}")]
    InvalidStructure {
        /// Identifier recovered from the request, or null.
        id: RequestId,
        /// What was wrong.
        message: String,
    },

    /// Request exceeds the maximum allowed size.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge {
        /// Bytes read before giving up.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Response serialisation failed.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[source] serde_json::Error),
}

impl DispatchError {
    /// Creates a malformed JSON error from a serde error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedJson {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed JSON error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedJson {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an invalid structure error for the request identified by `id`.
    #[must_use]
    pub fn invalid_structure(id: RequestId, message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            id,
            message: message.into(),
        }
    }

    /// Creates a request size error.
    #[must_use]
    pub const fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }

    /// Builds the error envelope sent back to the client.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            Self::MalformedJson { message, .. } => {
                ProxyError::invalid_parameter(None, message.clone()).to_envelope(RequestId::null())
            }
            Self::InvalidStructure { id, message } => {
                ProxyError::invalid_parameter(None, message.clone()).to_envelope(id.clone())
            }
            Self::RequestTooLarge { .. } => ProxyError::invalid_parameter(None, self.to_string())
                .to_envelope(RequestId::null()),
            Self::Io(_) | Self::SerializeResponse(_) => {
                ProxyError::unknown(self.to_string()).to_envelope(RequestId::null())
            }
        }
    }
}
