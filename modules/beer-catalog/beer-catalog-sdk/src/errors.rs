//! Beer client error types.
//!
//! Transport-agnostic: the HTTP implementation maps its lower-level failures
//! onto these variants.

use thiserror::Error;

/// Error type for beer catalog operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BeerClientError {
    /// Connection, DNS, TLS or timeout failure, or the transport could not
    /// be built.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The server answered with a status that has no dedicated variant.
    #[error("server error: status {status}: {message}")]
    Server { status: u16, message: String },

    /// No beer with this id.
    #[error("beer not found: {id}")]
    NotFound { id: String },

    /// The server rejected the request (400), or a filter value was unusable.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The response body did not match the expected JSON shape.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// No bearer token could be obtained.
    #[error("authentication failed: {message}")]
    Auth { message: String },
}

impl BeerClientError {
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// HTTP status behind this error, if the server produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}
