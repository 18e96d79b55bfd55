use thiserror::Error;

/// Errors from obtaining an outbound bearer token.
///
/// No variant ever carries a client secret or access token.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// HTTP transport or status error during token acquisition.
    ///
    /// Produced by [`format_http_error`](crate::http_error::format_http_error),
    /// which leaves out response bodies.
    #[error("{0}")]
    Http(String),

    /// The token endpoint returned an unparseable or incomplete response.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// The token endpoint returned a `token_type` that is not `Bearer`.
    #[error("unsupported token type: {0}")]
    UnsupportedTokenType(String),

    #[error("OAuth2 config error: {0}")]
    ConfigError(String),

    /// The token watcher is not ready or has been shut down.
    #[error("token unavailable: {0}")]
    Unavailable(String),

    /// No client registration with this id is known to the provider.
    #[error("unknown client registration '{0}'")]
    UnknownRegistration(String),
}
