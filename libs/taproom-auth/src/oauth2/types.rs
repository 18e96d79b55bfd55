use serde::Deserialize;

use super::error::TokenError;

/// How the client proves its identity to the token endpoint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientAuthMethod {
    /// `Authorization: Basic` with `client_id:client_secret` (RFC 6749 §2.3.1).
    #[default]
    Basic,
    /// `client_id` and `client_secret` in the form body.
    Form,
}

/// Body of a successful token endpoint response. Extra fields are ignored.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    /// Check the response carries a usable bearer token and return it with
    /// its lifetime in seconds, `fallback_ttl_secs` when `expires_in` is absent.
    pub(crate) fn into_bearer(self, fallback_ttl_secs: u64) -> Result<(String, u64), TokenError> {
        if self.access_token.is_empty() {
            return Err(TokenError::InvalidResponse("empty access_token".into()));
        }
        match self.token_type {
            Some(kind) if !kind.eq_ignore_ascii_case("bearer") => {
                Err(TokenError::UnsupportedTokenType(kind))
            }
            _ => Ok((
                self.access_token,
                self.expires_in.unwrap_or(fallback_ttl_secs),
            )),
        }
    }
}
