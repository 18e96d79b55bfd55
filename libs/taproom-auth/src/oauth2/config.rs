use std::fmt;
use std::time::Duration;
use url::Url;

use super::error::TokenError;
use super::types::ClientAuthMethod;
use taproom_utils::SecretString;

/// When a cached token is considered stale and how refresh failures back off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Refresh this long before the token expires.
    pub lead: Duration,
    /// Upper bound of the random amount subtracted from each refresh point.
    pub jitter: Duration,
    /// Shortest gap between two refresh attempts. Error backoff starts here.
    pub min_period: Duration,
    /// Lifetime assumed when the endpoint omits `expires_in`.
    pub fallback_ttl: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            lead: Duration::from_secs(30 * 60),
            jitter: Duration::from_secs(5 * 60),
            min_period: Duration::from_secs(10),
            fallback_ttl: Duration::from_secs(5 * 60),
        }
    }
}

/// Where the stale point of a token with a given lifetime sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RefreshSchedule {
    /// Fraction of the lifetime during which the token counts as fresh.
    pub freshness: f64,
    pub min_stale_secs: u64,
}

impl RefreshPolicy {
    /// Place the stale point for a token living `lifetime_secs`.
    ///
    /// Never later than expiry. A lead longer than the lifetime falls back
    /// to half the lifetime, and a zero lifetime is stale at once.
    #[allow(clippy::integer_division, clippy::cast_precision_loss)]
    pub(crate) fn schedule(&self, lifetime_secs: u64) -> RefreshSchedule {
        if lifetime_secs == 0 {
            return RefreshSchedule {
                freshness: 0.0,
                min_stale_secs: 0,
            };
        }

        let lead = self.lead.as_secs();
        let fresh_for = if lead < lifetime_secs {
            lifetime_secs - lead
        } else {
            lifetime_secs / 2
        };

        RefreshSchedule {
            freshness: fresh_for as f64 / lifetime_secs as f64,
            min_stale_secs: self.min_period.as_secs().min(fresh_for),
        }
    }
}

/// One client registration for the `OAuth2` client credentials grant.
///
/// `Debug` redacts the client secret.
#[derive(Clone, Default)]
pub struct OAuthClientConfig {
    /// Required. [`validate`](Self::validate) rejects `None`.
    pub token_endpoint: Option<Url>,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Sent space-separated as the `scope` form field, omitted when empty.
    pub scopes: Vec<String>,
    pub auth_method: ClientAuthMethod,
    pub refresh: RefreshPolicy,
    /// HTTP settings for token requests. `None` means
    /// [`HttpClientConfig::token_endpoint()`](taproom_http::HttpClientConfig::token_endpoint).
    pub http_config: Option<taproom_http::HttpClientConfig>,
}

impl OAuthClientConfig {
    #[must_use]
    pub fn new(
        token_endpoint: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
    ) -> Self {
        Self {
            token_endpoint: Some(token_endpoint),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_auth_method(mut self, auth_method: ClientAuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    #[must_use]
    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    #[must_use]
    pub fn with_http_config(mut self, http_config: taproom_http::HttpClientConfig) -> Self {
        self.http_config = Some(http_config);
        self
    }

    /// # Errors
    ///
    /// Returns [`TokenError::ConfigError`] naming the first missing piece:
    /// client id, client secret or token endpoint.
    pub fn validate(&self) -> Result<(), TokenError> {
        let missing = if self.client_id.trim().is_empty() {
            "client_id must not be empty"
        } else if self.client_secret.is_empty() {
            "client_secret must not be empty"
        } else if self.token_endpoint.is_none() {
            "token_endpoint must be set"
        } else {
            return Ok(());
        };
        Err(TokenError::ConfigError(missing.to_owned()))
    }
}

impl fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("token_endpoint", &self.token_endpoint.as_ref().map(Url::as_str))
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("auth_method", &self.auth_method)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}
