//! Beer client configuration.

use std::time::Duration;

use serde::Deserialize;
use taproom_auth::{ClientAuthMethod, OAuthClientConfig, TokenError};
use taproom_http::{HttpClientConfig, TransportSecurity};
use taproom_utils::SecretString;
use url::Url;

pub const DEFAULT_REGISTRATION_ID: &str = "beer-catalog";

/// Everything needed to reach the catalog API.
///
/// ```yaml
/// root_url: "http://localhost:8080/api/v1/"
/// registration_id: springauth
/// request_timeout: 10s
/// allow_insecure_http: true
/// oauth:
///   token_endpoint: "http://localhost:9000/oauth2/token"
///   client_id: messaging-client
///   client_secret: secret
///   scopes: [message.read, message.write]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeerClientConfig {
    /// Prefix for every request path. A trailing `/` is added if missing.
    pub root_url: Url,

    /// Client registration the bearer token is requested for.
    #[serde(default = "default_registration_id")]
    pub registration_id: String,

    #[serde(
        default = "default_request_timeout",
        with = "taproom_utils::humantime_duration"
    )]
    pub request_timeout: Duration,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Permit plain `http://` for the API and the token endpoint.
    #[serde(default)]
    pub allow_insecure_http: bool,

    #[serde(default)]
    pub oauth: Option<OAuthSection>,
}

/// Client-credentials registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OAuthSection {
    pub token_endpoint: Url,
    pub client_id: String,
    pub client_secret: SecretString,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub auth_method: ClientAuthMethod,
}

fn default_registration_id() -> String {
    DEFAULT_REGISTRATION_ID.to_owned()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl BeerClientConfig {
    /// Defaults for everything but the root URL; no OAuth section.
    #[must_use]
    pub fn new(root_url: Url) -> Self {
        Self {
            root_url,
            registration_id: default_registration_id(),
            request_timeout: default_request_timeout(),
            user_agent: None,
            allow_insecure_http: false,
            oauth: None,
        }
    }

    #[must_use]
    pub fn transport_security(&self) -> TransportSecurity {
        if self.allow_insecure_http {
            TransportSecurity::AllowInsecureHttp
        } else {
            TransportSecurity::TlsOnly
        }
    }

    /// Token-source settings for the `oauth` section.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ConfigError`] if there is no `oauth` section or
    /// it fails [`OAuthClientConfig::validate`].
    pub fn oauth_config(&self) -> Result<OAuthClientConfig, TokenError> {
        let section = self
            .oauth
            .as_ref()
            .ok_or_else(|| TokenError::ConfigError("oauth section is missing".into()))?;

        let http_config = HttpClientConfig {
            transport: self.transport_security(),
            ..HttpClientConfig::token_endpoint()
        };

        let config = OAuthClientConfig::new(
            section.token_endpoint.clone(),
            section.client_id.clone(),
            section.client_secret.clone(),
        )
        .with_scopes(section.scopes.iter().cloned())
        .with_auth_method(section.auth_method)
        .with_http_config(http_config);
        config.validate()?;
        Ok(config)
    }
}
