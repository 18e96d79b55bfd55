use aliri_clock::DurationSecs;
use aliri_tokens::sources::AsyncTokenSource;
use aliri_tokens::{AccessToken, IdToken, TokenLifetimeConfig, TokenWithLifetime};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use http::header::AUTHORIZATION;
use taproom_http::HttpError;
use url::Url;
use zeroize::Zeroizing;

use super::config::{OAuthClientConfig, RefreshPolicy};
use super::error::TokenError;
use super::types::{ClientAuthMethod, TokenResponse};
use crate::http_error::format_http_error;
use taproom_utils::SecretString;

const ERROR_PREFIX: &str = "OAuth2 token";

/// Exchanges client credentials for an access token over `taproom_http`.
///
/// Implements [`AsyncTokenSource`] so `aliri_tokens` drives refresh
/// scheduling, jitter and backoff.
pub struct OAuthTokenSource {
    client: taproom_http::HttpClient,
    token_endpoint: Url,
    client_id: String,
    client_secret: SecretString,
    /// Space-joined scopes, `None` when no scopes are configured.
    scopes: Option<String>,
    auth_method: ClientAuthMethod,
    refresh: RefreshPolicy,
}

impl OAuthTokenSource {
    /// # Errors
    ///
    /// Returns [`TokenError::ConfigError`] if `token_endpoint` is `None`, or
    /// [`TokenError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &OAuthClientConfig) -> Result<Self, TokenError> {
        let token_endpoint = config
            .token_endpoint
            .clone()
            .ok_or_else(|| TokenError::ConfigError("token_endpoint is required".into()))?;

        let http_config = config
            .http_config
            .clone()
            .unwrap_or_else(taproom_http::HttpClientConfig::token_endpoint);

        let client = taproom_http::HttpClientBuilder::with_config(http_config)
            .build()
            .map_err(http_err)?;

        let scopes = (!config.scopes.is_empty()).then(|| config.scopes.join(" "));

        Ok(Self {
            client,
            token_endpoint,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scopes,
            auth_method: config.auth_method,
            refresh: config.refresh,
        })
    }
}

fn http_err(e: HttpError) -> TokenError {
    TokenError::Http(format_http_error(&e, ERROR_PREFIX))
}

#[async_trait]
impl AsyncTokenSource for OAuthTokenSource {
    type Error = TokenError;

    async fn request_token(&mut self) -> Result<TokenWithLifetime, Self::Error> {
        // Scrubbed on drop
        let form_secret = (self.auth_method == ClientAuthMethod::Form)
            .then(|| Zeroizing::new(self.client_secret.expose().to_owned()));

        let mut fields: Vec<(&str, &str)> = vec![("grant_type", "client_credentials")];
        if let Some(ref scope) = self.scopes {
            fields.push(("scope", scope.as_str()));
        }
        if let Some(ref secret) = form_secret {
            fields.push(("client_id", self.client_id.as_str()));
            fields.push(("client_secret", secret.as_str()));
        }

        let mut builder = self.client.post(self.token_endpoint.as_str());

        if self.auth_method == ClientAuthMethod::Basic {
            let credentials = Zeroizing::new(format!(
                "{}:{}",
                self.client_id,
                self.client_secret.expose()
            ));
            let encoded = Zeroizing::new(general_purpose::STANDARD.encode(credentials.as_bytes()));
            let header_value = Zeroizing::new(format!("Basic {}", &*encoded));
            builder = builder.header(AUTHORIZATION.as_str(), header_value.as_str());
        }

        let response = builder
            .form(fields.as_slice())
            .map_err(http_err)?
            .send()
            .await
            .map_err(http_err)?;

        let token_resp: TokenResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(HttpError::Json(e)) => return Err(TokenError::InvalidResponse(e.to_string())),
            Err(e) => return Err(http_err(e)),
        };

        let (secret, lifetime_secs) =
            token_resp.into_bearer(self.refresh.fallback_ttl.as_secs())?;
        let schedule = self.refresh.schedule(lifetime_secs);
        let lifetime_config =
            TokenLifetimeConfig::new(schedule.freshness, DurationSecs(schedule.min_stale_secs));

        let access_token = AccessToken::new(secret);
        tracing::debug!(
            endpoint = %self.token_endpoint,
            lifetime_secs,
            "obtained OAuth2 access token"
        );
        Ok(lifetime_config.create_token(
            &access_token,
            None::<&IdToken>,
            DurationSecs(lifetime_secs),
        ))
    }
}
