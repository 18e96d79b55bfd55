use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use taproom_utils::SecretString;

use super::config::OAuthClientConfig;
use super::error::TokenError;
use super::token::Token;

/// A bearer secret plus the instant it stops being valid, if known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    secret: SecretString,
    expires_at: Option<SystemTime>,
}

impl AccessToken {
    #[must_use]
    pub fn new(secret: impl Into<SecretString>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Tokens without a known expiry never report as expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= SystemTime::now())
    }
}

/// Source of bearer tokens for outbound requests.
///
/// Implementations own caching and refresh; callers ask on every request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Token for the client registration named `registration_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] if no usable token can be produced.
    async fn authorize(&self, registration_id: &str) -> Result<AccessToken, TokenError>;
}

/// Hands out the same token for every registration.
#[derive(Clone, Debug)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    #[must_use]
    pub fn new(secret: impl Into<SecretString>) -> Self {
        Self {
            token: AccessToken::new(secret),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn authorize(&self, _registration_id: &str) -> Result<AccessToken, TokenError> {
        Ok(self.token.clone())
    }
}

/// Routes `authorize` to the provider registered under that id.
#[derive(Clone, Default)]
pub struct TokenRegistry {
    providers: HashMap<String, Arc<dyn TokenProvider>>,
}

impl fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("TokenRegistry")
            .field("registrations", &ids)
            .finish()
    }
}

impl TokenRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `registration_id`, replacing any previous one.
    pub fn register(
        &mut self,
        registration_id: impl Into<String>,
        provider: Arc<dyn TokenProvider>,
    ) {
        self.providers.insert(registration_id.into(), provider);
    }

    #[must_use]
    pub fn with(
        mut self,
        registration_id: impl Into<String>,
        provider: Arc<dyn TokenProvider>,
    ) -> Self {
        self.register(registration_id, provider);
        self
    }

    /// Start a [`Token`] for every `(registration_id, config)` pair.
    ///
    /// # Errors
    ///
    /// Fails on the first registration whose config is invalid or whose
    /// initial token fetch fails.
    pub async fn from_configs<I, K>(configs: I) -> Result<Self, TokenError>
    where
        I: IntoIterator<Item = (K, OAuthClientConfig)>,
        K: Into<String>,
    {
        let mut registry = Self::new();
        for (id, config) in configs {
            let id = id.into();
            let token = Token::new(config).await?;
            tracing::debug!(registration_id = %id, "registered OAuth2 client");
            registry.register(id, Arc::new(token));
        }
        Ok(registry)
    }

    #[must_use]
    pub fn contains(&self, registration_id: &str) -> bool {
        self.providers.contains_key(registration_id)
    }
}

#[async_trait]
impl TokenProvider for TokenRegistry {
    async fn authorize(&self, registration_id: &str) -> Result<AccessToken, TokenError> {
        let provider = self
            .providers
            .get(registration_id)
            .ok_or_else(|| TokenError::UnknownRegistration(registration_id.to_owned()))?;
        provider.authorize(registration_id).await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;
    use url::Url;

    #[test]
    fn expiry_checks() {
        let fresh = AccessToken::new("a").with_expiry(SystemTime::now() + Duration::from_secs(60));
        let stale = AccessToken::new("b").with_expiry(SystemTime::now() - Duration::from_secs(1));
        assert!(!fresh.is_expired());
        assert!(stale.is_expired());
        assert!(!AccessToken::new("c").is_expired());
    }

    #[test]
    fn debug_redacts_secret() {
        let dbg = format!("{:?}", AccessToken::new("tok-hidden"));
        assert!(!dbg.contains("tok-hidden"), "{dbg}");
    }

    #[tokio::test]
    async fn static_provider_ignores_registration() {
        let provider = StaticTokenProvider::new("fixed");
        let a = provider.authorize("springauth").await.unwrap();
        let b = provider.authorize("other").await.unwrap();
        assert_eq!(a.secret().expose(), "fixed");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn registry_routes_by_id() {
        let registry = TokenRegistry::new()
            .with("springauth", Arc::new(StaticTokenProvider::new("spring")))
            .with("inventory", Arc::new(StaticTokenProvider::new("inv")));

        let tok = registry.authorize("springauth").await.unwrap();
        assert_eq!(tok.secret().expose(), "spring");
        let tok = registry.authorize("inventory").await.unwrap();
        assert_eq!(tok.secret().expose(), "inv");
    }

    #[tokio::test]
    async fn registry_unknown_id_fails() {
        let registry = TokenRegistry::new().with("springauth", Arc::new(StaticTokenProvider::new("x")));
        let err = registry.authorize("nope").await.unwrap_err();
        assert!(
            matches!(err, TokenError::UnknownRegistration(ref id) if id == "nope"),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn registry_from_configs_fetches_tokens() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"access_token":"tok-reg","expires_in":3600,"token_type":"Bearer"}"#);
        });

        let config = OAuthClientConfig::new(
            Url::parse(&server.url("/oauth2/token")).unwrap(),
            "messaging-client",
            "secret",
        )
        .with_http_config(taproom_http::HttpClientConfig::for_testing());

        let registry = TokenRegistry::from_configs([("springauth", config)])
            .await
            .unwrap();
        assert!(registry.contains("springauth"));
        assert_eq!(mock.calls(), 1);

        let tok = registry.authorize("springauth").await.unwrap();
        assert_eq!(tok.secret().expose(), "tok-reg");
    }
}
