use std::fmt;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use aliri_clock::DurationSecs;
use aliri_tokens::backoff::ErrorBackoffConfig;
use aliri_tokens::jitter::RandomEarlyJitter;
use aliri_tokens::{TokenStatus, TokenWatcher};
use arc_swap::ArcSwap;
use async_trait::async_trait;

use super::config::{OAuthClientConfig, RefreshPolicy};
use super::error::TokenError;
use super::provider::{AccessToken, TokenProvider};
use super::source::OAuthTokenSource;
use taproom_utils::SecretString;

struct TokenInner {
    watcher: TokenWatcher,
}

/// Client-credentials token for one client registration.
///
/// A background `aliri_tokens` watcher refreshes the token before it goes
/// stale; reads go through `ArcSwap` and never wait on the network.
/// Cheap to clone.
#[derive(Clone)]
pub struct Token {
    inner: Arc<ArcSwap<TokenInner>>,
    source_factory: Arc<dyn Fn() -> Result<OAuthTokenSource, TokenError> + Send + Sync>,
    refresh: RefreshPolicy,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token").finish_non_exhaustive()
    }
}

impl Token {
    /// Validate `config`, fetch the first token and start background refresh.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ConfigError`] if the config is invalid, or the
    /// token endpoint error if the initial fetch fails.
    pub async fn new(config: OAuthClientConfig) -> Result<Self, TokenError> {
        config.validate()?;

        let refresh = config.refresh;
        let source = OAuthTokenSource::new(&config)?;
        let watcher = spawn_watcher(source, refresh).await?;

        let source_factory: Arc<dyn Fn() -> Result<OAuthTokenSource, TokenError> + Send + Sync> =
            Arc::new(move || OAuthTokenSource::new(&config));

        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(TokenInner { watcher })),
            source_factory,
            refresh,
        })
    }

    /// Current access token value.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Unavailable`] if the cached token has expired
    /// and the watcher has not refreshed it yet.
    pub fn get(&self) -> Result<SecretString, TokenError> {
        self.current().map(|t| t.secret().clone())
    }

    fn current(&self) -> Result<AccessToken, TokenError> {
        let guard = self.inner.load();
        let borrowed = guard.watcher.token();
        if matches!(borrowed.token_status(), TokenStatus::Expired) {
            return Err(TokenError::Unavailable(
                "token expired, refresh pending".into(),
            ));
        }
        let expires_at = UNIX_EPOCH + Duration::from_secs(borrowed.expiry().0);
        Ok(AccessToken::new(borrowed.access_token().as_str()).with_expiry(expires_at))
    }

    /// Replace the watcher with a fresh one, discarding the cached token.
    ///
    /// Call after a downstream 401. On failure the old watcher stays in
    /// place and a warning is logged.
    pub async fn invalidate(&self) {
        let source = match (self.source_factory)() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "OAuth2 token invalidation: failed to create source");
                return;
            }
        };

        let watcher = match spawn_watcher(source, self.refresh).await {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(error = %e, "OAuth2 token invalidation: initial fetch failed");
                return;
            }
        };

        self.inner.store(Arc::new(TokenInner { watcher }));
    }
}

#[async_trait]
impl TokenProvider for Token {
    async fn authorize(&self, _registration_id: &str) -> Result<AccessToken, TokenError> {
        self.current()
    }
}

async fn spawn_watcher(
    source: OAuthTokenSource,
    refresh: RefreshPolicy,
) -> Result<TokenWatcher, TokenError> {
    let jitter = RandomEarlyJitter::new(DurationSecs(refresh.jitter.as_secs()));
    let backoff = ErrorBackoffConfig::new(refresh.min_period, refresh.min_period * 30, 2);

    TokenWatcher::spawn_from_token_source(source, jitter, backoff).await
}
