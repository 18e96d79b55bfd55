use std::fmt;
use std::sync::Arc;

use taproom_auth::{HttpClientBuilderExt, TokenProvider};
use taproom_http::{HttpClient, HttpClientBuilder, HttpError, TransportSecurity};

use crate::config::BeerClientConfig;

pub const DEFAULT_USER_AGENT: &str = concat!("beer-catalog-client/", env!("CARGO_PKG_VERSION"));

/// Builds the catalog transport: base URL, timeout, user agent, transport
/// security and bearer auth. No retry layer.
#[derive(Clone)]
pub struct HttpClientFactory {
    config: Arc<BeerClientConfig>,
    provider: Arc<dyn TokenProvider>,
}

impl fmt::Debug for HttpClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpClientFactory {
    #[must_use]
    pub fn new(config: BeerClientConfig, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BeerClientConfig {
        &self.config
    }

    /// Same configuration in, same client out.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the root URL cannot be a base, the user agent
    /// is not a valid header value, or TLS setup fails.
    pub fn build(&self) -> Result<HttpClient, HttpError> {
        let config = &self.config;
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

        let transport = config.transport_security();
        if transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                root_url = %config.root_url,
                "beer catalog client allows plain HTTP"
            );
        }

        HttpClientBuilder::new()
            .base_url(config.root_url.clone())
            .timeout(config.request_timeout)
            .user_agent(user_agent)
            .transport(transport)
            .with_bearer_auth(Arc::clone(&self.provider), &config.registration_id)
            .build()
    }
}
