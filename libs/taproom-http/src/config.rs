use std::time::Duration;

use url::Url;

/// Default User-Agent string for HTTP requests
pub const DEFAULT_USER_AGENT: &str = concat!("taproom-http/", env!("CARGO_PKG_VERSION"));

/// Which URL schemes the client accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportSecurity {
    /// Only `https://` URLs are sent.
    #[default]
    TlsOnly,
    /// Plain `http://` is accepted too. Meant for local mock servers.
    AllowInsecureHttp,
}

/// Configuration for [`HttpClient`](crate::HttpClient).
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Prefix that relative request paths are resolved against.
    ///
    /// Stored with a trailing `/` so `"beer"` joins as a child segment rather
    /// than replacing the last one.
    pub base_url: Option<Url>,

    /// Timeout for a single request, from send until response headers.
    pub request_timeout: Duration,

    /// Upper bound on buffered (decompressed) response bodies.
    pub max_body_size: usize,

    pub user_agent: String,

    pub transport: TransportSecurity,

    /// Queue depth of the internal `tower::buffer::Buffer`. Clamped to at least 1.
    pub buffer_capacity: usize,

    pub pool_idle_timeout: Option<Duration>,

    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10 MB
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::TlsOnly,
            buffer_capacity: 1024,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }
}

impl HttpClientConfig {
    /// Preset for OAuth2 token endpoints: small bodies, few idle connections.
    #[must_use]
    pub fn token_endpoint() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1 MB
            buffer_capacity: 256,
            pool_idle_timeout: Some(Duration::from_secs(60)),
            pool_max_idle_per_host: 4,
            ..Self::default()
        }
    }

    /// Preset for tests against local mock servers. Allows plain HTTP.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_body_size: 1024 * 1024, // 1 MB
            transport: TransportSecurity::AllowInsecureHttp,
            buffer_capacity: 256,
            pool_idle_timeout: Some(Duration::from_secs(10)),
            pool_max_idle_per_host: 4,
            ..Self::default()
        }
    }
}

/// Ensure the URL path ends with `/`.
///
/// `Url::join` replaces the last path segment unless the base ends with a
/// slash, so `http://host/api/v1` would turn `"beer"` into `http://host/api/beer`.
#[must_use]
pub fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
