use crate::config::{HttpClientConfig, TransportSecurity, normalize_base_url};
use crate::error::{HttpError, InvalidUriKind};
use crate::layers::UserAgentLayer;
use crate::response::ResponseBody;
use crate::tls;
use bytes::Bytes;
use http::Response;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::sync::Arc;
use std::time::Duration;
use tower::buffer::Buffer;
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneService;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;
use url::Url;

/// Type-erased service handed to the auth layer hook in [`HttpClientBuilder::with_auth_layer`].
pub type InnerService =
    BoxCloneService<http::Request<Full<Bytes>>, http::Response<ResponseBody>, HttpError>;

/// Builder for constructing an [`HttpClient`](crate::HttpClient) with a layered tower stack.
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    auth_layer: Option<Box<dyn FnOnce(InnerService) -> InnerService + Send>>,
}

impl HttpClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HttpClientConfig::default())
    }

    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self {
            config,
            auth_layer: None,
        }
    }

    /// Set the prefix that relative request paths resolve against.
    ///
    /// A missing trailing `/` is added.
    #[must_use]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.config.base_url = Some(base_url);
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the maximum response body size
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Set transport security mode
    ///
    /// Use `TransportSecurity::AllowInsecureHttp` only for testing with mock servers.
    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.config.transport = transport;
        self
    }

    /// Allow insecure HTTP connections (for testing only)
    ///
    /// Only available in debug builds or with the `allow-insecure-http`
    /// feature. Release builds that need plain HTTP must go through
    /// [`transport`](Self::transport) explicitly.
    #[must_use]
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(mut self) -> Self {
        tracing::warn!(
            target: "taproom_http::security",
            "allow_insecure_http() called - HTTP traffic will NOT be encrypted"
        );
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    /// Insert an auth layer on top of the timeout/transport stack.
    ///
    /// Stack position: `Buffer → **this layer** → Timeout → UserAgent → …`
    ///
    /// The layer runs once per request. Only one auth layer can be set; a
    /// second call replaces the first.
    #[must_use]
    pub fn with_auth_layer(
        mut self,
        wrap: impl FnOnce(InnerService) -> InnerService + Send + 'static,
    ) -> Self {
        self.auth_layer = Some(Box::new(wrap));
        self
    }

    /// Set the buffer capacity for concurrent request handling
    ///
    /// A capacity of 0 is clamped to 1 (`tower::buffer::Buffer` panics on 0).
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity.max(1);
        self
    }

    /// Build the HTTP client with all configured layers
    ///
    /// Must be called from within a Tokio runtime: the request buffer spawns
    /// its worker task here.
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails, the user agent is not a
    /// valid header value, or the base URL cannot carry relative paths.
    pub fn build(self) -> Result<crate::HttpClient, HttpError> {
        if self.config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                "insecure HTTP enabled (TransportSecurity::AllowInsecureHttp); \
                 use only for testing with mock servers"
            );
        }

        let base_url = self
            .config
            .base_url
            .map(validate_base_url)
            .transpose()?
            .map(Arc::new);

        let timeout = self.config.request_timeout;
        let https = build_https_connector(self.config.transport)?;

        let mut client_builder = Client::builder(TokioExecutor::new());
        // pool_timer is required for pool_idle_timeout to take effect
        client_builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(self.config.pool_max_idle_per_host)
            .http2_only(false);
        if let Some(idle_timeout) = self.config.pool_idle_timeout {
            client_builder.pool_idle_timeout(idle_timeout);
        }
        let hyper_client = client_builder.build::<_, Full<Bytes>>(https);

        let ua_layer = UserAgentLayer::try_new(&self.config.user_agent)?;

        // Request flow (outer → inner):
        //   Buffer → [AuthLayer?] → ErrorMapping → Timeout → UserAgent →
        //   Decompression → hyper_client
        //
        // send() returns Ok for every HTTP status; only transport, timeout,
        // TLS or auth failures are Err. Status checks happen in
        // HttpResponse::error_for_status / checked_bytes / json.
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .layer(ua_layer)
            .layer(DecompressionLayer::new())
            .service(hyper_client)
            .map_response(map_decompression_response)
            .map_err(move |e: tower::BoxError| map_tower_error(e, timeout));

        let mut boxed_service = service.boxed_clone();
        if let Some(wrap) = self.auth_layer {
            boxed_service = wrap(boxed_service);
        }

        // Buffer gives Clone + Send + Sync without a mutex
        let buffered_service: crate::client::BufferedService =
            Buffer::new(boxed_service, self.config.buffer_capacity.max(1));

        Ok(crate::HttpClient {
            service: buffered_service,
            base_url,
            max_body_size: self.config.max_body_size,
            transport_security: self.config.transport,
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_base_url(url: Url) -> Result<Url, HttpError> {
    if url.cannot_be_a_base() || !url.has_host() {
        return Err(HttpError::InvalidUri {
            url: url.to_string(),
            kind: InvalidUriKind::MissingAuthority,
            reason: "base URL must be hierarchical with a host".to_owned(),
        });
    }
    Ok(normalize_base_url(url))
}

/// Map tower errors to `HttpError`, keeping typed `HttpError`s that tower boxed.
fn map_tower_error(err: tower::BoxError, timeout: Duration) -> HttpError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpError::Timeout(timeout);
    }

    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(other) => HttpError::Transport(other),
    }
}

fn map_decompression_response<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = response.into_parts();
    let boxed_body: ResponseBody = body.map_err(Into::into).boxed();
    Response::from_parts(parts, boxed_body)
}

/// HTTPS connector trusting the bundled webpki roots.
///
/// ALPN advertises both h2 and http/1.1.
fn build_https_connector(
    transport: TransportSecurity,
) -> Result<HttpsConnector<HttpConnector>, HttpError> {
    let allow_http = transport == TransportSecurity::AllowInsecureHttp;

    let builder = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(tls::crypto_provider())
        .map_err(|e| HttpError::Tls(Box::new(e)))?;

    let connector = if allow_http {
        builder.https_or_http().enable_all_versions().build()
    } else {
        builder.https_only().enable_all_versions().build()
    };
    Ok(connector)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;

    #[test]
    fn test_builder_default() {
        let builder = HttpClientBuilder::new();
        assert_eq!(builder.config.request_timeout, Duration::from_secs(30));
        assert_eq!(builder.config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(builder.config.buffer_capacity, 1024);
        assert!(builder.config.base_url.is_none());
    }

    #[test]
    fn test_builder_setters() {
        let builder = HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .timeout(Duration::from_secs(5))
            .user_agent("beer-cli/1.0")
            .max_body_size(2048)
            .buffer_capacity(0)
            .base_url(Url::parse("http://localhost:8080/api/v1").unwrap());

        assert_eq!(builder.config.request_timeout, Duration::from_secs(5));
        assert_eq!(builder.config.user_agent, "beer-cli/1.0");
        assert_eq!(builder.config.max_body_size, 2048);
        assert_eq!(builder.config.buffer_capacity, 1, "capacity 0 clamps to 1");
        assert_eq!(
            builder.config.base_url.as_ref().map(Url::as_str),
            Some("http://localhost:8080/api/v1")
        );
    }

    #[test]
    fn test_builder_transport_security() {
        let builder = HttpClientBuilder::new().transport(TransportSecurity::AllowInsecureHttp);
        assert_eq!(
            builder.config.transport,
            TransportSecurity::AllowInsecureHttp
        );

        let builder = HttpClientBuilder::new().allow_insecure_http();
        assert_eq!(
            builder.config.transport,
            TransportSecurity::AllowInsecureHttp
        );
    }

    #[test]
    fn test_validate_base_url_rejects_opaque_urls() {
        let err = validate_base_url(Url::parse("mailto:brewer@example.com").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            HttpError::InvalidUri {
                kind: InvalidUriKind::MissingAuthority,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_base_url_normalizes() {
        let url = validate_base_url(Url::parse("https://catalog.example.com/api/v1").unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://catalog.example.com/api/v1/");
    }

    #[tokio::test]
    async fn test_build_with_invalid_user_agent_fails() {
        let result = HttpClientBuilder::new().user_agent("bad\nagent").build();
        assert!(matches!(result, Err(HttpError::InvalidHeaderValue(_))));
    }

    #[tokio::test]
    async fn test_build_stores_normalized_base_url() {
        let client = HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .base_url(Url::parse("http://localhost:8080/api/v1").unwrap())
            .build()
            .unwrap();
        assert_eq!(
            client.base_url().map(Url::as_str),
            Some("http://localhost:8080/api/v1/")
        );
    }

    #[tokio::test]
    async fn test_build_tls_only_client() {
        let client = HttpClientBuilder::new()
            .base_url(Url::parse("https://catalog.example.com/api/v1").unwrap())
            .build()
            .unwrap();
        assert_eq!(
            client.base_url().map(Url::as_str),
            Some("https://catalog.example.com/api/v1/")
        );
    }

    #[test]
    fn test_map_tower_error_timeout() {
        let err: tower::BoxError = Box::new(tower::timeout::error::Elapsed::new());
        let mapped = map_tower_error(err, Duration::from_secs(3));
        assert!(matches!(mapped, HttpError::Timeout(d) if d == Duration::from_secs(3)));
    }

    #[test]
    fn test_map_tower_error_preserves_http_error() {
        let err: tower::BoxError = Box::new(HttpError::ServiceClosed);
        assert!(matches!(
            map_tower_error(err, Duration::from_secs(1)),
            HttpError::ServiceClosed
        ));
    }
}
