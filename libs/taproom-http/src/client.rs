use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::request::RequestBuilder;
use crate::response::ResponseBody;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tower::Service;
use tower::buffer::Buffer;
use url::Url;

/// Future type of the inner service
pub type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, HttpError>> + Send>>;

/// Buffered service: `Buffer<Req, F>` in tower 0.5
pub type BufferedService = Buffer<Request<Full<Bytes>>, ServiceFuture>;

/// HTTP client with tower middleware stack
///
/// `HttpClient` is `Clone + Send + Sync` and cloning is cheap (a channel
/// handle plus an `Arc` of the base URL). Store it directly; no `Mutex` is
/// needed for concurrent use.
///
/// Request methods accept either an absolute `http(s)://` URL or a path
/// relative to the configured base URL:
///
/// ```ignore
/// let client = HttpClientBuilder::new()
///     .base_url(Url::parse("https://catalog.example.com/api/v1/")?)
///     .build()?;
///
/// client.get("beer?beerStyle=IPA").send().await?;  // …/api/v1/beer?beerStyle=IPA
/// client.get("https://other.example.com/health").send().await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) service: BufferedService,
    pub(crate) base_url: Option<Arc<Url>>,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
}

impl HttpClient {
    /// The normalized base URL, if one was configured.
    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_deref()
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::POST, url)
    }

    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::PUT, url)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::DELETE, url)
    }

    /// Create a request builder for an arbitrary method.
    ///
    /// URL resolution errors are deferred to [`RequestBuilder::send`].
    pub fn request(&self, method: http::Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(
            self.service.clone(),
            self.max_body_size,
            method,
            self.resolve(url),
            self.transport_security,
        )
    }

    /// Resolve `url` against the base URL unless it is already absolute.
    fn resolve(&self, url: &str) -> Result<String, HttpError> {
        let invalid = |kind, reason: String| HttpError::InvalidUri {
            url: url.to_owned(),
            kind,
            reason,
        };

        match Url::parse(url) {
            Ok(absolute) => Ok(absolute.into()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_deref().ok_or_else(|| {
                    invalid(
                        InvalidUriKind::RelativeWithoutBase,
                        "relative URL requires a configured base URL".to_owned(),
                    )
                })?;
                base.join(url)
                    .map(String::from)
                    .map_err(|e| invalid(InvalidUriKind::ParseError, e.to_string()))
            }
            Err(e) => Err(invalid(InvalidUriKind::ParseError, e.to_string())),
        }
    }
}

/// Map buffer errors to `HttpError`
///
/// Inner service errors come back boxed; anything else means the buffer
/// worker is gone.
pub fn map_buffer_error(err: tower::BoxError) -> HttpError {
    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(err) => {
            tracing::error!(
                error = %err,
                "buffer worker closed unexpectedly; service unavailable"
            );
            HttpError::ServiceClosed
        }
    }
}

/// Acquire a buffer slot without waiting. A full buffer is `HttpError::Overloaded`.
pub async fn try_acquire_buffer_slot(service: &mut BufferedService) -> Result<(), HttpError> {
    use std::task::Poll;

    let poll_result = std::future::poll_fn(|cx| match service.poll_ready(cx) {
        Poll::Ready(result) => Poll::Ready(Some(result)),
        Poll::Pending => Poll::Ready(None),
    })
    .await;

    match poll_result {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(map_buffer_error(e)),
        None => Err(HttpError::Overloaded),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::builder::HttpClientBuilder;
    use crate::config::HttpClientConfig;
    use crate::error::HttpError;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client() -> HttpClient {
        HttpClientBuilder::new().allow_insecure_http().build().unwrap()
    }

    fn based_client(server: &MockServer, prefix: &str) -> HttpClient {
        HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .base_url(Url::parse(&server.url(prefix)).unwrap())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_http_client_get_absolute() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/test");
            then.status(200).json_body(json!({"success": true}));
        });

        let resp = test_client().get(&server.url("/test")).send().await.unwrap();
        assert_eq!(resp.status(), hyper::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_relative_path_resolves_against_base_url() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/beer")
                .query_param("beerStyle", "IPA");
            then.status(200).json_body(json!({"ok": true}));
        });

        // Base deliberately lacks the trailing slash
        let client = based_client(&server, "/api/v1");
        let resp = client.get("beer?beerStyle=IPA").send().await.unwrap();

        assert_eq!(resp.status(), hyper::StatusCode::OK);
        m.assert();
    }

    #[tokio::test]
    async fn test_absolute_url_bypasses_base_url() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(204);
        });

        let client = based_client(&server, "/api/v1/");
        let resp = client.get(&server.url("/health")).send().await.unwrap();

        assert_eq!(resp.status(), hyper::StatusCode::NO_CONTENT);
        m.assert();
    }

    #[tokio::test]
    async fn test_relative_path_without_base_url_is_rejected() {
        let err = test_client().get("beer").send().await.unwrap_err();
        assert!(
            matches!(
                err,
                HttpError::InvalidUri {
                    kind: InvalidUriKind::RelativeWithoutBase,
                    ..
                }
            ),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_plain_http_rejected_when_tls_only() {
        let client = HttpClientBuilder::new().build().unwrap();
        let err = client
            .get("http://localhost:1/beer")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidScheme { ref scheme, .. } if scheme == "http"));
    }

    #[tokio::test]
    async fn test_http_client_put_and_delete() {
        let server = MockServer::start();
        let put = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v1/beer/42")
                .header("content-type", "application/json")
                .json_body(json!({"beerName": "Stella"}));
            then.status(204);
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/v1/beer/42");
            then.status(204);
        });

        let client = based_client(&server, "/api/v1/");
        client
            .put("beer/42")
            .json(&json!({"beerName": "Stella"}))
            .unwrap()
            .send()
            .await
            .unwrap()
            .error_for_status()
            .unwrap();
        client
            .delete("beer/42")
            .send()
            .await
            .unwrap()
            .error_for_status()
            .unwrap();

        put.assert();
        delete.assert();
    }

    #[tokio::test]
    async fn test_http_client_post_form() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(POST)
                .path("/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body("grant_type=client_credentials&scope=beer.read");
            then.status(200).json_body(json!({"received": true}));
        });

        let resp = test_client()
            .post(&server.url("/token"))
            .form(&[("grant_type", "client_credentials"), ("scope", "beer.read")])
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), hyper::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_json_body_parsing() {
        #[derive(serde::Deserialize)]
        struct Payload {
            name: String,
            value: i32,
        }

        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/json");
            then.status(200)
                .json_body(json!({"name": "test", "value": 42}));
        });

        let data: Payload = test_client()
            .get(&server.url("/json"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(data.name, "test");
        assert_eq!(data.value, 42);
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let server = MockServer::start();
        let large_body = "x".repeat(64 * 1024);
        let _m = server.mock(|when, then| {
            when.method(GET).path("/large");
            then.status(200).body(&large_body);
        });

        let client = HttpClientBuilder::new()
            .allow_insecure_http()
            .max_body_size(1024)
            .build()
            .unwrap();

        let result = client
            .get(&server.url("/large"))
            .send()
            .await
            .unwrap()
            .bytes()
            .await;
        assert!(matches!(result, Err(HttpError::BodyTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_custom_user_agent() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/test")
                .header("user-agent", "beer-cli/1.0");
            then.status(200);
        });

        let client = HttpClientBuilder::new()
            .allow_insecure_http()
            .user_agent("beer-cli/1.0")
            .build()
            .unwrap();

        client.get(&server.url("/test")).send().await.unwrap();
        m.assert();
    }

    #[tokio::test]
    async fn test_non_2xx_returns_http_status_error() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404)
                .header("content-type", "application/json")
                .body(r#"{"error":"not found"}"#);
        });

        let result: Result<serde_json::Value, _> = test_client()
            .get(&server.url("/missing"))
            .send()
            .await
            .unwrap()
            .json()
            .await;

        match result {
            Err(HttpError::HttpStatus {
                status,
                body_preview,
                content_type,
            }) => {
                assert_eq!(status, hyper::StatusCode::NOT_FOUND);
                assert!(body_preview.contains("not found"));
                assert_eq!(content_type.as_deref(), Some("application/json"));
            }
            other => panic!("expected HttpStatus error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auth_layer_hook_wraps_every_request() {
        use tower::ServiceExt;

        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/secured").header("x-test-auth", "yes");
            then.status(200);
        });

        let client = HttpClientBuilder::new()
            .allow_insecure_http()
            .with_auth_layer(|inner| {
                inner
                    .map_request(|mut req: http::Request<Full<Bytes>>| {
                        req.headers_mut().insert(
                            "x-test-auth",
                            http::HeaderValue::from_static("yes"),
                        );
                        req
                    })
                    .boxed_clone()
            })
            .build()
            .unwrap();

        for _ in 0..2 {
            client.get(&server.url("/secured")).send().await.unwrap();
        }
        m.assert_calls(2);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 1 is reserved and nothing listens there
        let err = test_client()
            .get("http://127.0.0.1:1/unreachable")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Transport(_)), "got {err:?}");
    }
}
