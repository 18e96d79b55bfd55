use crate::client::{BufferedService, map_buffer_error, try_acquire_buffer_slot};
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::{HttpResponse, ResponseBody};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{Request, Response};
use http_body_util::Full;
use serde::Serialize;
use tower::Service;

const APPLICATION_JSON: &str = "application/json";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// One outgoing request, assembled step by step.
///
/// Created by [`HttpClient::get`](crate::HttpClient::get) and friends. Errors
/// from URL resolution or invalid headers are held until
/// [`send()`](RequestBuilder::send), so chains stay infallible.
///
/// ```ignore
/// let created: Beer = client
///     .post("beer")
///     .header("x-request-id", "123")
///     .json(&new_beer)?
///     .send()
///     .await?
///     .json()
///     .await?;
/// ```
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    service: BufferedService,
    max_body_size: usize,
    method: http::Method,
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
    /// Content type implied by how the body was set
    body_type: Option<&'static str>,
    /// First building error, reported by `send()`
    error: Option<HttpError>,
    transport_security: TransportSecurity,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: BufferedService,
        max_body_size: usize,
        method: http::Method,
        url: Result<String, HttpError>,
        transport_security: TransportSecurity,
    ) -> Self {
        let (url, error) = match url {
            Ok(url) => (url, None),
            Err(e) => (String::new(), Some(e)),
        };
        Self {
            service,
            max_body_size,
            method,
            url,
            headers: Vec::new(),
            body: Bytes::new(),
            body_type: None,
            error,
            transport_security,
        }
    }

    /// The resolved absolute URL (empty if resolution failed).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => self.headers.push((name, value)),
            (Err(e), _) => self.error = Some(HttpError::InvalidHeaderName(e)),
            (_, Err(e)) => self.error = Some(HttpError::InvalidHeaderValue(e)),
        }
        self
    }

    /// Serialize `body` as the JSON payload.
    ///
    /// `Content-Type: application/json` is added at send time when no
    /// explicit content type was given.
    ///
    /// # Errors
    /// Returns a deferred builder error, or `HttpError::Json` if serialization fails.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        self.body = Bytes::from(serde_json::to_vec(body)?);
        self.body_type = Some(APPLICATION_JSON);
        Ok(self)
    }

    /// Encode `fields` as an `application/x-www-form-urlencoded` payload.
    ///
    /// # Errors
    /// Returns a deferred builder error, or `HttpError::FormEncode` if encoding fails.
    pub fn form(mut self, fields: &[(&str, &str)]) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        self.body = Bytes::from(serde_urlencoded::to_string(fields)?);
        self.body_type = Some(FORM_URLENCODED);
        Ok(self)
    }

    /// Check the resolved URL against the transport security mode.
    fn validate_url(&self) -> Result<http::Uri, HttpError> {
        let uri: http::Uri =
            self.url
                .parse()
                .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
                    url: self.url.clone(),
                    kind: InvalidUriKind::ParseError,
                    reason: e.to_string(),
                })?;

        if uri.authority().is_none() {
            return Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingAuthority,
                reason: "missing host/authority".to_owned(),
            });
        }

        match uri.scheme_str() {
            Some("https") => Ok(uri),
            Some("http") => match self.transport_security {
                TransportSecurity::AllowInsecureHttp => Ok(uri),
                TransportSecurity::TlsOnly => Err(HttpError::InvalidScheme {
                    scheme: "http".to_owned(),
                    reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                }),
            },
            Some(scheme) => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// schemes are supported".to_owned(),
            }),
            None => Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingScheme,
                reason: "missing scheme".to_owned(),
            }),
        }
    }

    /// Hand the request to the client's service stack.
    ///
    /// Any HTTP status counts as success here; the [`HttpResponse`] readers
    /// decide what a non-2xx means.
    ///
    /// # Errors
    ///
    /// The first deferred building error, a URL the transport security mode
    /// refuses, [`HttpError::Overloaded`] when the request buffer is full, or
    /// whatever the stack raised: timeout, transport, TLS or auth layer failure.
    pub async fn send(mut self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let uri = self.validate_url()?;
        let mut builder = Request::builder().method(self.method).uri(uri);

        if let Some(body_type) = self.body_type
            && !self.headers.iter().any(|(name, _)| name == CONTENT_TYPE)
        {
            builder = builder.header(CONTENT_TYPE, HeaderValue::from_static(body_type));
        }
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        let request = builder.body(Full::new(self.body))?;

        try_acquire_buffer_slot(&mut self.service).await?;

        let inner: Response<ResponseBody> =
            self.service.call(request).await.map_err(map_buffer_error)?;

        Ok(HttpResponse {
            inner,
            max_body_size: self.max_body_size,
        })
    }
}
