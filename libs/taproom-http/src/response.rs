use crate::error::HttpError;
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

/// At most this many bytes of a failed response end up in the `body_preview`
/// of [`HttpError::HttpStatus`].
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;

/// Boxed response body; already decompressed when the server compressed it.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// A response whose status has not been judged yet.
///
/// `send()` succeeds for every status. Pick the reader that matches what the
/// caller expects back:
/// - [`json`](Self::json) for a typed body
/// - [`checked_bytes`](Self::checked_bytes) when only success matters
/// - [`error_for_status`](Self::error_for_status) to fail without touching the body
/// - [`bytes`](Self::bytes) to take whatever came back
///
/// No reader collects more than the client's `max_body_size`.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

impl HttpResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// # Errors
    /// [`HttpError::HttpStatus`] with an empty preview when the status is not 2xx.
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        let status = self.inner.status();
        if status.is_success() {
            Ok(self)
        } else {
            Err(HttpError::HttpStatus {
                status,
                body_preview: String::new(),
                content_type: content_type(self.inner.headers()),
            })
        }
    }

    /// Collect the body regardless of status.
    ///
    /// # Errors
    /// [`HttpError::BodyTooLarge`] past the size limit, or a transport error
    /// while streaming.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        collect_limited(self.inner.into_body(), self.max_body_size).await
    }

    /// Collect the body of a 2xx response.
    ///
    /// # Errors
    /// [`HttpError::HttpStatus`] carrying a body preview when the status is not
    /// 2xx, otherwise as [`bytes`](Self::bytes).
    pub async fn checked_bytes(self) -> Result<Bytes, HttpError> {
        if self.inner.status().is_success() {
            self.bytes().await
        } else {
            Err(self.into_status_error().await)
        }
    }

    /// Decode the body of a 2xx response as JSON.
    ///
    /// # Errors
    /// As [`checked_bytes`](Self::checked_bytes), plus [`HttpError::Json`] when
    /// the body does not decode into `T`.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let body = self.checked_bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn into_status_error(self) -> HttpError {
        let status = self.inner.status();
        let content_type = content_type(self.inner.headers());
        let limit = self.max_body_size.min(ERROR_BODY_PREVIEW_LIMIT);

        // The status wins over whatever goes wrong reading the preview
        let body_preview = match collect_limited(self.inner.into_body(), limit).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(HttpError::BodyTooLarge { .. }) => "<body too large for preview>".to_owned(),
            Err(e) => format!("<body unreadable: {e}>"),
        };

        HttpError::HttpStatus {
            status,
            body_preview,
            content_type,
        }
    }
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn collect_limited(body: ResponseBody, limit: usize) -> Result<Bytes, HttpError> {
    let mut body = std::pin::pin!(body);
    let mut collected = Vec::new();

    while let Some(frame) = body.frame().await {
        let Some(chunk) = frame.map_err(HttpError::Transport)?.into_data().ok() else {
            continue;
        };
        let actual = collected.len() + chunk.len();
        if actual > limit {
            return Err(HttpError::BodyTooLarge { limit, actual });
        }
        collected.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(collected))
}
