use http::StatusCode;
use thiserror::Error;

/// Why a request URL was refused. The `reason` text next to it is for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    /// Not a URL at all
    ParseError,
    /// No host to connect to
    MissingAuthority,
    /// Neither `http` nor `https` given
    MissingScheme,
    /// Relative path on a client built without a base URL
    RelativeWithoutBase,
}

/// Everything that can go wrong between building a request and reading its body.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    #[error("request could not be built: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// No response within the per-request timeout
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Connection, protocol or auth layer failure. The cause stays reachable
    /// through `source()` (see [`HttpError::is_transport_caused_by`]).
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("TLS setup failed: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("response body over {limit} bytes (read {actual})")]
    BodyTooLarge { limit: usize, actual: usize },

    /// Non-2xx status, raised by the checking readers of `HttpResponse`
    #[error("HTTP {status}: {body_preview}")]
    HttpStatus {
        status: StatusCode,
        body_preview: String,
        content_type: Option<String>,
    },

    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("form encoding failed: {0}")]
    FormEncode(#[from] serde_urlencoded::ser::Error),

    /// Every request buffer slot is taken
    #[error("request buffer full")]
    Overloaded,

    /// The buffer worker is gone
    #[error("client service closed")]
    ServiceClosed,

    #[error("invalid URL '{url}': {reason}")]
    InvalidUri {
        url: String,
        kind: InvalidUriKind,
        reason: String,
    },

    #[error("URL scheme '{scheme}' refused: {reason}")]
    InvalidScheme { scheme: String, reason: String },
}

impl HttpError {
    /// HTTP status carried by an [`HttpError::HttpStatus`] error.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is [`HttpError::Transport`] wrapping an `E`.
    #[must_use]
    pub fn is_transport_caused_by<E: std::error::Error + 'static>(&self) -> bool {
        match self {
            Self::Transport(inner) => inner.is::<E>(),
            _ => false,
        }
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}
