use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::AUTHORIZATION;
use http::{HeaderValue, Request, Response};
use tower::{Layer, Service};
use zeroize::Zeroizing;

use super::provider::TokenProvider;
use taproom_http::HttpError;

/// Tower layer that sets `Authorization: Bearer <token>` on every request.
///
/// The token comes from [`TokenProvider::authorize`] for a fixed client
/// registration, asked once per request.
#[derive(Clone)]
pub struct BearerAuthLayer {
    provider: Arc<dyn TokenProvider>,
    registration_id: Arc<str>,
}

impl fmt::Debug for BearerAuthLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuthLayer")
            .field("registration_id", &self.registration_id)
            .finish_non_exhaustive()
    }
}

impl BearerAuthLayer {
    #[must_use]
    pub fn new(provider: Arc<dyn TokenProvider>, registration_id: impl Into<Arc<str>>) -> Self {
        Self {
            provider,
            registration_id: registration_id.into(),
        }
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            provider: Arc::clone(&self.provider),
            registration_id: Arc::clone(&self.registration_id),
        }
    }
}

/// Created by [`BearerAuthLayer`].
#[derive(Clone)]
pub struct BearerAuthService<S> {
    inner: S,
    provider: Arc<dyn TokenProvider>,
    registration_id: Arc<str>,
}

impl<S: fmt::Debug> fmt::Debug for BearerAuthService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuthService")
            .field("inner", &self.inner)
            .field("registration_id", &self.registration_id)
            .finish_non_exhaustive()
    }
}

impl<S, B, ResBody> Service<Request<B>> for BearerAuthService<S>
where
    S: Service<Request<B>, Response = Response<ResBody>, Error = HttpError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
    B: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = HttpError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<ResBody>, HttpError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        // Clone-swap: the ready service goes into the future.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let provider = Arc::clone(&self.provider);
        let registration_id = Arc::clone(&self.registration_id);

        Box::pin(async move {
            let token = provider
                .authorize(&registration_id)
                .await
                .map_err(|e| HttpError::Transport(Box::new(e)))?;

            let raw = Zeroizing::new(format!("Bearer {}", token.secret().expose()));
            let mut value = HeaderValue::from_str(&raw).map_err(HttpError::InvalidHeaderValue)?;
            value.set_sensitive(true);
            req.headers_mut().insert(AUTHORIZATION, value);

            inner.call(req).await
        })
    }
}
