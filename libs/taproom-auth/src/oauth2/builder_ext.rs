use std::sync::Arc;

use tower::ServiceExt;

use super::layer::BearerAuthLayer;
use super::provider::TokenProvider;

/// Bearer auth for [`taproom_http::HttpClientBuilder`].
///
/// ```ignore
/// use taproom_auth::{HttpClientBuilderExt, TokenRegistry};
///
/// let registry = TokenRegistry::from_configs([("springauth", config)]).await?;
/// let client = HttpClientBuilder::new()
///     .with_bearer_auth(Arc::new(registry), "springauth")
///     .build()?;
/// ```
pub trait HttpClientBuilderExt {
    /// Send `Authorization: Bearer <token>` for `registration_id` on every request.
    #[must_use]
    fn with_bearer_auth(self, provider: Arc<dyn TokenProvider>, registration_id: &str) -> Self;
}

impl HttpClientBuilderExt for taproom_http::HttpClientBuilder {
    fn with_bearer_auth(self, provider: Arc<dyn TokenProvider>, registration_id: &str) -> Self {
        install(self, BearerAuthLayer::new(provider, registration_id))
    }
}

fn install(
    builder: taproom_http::HttpClientBuilder,
    layer: BearerAuthLayer,
) -> taproom_http::HttpClientBuilder {
    builder.with_auth_layer(move |svc| {
        tower::ServiceBuilder::new()
            .layer(layer)
            .service(svc)
            .boxed_clone()
    })
}
