use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use beer_catalog_sdk::{Beer, BeerClient, BeerClientError, BeerPage, ListFilter};
use http::StatusCode;
use taproom_auth::TokenError;
use taproom_auth::http_error::format_http_error;
use taproom_http::{HttpClient, HttpError};
use tokio::sync::OnceCell;
use tracing::instrument;

use crate::config::BeerClientConfig;
use crate::factory::HttpClientFactory;

const BEER_PATH: &str = "beer";
const ERROR_PREFIX: &str = "beer catalog";
/// Longest server body excerpt carried in an error message.
const MESSAGE_PREVIEW_CHARS: usize = 512;

/// [`BeerClient`] over HTTP with OAuth2 bearer auth.
///
/// The transport is built on first use and shared by all later calls.
/// `Send + Sync`; wrap in an `Arc` to share.
pub struct HttpBeerClient {
    factory: HttpClientFactory,
    http: OnceCell<HttpClient>,
}

impl fmt::Debug for HttpBeerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBeerClient")
            .field("factory", &self.factory)
            .field("connected", &self.http.initialized())
            .finish()
    }
}

impl HttpBeerClient {
    #[must_use]
    pub fn new(config: BeerClientConfig, provider: Arc<dyn taproom_auth::TokenProvider>) -> Self {
        Self::from_factory(HttpClientFactory::new(config, provider))
    }

    #[must_use]
    pub fn from_factory(factory: HttpClientFactory) -> Self {
        Self {
            factory,
            http: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BeerClientConfig {
        self.factory.config()
    }

    async fn http(&self) -> Result<&HttpClient, BeerClientError> {
        self.http
            .get_or_try_init(|| async { self.factory.build() })
            .await
            .map_err(|e| BeerClientError::transport(format_http_error(&e, ERROR_PREFIX)))
    }
}

#[async_trait]
impl BeerClient for HttpBeerClient {
    #[instrument(skip_all)]
    async fn list_beers_with(&self, filter: ListFilter) -> Result<BeerPage, BeerClientError> {
        let path = list_path(&filter)?;
        let http = self.http().await?;

        tracing::info!("GET request to: {path}");
        let page: BeerPage = http
            .get(&path)
            .send()
            .await
            .map_err(|e| map_http_error(e, None))?
            .json()
            .await
            .map_err(|e| map_http_error(e, None))?;

        tracing::info!(
            total_pages = page.total_pages,
            total_elements = page.total_elements,
            "listed beers"
        );
        Ok(page)
    }

    #[instrument(skip_all, fields(beer_id = %id))]
    async fn get_beer_by_id(&self, id: &str) -> Result<Beer, BeerClientError> {
        let path = item_path(id)?;
        let http = self.http().await?;

        tracing::info!("GET request to: {path}");
        http.get(&path)
            .send()
            .await
            .map_err(|e| map_http_error(e, Some(id)))?
            .json()
            .await
            .map_err(|e| map_http_error(e, Some(id)))
    }

    #[instrument(skip_all, fields(beer_name = %beer.beer_name))]
    async fn create_beer(&self, beer: &Beer) -> Result<Beer, BeerClientError> {
        let http = self.http().await?;

        tracing::info!("POST request to: {BEER_PATH}");
        http.post(BEER_PATH)
            .json(beer)
            .map_err(|e| map_http_error(e, None))?
            .send()
            .await
            .map_err(|e| map_http_error(e, None))?
            .json()
            .await
            .map_err(|e| map_http_error(e, None))
    }

    #[instrument(skip_all, fields(beer_id = %id))]
    async fn update_beer(&self, id: &str, beer: &Beer) -> Result<Beer, BeerClientError> {
        let path = item_path(id)?;
        let http = self.http().await?;

        tracing::info!("PUT request to: {path}");
        http.put(&path)
            .json(beer)
            .map_err(|e| map_http_error(e, Some(id)))?
            .send()
            .await
            .map_err(|e| map_http_error(e, Some(id)))?
            .checked_bytes()
            .await
            .map_err(|e| map_http_error(e, Some(id)))?;

        self.get_beer_by_id(id).await
    }

    #[instrument(skip_all, fields(beer_id = %id))]
    async fn delete_beer(&self, id: &str) -> Result<(), BeerClientError> {
        let path = item_path(id)?;
        let http = self.http().await?;

        tracing::info!("DELETE request to: {path}");
        http.delete(&path)
            .send()
            .await
            .map_err(|e| map_http_error(e, Some(id)))?
            .checked_bytes()
            .await
            .map_err(|e| map_http_error(e, Some(id)))?;
        Ok(())
    }
}

/// `beer`, or `beer?` plus the filter's query in wire order.
fn list_path(filter: &ListFilter) -> Result<String, BeerClientError> {
    let pairs = filter.query_pairs();
    if pairs.is_empty() {
        return Ok(BEER_PATH.to_owned());
    }
    let query = serde_urlencoded::to_string(&pairs)
        .map_err(|e| BeerClientError::validation(e.to_string()))?;
    Ok(format!("{BEER_PATH}?{query}"))
}

/// `beer/{id}` with `id` encoded as a single path segment.
fn item_path(id: &str) -> Result<String, BeerClientError> {
    if id.trim().is_empty() {
        return Err(BeerClientError::validation("beer id must not be empty"));
    }
    if id == "." || id == ".." {
        return Err(BeerClientError::validation(format!(
            "beer id `{id}` is not a valid path segment"
        )));
    }
    Ok(format!("{BEER_PATH}/{}", urlencoding::encode(id)))
}

/// `id` is the beer the request addressed; a 404 without one is a server error.
fn map_http_error(err: HttpError, id: Option<&str>) -> BeerClientError {
    match err {
        HttpError::Transport(ref source) if source.is::<TokenError>() => {
            BeerClientError::auth(source.to_string())
        }
        HttpError::HttpStatus {
            status,
            ref body_preview,
            ..
        } => match (status, id) {
            (StatusCode::NOT_FOUND, Some(id)) => BeerClientError::not_found(id),
            (StatusCode::BAD_REQUEST, _) => {
                BeerClientError::validation(status_message(status, body_preview))
            }
            _ => BeerClientError::server(status.as_u16(), status_message(status, body_preview)),
        },
        HttpError::Json(e) => BeerClientError::decode(e.to_string()),
        other => BeerClientError::transport(format_http_error(&other, ERROR_PREFIX)),
    }
}

fn status_message(status: StatusCode, body_preview: &str) -> String {
    let body = body_preview.trim();
    if body.is_empty() {
        return status.to_string();
    }
    let excerpt: String = body.chars().take(MESSAGE_PREVIEW_CHARS).collect();
    format!("{status}: {excerpt}")
}
