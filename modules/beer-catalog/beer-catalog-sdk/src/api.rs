//! `BeerClient` trait definition.

use async_trait::async_trait;

use crate::errors::BeerClientError;
use crate::models::{Beer, BeerPage, ListFilter};

/// Operations of the beer catalog API.
///
/// Every call is one HTTP exchange except [`update_beer`](Self::update_beer),
/// which is two. Consumers hold an `Arc<dyn BeerClient>` so the HTTP
/// implementation can be swapped for a test double.
#[async_trait]
pub trait BeerClient: Send + Sync {
    /// First page with the server's default paging.
    ///
    /// # Errors
    ///
    /// Same as [`list_beers_with`](Self::list_beers_with).
    async fn list_beers(&self) -> Result<BeerPage, BeerClientError> {
        self.list_beers_with(ListFilter::default()).await
    }

    /// List beers matching `filter`.
    ///
    /// # Errors
    ///
    /// * `Transport` - network failure
    /// * `Server` - error status
    /// * `Decode` - body is not a beer page
    async fn list_beers_with(&self, filter: ListFilter) -> Result<BeerPage, BeerClientError>;

    /// # Errors
    ///
    /// * `NotFound` - no beer with `id`
    /// * `Decode` - body is not a beer
    async fn get_beer_by_id(&self, id: &str) -> Result<Beer, BeerClientError>;

    /// Create `beer` and return the server's representation, with `id`,
    /// `version` and timestamps filled in.
    ///
    /// # Errors
    ///
    /// * `Validation` - the server rejected the beer (400)
    /// * `Server` - any other error status
    async fn create_beer(&self, beer: &Beer) -> Result<Beer, BeerClientError>;

    /// Replace the beer at `id`, then fetch it again.
    ///
    /// Not atomic: the result is the state read back after the write, which
    /// may already include someone else's change. A failed read surfaces as
    /// an error even though the write went through.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no beer with `id`
    /// * `Validation` - the server rejected the beer (400)
    async fn update_beer(&self, id: &str, beer: &Beer) -> Result<Beer, BeerClientError>;

    /// # Errors
    ///
    /// * `NotFound` - no beer with `id`, including when it was already deleted
    async fn delete_beer(&self, id: &str) -> Result<(), BeerClientError>;
}
