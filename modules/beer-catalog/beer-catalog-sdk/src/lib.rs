#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Beer Catalog SDK
//!
//! Public contract of the beer catalog client:
//! - `BeerClient` trait with the five catalog operations
//! - `Beer`, `BeerStyle`, `BeerPage` wire models
//! - `ListFilter` for list queries
//! - `BeerClientError` for error handling
//!
//! ## Usage
//!
//! ```ignore
//! use beer_catalog_sdk::{BeerClient, BeerStyle, ListFilter};
//!
//! let page = client
//!     .list_beers_with(ListFilter::new().with_beer_style(BeerStyle::Ipa).with_page_size(25))
//!     .await?;
//! let beer = client.get_beer_by_id(&id).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod errors;
pub mod models;

pub use api::BeerClient;
pub use errors::BeerClientError;
pub use models::{Beer, BeerPage, BeerStyle, ListFilter, ParseBeerStyleError};
