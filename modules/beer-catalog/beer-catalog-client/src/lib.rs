#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![forbid(unsafe_code)]

//! HTTP implementation of [`beer_catalog_sdk::BeerClient`].
//!
//! [`HttpBeerClient`] talks to the catalog over a `taproom_http` client that
//! [`HttpClientFactory`] builds from a [`BeerClientConfig`], with bearer
//! tokens from any [`taproom_auth::TokenProvider`].
//!
//! ```ignore
//! let registry = TokenRegistry::from_configs([(
//!     config.registration_id.clone(),
//!     config.oauth_config()?,
//! )])
//! .await?;
//! let client = HttpBeerClient::new(config, Arc::new(registry));
//! let page = client.list_beers().await?;
//! ```

mod client;
mod config;
mod factory;

pub use client::HttpBeerClient;
pub use config::{BeerClientConfig, DEFAULT_REGISTRATION_ID, OAuthSection};
pub use factory::{DEFAULT_USER_AGENT, HttpClientFactory};
