//! Outbound `OAuth2` client credentials flow.
//!
//! Token acquisition and background refresh ([`Token`]), lookup by client
//! registration ([`TokenRegistry`]), and header injection for outbound
//! requests ([`BearerAuthLayer`]).

pub mod builder_ext;
pub mod config;
pub mod error;
pub mod layer;
pub mod provider;
pub(crate) mod source;
pub mod token;
pub mod types;

pub use builder_ext::HttpClientBuilderExt;
pub use config::{OAuthClientConfig, RefreshPolicy};
pub use error::TokenError;
pub use layer::{BearerAuthLayer, BearerAuthService};
pub use provider::{AccessToken, StaticTokenProvider, TokenProvider, TokenRegistry};
pub use token::Token;
pub use types::ClientAuthMethod;
