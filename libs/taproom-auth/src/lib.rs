#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![forbid(unsafe_code)]

//! Outbound authentication for taproom HTTP clients.
//!
//! [`TokenProvider`] is the seam between a service client and wherever its
//! bearer tokens come from. [`BearerAuthLayer`] asks the provider for a token
//! on every request and sets the `Authorization` header.

pub mod http_error;
pub mod oauth2;

pub use oauth2::{
    AccessToken, BearerAuthLayer, BearerAuthService, ClientAuthMethod, HttpClientBuilderExt,
    OAuthClientConfig, RefreshPolicy, StaticTokenProvider, Token, TokenError, TokenProvider,
    TokenRegistry,
};
pub use taproom_utils::SecretString;
