#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for taproom service clients.
//!
//! A hyper-based client behind a small tower stack:
//! - TLS via rustls with webpki roots (HTTPS only unless insecure HTTP is opted into)
//! - Optional base URL; relative request paths are resolved against it
//! - Per-request timeout
//! - User-Agent header injection
//! - Transparent response decompression (gzip, brotli, deflate)
//! - A single pluggable auth layer slot (see [`HttpClientBuilder::with_auth_layer`])
//!
//! # Example
//!
//! ```ignore
//! use taproom_http::HttpClientBuilder;
//!
//! let client = HttpClientBuilder::new()
//!     .base_url(Url::parse("https://catalog.example.com/api/v1")?)
//!     .user_agent("beer-cli/0.1")
//!     .build()?;
//!
//! // "beer" resolves to https://catalog.example.com/api/v1/beer
//! let page: Page = client.get("beer").send().await?.json().await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod layers;
mod request;
mod response;
mod tls;

pub use builder::{HttpClientBuilder, InnerService};
pub use client::HttpClient;
pub use config::{DEFAULT_USER_AGENT, HttpClientConfig, TransportSecurity, normalize_base_url};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{UserAgentLayer, UserAgentService};
pub use request::RequestBuilder;
pub use response::{ERROR_BODY_PREVIEW_LIMIT, HttpResponse, ResponseBody};
