//! Tower layers that make up the client middleware stack.
//!
//! Auth layers live with their token sources (see `taproom-auth`) and are
//! plugged in through [`HttpClientBuilder::with_auth_layer`](crate::HttpClientBuilder::with_auth_layer).

mod user_agent;

pub use user_agent::{UserAgentLayer, UserAgentService};
