//! Development-time path-prefix router / reverse proxy library.
//!
//! Every inbound request is matched against an ordered table of path
//! prefixes and forwarded, unmodified apart from hop-by-hop headers, to the
//! first matching origin or to the default one.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::{ProxyServer, ServerHandle};
pub use routing::{Origin, RouteRule, RouteTable, Router};
