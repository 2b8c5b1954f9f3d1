//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, per-request handler)
//!     → [routing layer decides origin]
//!     → request.rs (strip hop-by-hop headers, re-target URI)
//!     → upstream.rs (pooled client, response-head deadline)
//!     → response.rs (relay head, stream body / gateway error)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use server::{ProxyServer, ServerHandle};
pub use upstream::UpstreamError;
