//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered rule scan)
//!     → matcher.rs (literal prefix check)
//!     → Return: ProxyDecision (target origin + forwarded path)
//!
//! Route Compilation (at startup):
//!     RouteConfig[] + default_target
//!     → origin.rs (parse every target)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order), default origin otherwise

pub mod matcher;
pub mod origin;
pub mod router;

pub use origin::{Origin, OriginError};
pub use router::{ProxyDecision, RouteRule, RouteTable, Router, DEFAULT_ROUTE};
