//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler produces, per request:
//!     → access.rs (one AccessRecord or one ErrorRecord → AccessSink)
//!     → metrics.rs (counters, histograms)
//!
//! Everything else logs through `tracing` directly:
//!     → logging.rs (subscriber: level filter, text or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID on every access record (never forwarded upstream)
//! - Metrics are cheap and exported only when enabled

pub mod access;
pub mod logging;
pub mod metrics;

pub use access::{AccessRecord, AccessSink, ErrorRecord, TracingSink, ACCESS_TARGET};
