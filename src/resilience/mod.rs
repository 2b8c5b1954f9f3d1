//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to origin:
//!     → timeouts.rs (connect deadline, response-head deadline)
//! Response body to client:
//!     → timeouts.rs (idle deadline between chunks)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries and no circuit breaking: a failed attempt is reported once
//!   and the request ends

pub mod timeouts;

pub use timeouts::{with_idle_timeout, BoxError, Deadlines, IdleTimeout};
