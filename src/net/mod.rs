//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Process start
//!     → listener.rs (bind, fatal on failure)
//!     → handed to the HTTP layer, which accepts and spawns per connection
//!
//! Per request:
//!     → connection.rs (in-flight guard held until the exchange ends)
//! ```
//!
//! # Design Decisions
//! - The listening socket is bound once and closed once, at shutdown
//! - Upstream exchanges are counted so leaks are observable

pub mod connection;
pub mod listener;

pub use connection::{InFlightGuard, InFlightTracker};
pub use listener::{bind, ListenerError};
