//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Logging/metrics → Route table → Bind → Serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain connections (bounded) → Exit 0
//! ```
//!
//! # Design Decisions
//! - Ordered startup: signal handlers, config, core, then listener
//! - Any startup failure (including bind) is returned to `main` → non-zero exit

pub mod signals;
pub mod startup;

pub use signals::Signals;
pub use startup::{run, StartupError, StartupOptions};
