//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → initial schema load → background refresh
//!     → resolve resources (or legacy) → listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → server drains, refresh task exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: schema first, then routing, then listeners
//! - The schema refresh loop is owned here and cancelled on shutdown

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, resolve_and_install, Components, StartupError};
