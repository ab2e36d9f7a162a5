//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     stop() or signal → Stop accepting → Drain connections → serve() returns
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - Draining has a timeout; stragglers are abandoned

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
