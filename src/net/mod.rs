//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop never blocks on workers)
//!     → pool.rs (wait for one of max_threads workers)
//!     → connection.rs (id + open-connection tracking)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded worker pool prevents resource exhaustion
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;
pub mod pool;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::Listener;
pub use pool::WorkerPool;
