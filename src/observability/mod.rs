//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with request_id / connection_id fields
//!     → logging.rs (filter + fmt subscriber)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Level comes from RUST_LOG, else from config

pub mod logging;
