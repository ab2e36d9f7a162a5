//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (from the worker pool)
//!     → request.rs (parse request line + headers, assign request ID)
//!     → server.rs (method allow-list, 405 short-circuit)
//!     → chain.rs (every applicable handler, in configured order)
//!     → response.rs (status line, headers, body onto the wire)
//!     → Connection closed
//! ```
//!
//! # Design Decisions
//! - One request per connection; no keep-alive
//! - Request and output sink are passed explicitly, never held in globals
//! - Read and write each have their own deadline

pub mod chain;
pub mod request;
pub mod response;
pub mod server;

pub use chain::{HandlerChain, HandlerFuture, RequestHandler};
pub use request::{Request, RequestId};
pub use response::{Response, ResponseWriter, Status};
pub use server::Server;
