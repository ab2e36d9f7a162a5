//! Minimal embedded HTTP server library.
//!
//! One request per connection: the request is parsed, checked against the
//! method allow-list and passed through an ordered chain of handlers. The
//! REST handler answers `Accept: application/json` requests from a route
//! table built at startup; the resource handler serves files for everything
//! else.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resources;
pub mod routing;
pub mod status;

pub use config::schema::ServerConfig;
pub use error::{BoxError, HandlerError, ServerError, StartupError};
pub use http::{Request, Response, Server};
pub use lifecycle::Shutdown;
pub use routing::{InstanceMode, RestService, RouteRegistry};
