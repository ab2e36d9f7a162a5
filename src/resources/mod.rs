//! Static resource subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ResourceConfig.dir → catalog.rs (recursive scan, name → file)
//!
//! Per request (anything not asking for JSON):
//!     handler.rs (chain entry)
//!     → resolver.rs (exact match, or default page for shallow paths)
//!     → catalog.rs (read bytes) → mime.rs (content type)
//!     → 200 with Cache-Control, or 404 naming the path
//! ```
//!
//! # Design Decisions
//! - The catalog is built once; files added later are not served
//! - File contents are read per request so edits show up without restart

pub mod catalog;
pub mod handler;
pub mod mime;
pub mod resolver;

pub use catalog::ResourceCatalog;
pub use handler::ResourceHandler;
pub use mime::mime_type;
pub use resolver::StaticResourceResolver;
