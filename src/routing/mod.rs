//! REST routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteRegistryBuilder::get(path, Service::method)...
//!     → registry.rs (trim paths, reject duplicates)
//!     → instances.rs (construct shared services once)
//!     → Freeze as immutable RouteRegistry
//!
//! Per request (Accept: application/json):
//!     handler.rs (chain entry)
//!     → router.rs (exact path lookup, method check)
//!     → Route::invoke (service instance → serde_json::Value)
//!     → JSON Response
//! ```
//!
//! # Design Decisions
//! - Routes registered explicitly with typed handlers; no runtime discovery
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same path always resolves to the same handler

pub mod handler;
pub mod instances;
pub mod registry;
pub mod router;

pub use handler::RestHandler;
pub use instances::{InstanceCache, InstanceMode, RestService};
pub use registry::{Route, RouteRegistry, RouteRegistryBuilder};
pub use router::RestRouter;
