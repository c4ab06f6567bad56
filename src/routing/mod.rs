//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     Route (path, method, stages, handler)
//!     → router.rs (validate, resolve options, build Pipeline)
//!     → mounted on the Axum router
//!
//! Incoming Request:
//!     → Axum path + method match
//!     → router.rs Endpoint (request ID, execution handle, binder)
//!     → Pipeline::execute
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Each registration owns its pipeline; nothing is shared between routes
//! - Path matching is delegated to Axum

pub mod method;
pub mod route;
pub mod router;

pub use method::Method;
pub use route::Route;
pub use router::{RouteError, Router};
