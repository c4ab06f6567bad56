//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → [routing layer picks the route's pipeline]
//!     → binder.rs (decode + validate parameters)
//!     → [pipeline stages and handler]
//!     → response.rs (error envelope on failure)
//!     → Send to client
//! ```

pub mod binder;
pub mod request;
pub mod response;
pub mod server;

pub use binder::{bind, MAX_BODY_BYTES};
pub use request::{request_id_of, MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use response::{default_error_handler, respond_error, ErrorEnvelope, DEFAULT_ERROR_CODE};
pub use server::{HttpServer, ServerError};
