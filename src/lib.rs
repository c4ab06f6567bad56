//! Staged request pipelines on Axum.
//!
//! Each route binds and validates its parameters, runs independent async
//! stages concurrently (first error wins and cancels the rest), runs
//! dependent sync stages in order, and finally calls its handler. Any
//! failure goes to one error handler that renders `{state, code, msg}`.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod routing;
pub mod validation;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{ErrorPayload, RequestContext, RequestState, StageError};
pub use routing::{Route, RouteError, Router};
pub use validation::{FieldSpec, FieldValue, Params, Rule, Validator};
