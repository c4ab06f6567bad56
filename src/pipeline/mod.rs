//! Request pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Binding<P> (from the binder)
//!     → orchestrator.rs (state machine, error payloads)
//!         → executor.rs (async stages, concurrent, first error wins)
//!         → chain.rs (sync stages, declaration order, first error stops)
//!     → FinalHandler (success) or ErrorHandler (failure), exactly one
//!
//! Shared per request:
//!     context.rs (param, extra, error code, execution handle)
//! ```
//!
//! # Design Decisions
//! - Stage lists are fixed at registration; nothing is added per request
//! - Errors never aggregate across phases; one failure ends the request
//! - No retries anywhere in the pipeline

pub mod chain;
pub mod context;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod stage;
pub mod state;

pub use context::{Extra, RequestContext, RequestState};
pub use error::{BindError, ErrorPayload, PipelineFailure, StageError};
pub use orchestrator::{Binding, Outcome, Pipeline};
pub use stage::{AsyncStage, ErrorHandler, FinalHandler, StageFuture, SyncStage};
pub use state::PipelineState;
