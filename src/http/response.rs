//! Error responses.
//!
//! # Responsibilities
//! - Define the `{state, code, msg}` envelope sent for failed requests
//! - Provide the default error handler used when a route sets none
//!
//! # Design Decisions
//! - The envelope is sent with HTTP 200; `code` carries the outcome
//! - A code set on the request state wins over the configured default

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::{ErrorHandler, ErrorPayload, RequestState};

/// Code sent when no stage set one.
pub const DEFAULT_ERROR_CODE: i64 = 402;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    /// Always 0 for failures.
    pub state: i32,
    pub code: i64,
    pub msg: ErrorPayload,
}

impl ErrorEnvelope {
    pub fn new(code: i64, msg: ErrorPayload) -> Self {
        Self { state: 0, code, msg }
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Render `payload` for the request owning `state`.
pub fn respond_error(state: &RequestState, payload: ErrorPayload, default_code: i64) -> Response {
    let code = state.error_code().unwrap_or(default_code);
    ErrorEnvelope::new(code, payload).into_response()
}

/// Error handler emitting an `ErrorEnvelope`, with `default_code` as fallback.
pub fn default_error_handler(default_code: i64) -> ErrorHandler {
    Arc::new(move |state: &RequestState, payload: ErrorPayload| {
        respond_error(state, payload, default_code)
    })
}
