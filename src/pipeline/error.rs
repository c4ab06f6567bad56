//! Error taxonomy for the request pipeline.
//!
//! # Taxonomy
//! - `BindError`: the parameter could not be decoded, validated, or the
//!   content type is not understood. Raised before any stage runs.
//! - `StageError`: a domain error returned by an async or sync stage.
//! - `ErrorPayload`: what the error handler receives. Exactly four shapes,
//!   matched exhaustively by the responder.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::pipeline::state::PipelineState;
use crate::validation::Violation;

/// Errors produced by the binder collaborator.
#[derive(Debug, Error)]
pub enum BindError {
    /// The request's content type maps to no known tag namespace.
    #[error("unsupported Content-Type:{0}")]
    UnsupportedContentType(String),

    /// The body could not be decoded into the declared shape.
    #[error("failed to decode request parameters: {0}")]
    Decode(String),

    /// Decoding succeeded but one or more field rules failed.
    #[error("{} field violation(s)", violations.len())]
    Invalid {
        /// Raw content type of the request, used to pick field names.
        content_type: String,
        violations: Vec<Violation>,
    },
}

/// Error returned by a pipeline stage.
///
/// A stage that wants a specific response code sets it on the request
/// context (`RequestState::set_error_code`) before returning.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{0}")]
    Message(String),

    #[error("{}", .0.join("; "))]
    List(Vec<String>),

    #[error("{} invalid field(s)", .0.len())]
    Fields(BTreeMap<String, String>),

    /// The execution handle was cancelled before every stage settled.
    #[error("request execution cancelled")]
    Cancelled,

    #[error("stage panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl StageError {
    pub fn msg(message: impl Into<String>) -> Self {
        StageError::Message(message.into())
    }

    /// Wrap any error type.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StageError::Other(Box::new(err))
    }
}

impl From<&str> for StageError {
    fn from(message: &str) -> Self {
        StageError::Message(message.to_string())
    }
}

impl From<String> for StageError {
    fn from(message: String) -> Self {
        StageError::Message(message)
    }
}

/// Payload delivered to the error handler.
#[derive(Debug)]
pub enum ErrorPayload {
    /// Plain message.
    Message(String),
    /// Structured error, rendered through its `Display`.
    Error(StageError),
    /// External field name to message.
    Fields(BTreeMap<String, String>),
    /// List of messages.
    List(Vec<String>),
}

impl ErrorPayload {
    /// Short human-readable form, used in logs.
    pub fn summary(&self) -> String {
        match self {
            ErrorPayload::Message(message) => message.clone(),
            ErrorPayload::Error(err) => err.to_string(),
            ErrorPayload::Fields(fields) => fields
                .iter()
                .map(|(field, message)| format!("{field}: {message}"))
                .collect::<Vec<_>>()
                .join(", "),
            ErrorPayload::List(items) => items.join(", "),
        }
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl Serialize for ErrorPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ErrorPayload::Message(message) => serializer.serialize_str(message),
            ErrorPayload::Error(err) => serializer.collect_str(err),
            ErrorPayload::Fields(fields) => fields.serialize(serializer),
            ErrorPayload::List(items) => items.serialize(serializer),
        }
    }
}

impl From<StageError> for ErrorPayload {
    fn from(err: StageError) -> Self {
        match err {
            StageError::Fields(fields) => ErrorPayload::Fields(fields),
            StageError::List(items) => ErrorPayload::List(items),
            other => ErrorPayload::Error(other),
        }
    }
}

impl From<BindError> for ErrorPayload {
    fn from(err: BindError) -> Self {
        ErrorPayload::Message(err.to_string())
    }
}

/// Terminal failure of one request.
#[derive(Debug)]
pub struct PipelineFailure {
    /// State the pipeline was in when it failed.
    pub state: PipelineState,
    pub payload: ErrorPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serialization_shapes() {
        let message = serde_json::to_value(ErrorPayload::Message("name err".into())).unwrap();
        assert_eq!(message, serde_json::json!("name err"));

        let error = serde_json::to_value(ErrorPayload::Error(StageError::msg("age err"))).unwrap();
        assert_eq!(error, serde_json::json!("age err"));

        let mut fields = BTreeMap::new();
        fields.insert("lin".to_string(), "lin is required".to_string());
        let fields = serde_json::to_value(ErrorPayload::Fields(fields)).unwrap();
        assert_eq!(fields, serde_json::json!({ "lin": "lin is required" }));

        let list = serde_json::to_value(ErrorPayload::List(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(list, serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_stage_error_conversion_keeps_shape() {
        let payload: ErrorPayload = StageError::List(vec!["x".into()]).into();
        assert!(matches!(payload, ErrorPayload::List(ref items) if items.len() == 1));

        let payload: ErrorPayload = StageError::from("boom").into();
        assert!(matches!(payload, ErrorPayload::Error(_)));
        assert_eq!(payload.summary(), "boom");
    }

    #[test]
    fn test_bind_error_message() {
        let err = BindError::UnsupportedContentType("application/msgpack".into());
        assert_eq!(err.to_string(), "unsupported Content-Type:application/msgpack");
    }
}
