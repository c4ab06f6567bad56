//! Pipeline orchestrator.
//!
//! # Responsibilities
//! - Sequence binding → async phase → sync phase → final handler
//! - Convert binding rejections into error payloads (via the mapper)
//! - Invoke the resolved error handler exactly once on failure
//!
//! # Design Decisions
//! - `run` stops after the sync phase so callers (and tests) can inspect
//!   the context or the failure; `execute` adds the handler/responder step
//! - The final handler cannot fail the pipeline; it encodes its own errors
//!   into its response
//! - A non-empty violation list that maps to no message is still a failure

use std::sync::Arc;
use std::time::Instant;

use axum::response::Response;

use crate::observability::metrics;
use crate::pipeline::chain::run_sync_stages;
use crate::pipeline::context::{RequestContext, RequestState};
use crate::pipeline::error::{BindError, ErrorPayload, PipelineFailure};
use crate::pipeline::executor::run_async_stages;
use crate::pipeline::stage::{AsyncStage, ErrorHandler, FinalHandler, SyncStage};
use crate::pipeline::state::{PipelineState, StateTracker};
use crate::validation::{ErrorMapper, FieldSpec, MapError};

/// Message used when violations exist but none resolved to a field.
pub const UNMAPPED_VIOLATIONS: &str = "request parameters failed validation";

/// Output of the binder for one request.
#[derive(Debug)]
pub enum Binding<P> {
    /// The route declares no parameter.
    Unbound,
    Bound(P),
    Rejected(BindError),
}

/// Result of running every phase before the final handler.
#[derive(Debug)]
pub enum Outcome<P> {
    Ready(Arc<RequestContext<P>>),
    Failed {
        ctx: Arc<RequestContext<P>>,
        failure: PipelineFailure,
    },
}

/// Everything needed to process requests for one route.
///
/// Built once at registration and shared read-only by every request.
pub struct Pipeline<P> {
    name: String,
    fields: &'static [FieldSpec],
    async_stages: Vec<Arc<dyn AsyncStage<P>>>,
    sync_stages: Vec<Arc<dyn SyncStage<P>>>,
    handler: Arc<dyn FinalHandler<P>>,
    error_handler: ErrorHandler,
    mapper: Arc<ErrorMapper>,
}

impl<P> Pipeline<P>
where
    P: Send + Sync + 'static,
{
    pub fn new(
        name: impl Into<String>,
        handler: Arc<dyn FinalHandler<P>>,
        error_handler: ErrorHandler,
        mapper: Arc<ErrorMapper>,
    ) -> Self {
        Self {
            name: name.into(),
            fields: &[],
            async_stages: Vec::new(),
            sync_stages: Vec::new(),
            handler,
            error_handler,
            mapper,
        }
    }

    /// Declared fields of the bound parameter, used to map violations.
    pub fn with_fields(mut self, fields: &'static [FieldSpec]) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_async_stages(mut self, stages: Vec<Arc<dyn AsyncStage<P>>>) -> Self {
        self.async_stages = stages;
        self
    }

    pub fn with_sync_stages(mut self, stages: Vec<Arc<dyn SyncStage<P>>>) -> Self {
        self.sync_stages = stages;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run every phase and produce the response.
    pub async fn execute(&self, binding: Binding<P>, state: RequestState) -> Response {
        let start = Instant::now();

        match self.run(binding, state).await {
            Outcome::Ready(ctx) => {
                let response = self.handler.call(Arc::clone(&ctx)).await;
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    route = %self.name,
                    state = %PipelineState::Done,
                    "Request handled"
                );
                metrics::record_request(&self.name, PipelineState::Done, start);
                response
            }
            Outcome::Failed { ctx, failure } => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    route = %self.name,
                    state = %failure.state,
                    code = ?ctx.error_code(),
                    error = %failure.payload,
                    "Request failed"
                );
                metrics::record_stage_failure(&self.name, failure.state);
                metrics::record_request(&self.name, PipelineState::Failed, start);
                (self.error_handler)(ctx.state(), failure.payload)
            }
        }
    }

    /// Run binding and both stage phases, stopping before the handler.
    pub async fn run(&self, binding: Binding<P>, state: RequestState) -> Outcome<P> {
        let request_id = state.request_id().to_string();
        let mut tracker = StateTracker::new(&self.name, &request_id);

        let param = match binding {
            Binding::Unbound => None,
            Binding::Bound(param) => {
                tracker.advance(PipelineState::Binding);
                Some(param)
            }
            Binding::Rejected(err) => {
                tracker.advance(PipelineState::Binding);
                let payload = self.rejection_payload(err);
                return self.fail(&mut tracker, Arc::new(RequestContext::new(None, state)), payload);
            }
        };

        let ctx = Arc::new(RequestContext::new(param, state));

        tracker.advance(PipelineState::AsyncPhase);
        if let Err(err) = run_async_stages(&self.async_stages, &ctx).await {
            return self.fail(&mut tracker, ctx, err.into());
        }

        tracker.advance(PipelineState::SyncPhase);
        if let Err(err) = run_sync_stages(&self.sync_stages, &ctx).await {
            return self.fail(&mut tracker, ctx, err.into());
        }

        tracker.advance(PipelineState::Handling);
        Outcome::Ready(ctx)
    }

    fn fail(
        &self,
        tracker: &mut StateTracker<'_>,
        ctx: Arc<RequestContext<P>>,
        payload: ErrorPayload,
    ) -> Outcome<P> {
        let state = tracker.current();
        tracker.advance(PipelineState::Failed);
        Outcome::Failed {
            ctx,
            failure: PipelineFailure { state, payload },
        }
    }

    fn rejection_payload(&self, err: BindError) -> ErrorPayload {
        match err {
            BindError::Invalid {
                content_type,
                violations,
            } => match self.mapper.map(self.fields, &violations, &content_type) {
                Ok(messages) if !messages.is_empty() => ErrorPayload::Fields(messages),
                Ok(_) => ErrorPayload::Message(UNMAPPED_VIOLATIONS.to_string()),
                Err(err @ MapError::UnsupportedContentType(_)) => {
                    ErrorPayload::Message(err.to_string())
                }
            },
            other => other.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::default_error_handler;
    use crate::pipeline::error::StageError;
    use crate::validation::{Rule, Violation};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    const FIELDS: &[FieldSpec] = &[FieldSpec::new("name")
        .tags(&[("json", "name"), ("err-required", "name is required")])
        .rules(&[Rule::Required])];

    fn state() -> RequestState {
        RequestState::new("req-test", CancellationToken::new())
    }

    fn pipeline(handled: Arc<AtomicUsize>) -> Pipeline<String> {
        let handler: Arc<dyn FinalHandler<String>> =
            Arc::new(move |_ctx: Arc<RequestContext<String>>| {
                let handled = Arc::clone(&handled);
                async move {
                    handled.fetch_add(1, Ordering::SeqCst);
                    "ok"
                }
            });
        Pipeline::new(
            "POST /test",
            handler,
            default_error_handler(402),
            Arc::new(ErrorMapper::default()),
        )
        .with_fields(FIELDS)
    }

    #[tokio::test]
    async fn test_bound_param_reaches_stages() {
        let handled = Arc::new(AtomicUsize::new(0));
        let sync: Arc<dyn SyncStage<String>> = Arc::new(|ctx: Arc<RequestContext<String>>| async move {
            let name = ctx.param().cloned().unwrap_or_default();
            ctx.insert_extra("greeting", format!("hello {name}"));
            Ok::<(), StageError>(())
        });
        let pipeline = pipeline(Arc::clone(&handled)).with_sync_stages(vec![sync]);

        match pipeline.run(Binding::Bound("Tan".to_string()), state()).await {
            Outcome::Ready(ctx) => {
                assert_eq!(ctx.extra("greeting"), Some("hello Tan".into()));
            }
            Outcome::Failed { failure, .. } => panic!("unexpected failure: {failure:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejection_fails_at_binding_without_stages() {
        let handled = Arc::new(AtomicUsize::new(0));
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_in_stage = Arc::clone(&ran);
        let stage: Arc<dyn AsyncStage<String>> =
            Arc::new(move |_ctx: Arc<RequestContext<String>>, _c: CancellationToken| {
                let ran = Arc::clone(&ran_in_stage);
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), StageError>(())
                }
            });
        let pipeline = pipeline(Arc::clone(&handled)).with_async_stages(vec![stage]);

        let binding = Binding::Rejected(BindError::UnsupportedContentType("image/png".into()));
        let response = pipeline.execute(binding, state()).await;

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(handled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_violations_become_field_messages() {
        let pipeline = pipeline(Arc::new(AtomicUsize::new(0)));
        let binding = Binding::Rejected(BindError::Invalid {
            content_type: "application/json".into(),
            violations: vec![Violation::new("name", "required")],
        });

        match pipeline.run(binding, state()).await {
            Outcome::Failed { failure, ctx } => {
                assert_eq!(failure.state, PipelineState::Binding);
                assert!(ctx.param().is_none());
                match failure.payload {
                    ErrorPayload::Fields(fields) => assert_eq!(fields["name"], "name is required"),
                    other => panic!("unexpected payload: {other:?}"),
                }
            }
            Outcome::Ready(_) => panic!("binding rejection must fail"),
        }
    }

    #[tokio::test]
    async fn test_unmapped_violations_still_fail() {
        let pipeline = pipeline(Arc::new(AtomicUsize::new(0)));
        let binding = Binding::Rejected(BindError::Invalid {
            content_type: "application/json".into(),
            violations: vec![Violation::new("ghost", "required")],
        });

        match pipeline.run(binding, state()).await {
            Outcome::Failed { failure, .. } => {
                assert!(matches!(failure.payload, ErrorPayload::Message(ref m) if m == UNMAPPED_VIOLATIONS));
            }
            Outcome::Ready(_) => panic!("violations must not pass silently"),
        }
    }

    #[tokio::test]
    async fn test_handler_runs_exactly_once() {
        let handled = Arc::new(AtomicUsize::new(0));
        let pipeline = pipeline(Arc::clone(&handled));
        let _ = pipeline.execute(Binding::Unbound, state()).await;
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }
}
