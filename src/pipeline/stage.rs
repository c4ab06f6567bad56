//! Stage and handler abstractions.
//!
//! Closures are the usual way to supply a stage; the traits exist so routes
//! can store heterogeneous stages behind `Arc<dyn ...>`.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::pipeline::context::{RequestContext, RequestState};
use crate::pipeline::error::{ErrorPayload, StageError};

/// Future returned by every stage.
pub type StageFuture = BoxFuture<'static, Result<(), StageError>>;

/// Independent stage run concurrently with its siblings.
///
/// The token is the request's execution handle; a stage should check it at
/// its suspension points and return early once it is cancelled.
pub trait AsyncStage<P>: Send + Sync + 'static {
    fn run(&self, ctx: Arc<RequestContext<P>>, cancel: CancellationToken) -> StageFuture;
}

impl<P, F, Fut> AsyncStage<P> for F
where
    F: Fn(Arc<RequestContext<P>>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), StageError>> + Send + 'static,
{
    fn run(&self, ctx: Arc<RequestContext<P>>, cancel: CancellationToken) -> StageFuture {
        self(ctx, cancel).boxed()
    }
}

/// Dependent stage run in declaration order after the async phase.
pub trait SyncStage<P>: Send + Sync + 'static {
    fn run(&self, ctx: Arc<RequestContext<P>>) -> StageFuture;
}

impl<P, F, Fut> SyncStage<P> for F
where
    F: Fn(Arc<RequestContext<P>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), StageError>> + Send + 'static,
{
    fn run(&self, ctx: Arc<RequestContext<P>>) -> StageFuture {
        self(ctx).boxed()
    }
}

/// Business handler invoked once every stage succeeded.
pub trait FinalHandler<P>: Send + Sync + 'static {
    fn call(&self, ctx: Arc<RequestContext<P>>) -> BoxFuture<'static, Response>;
}

impl<P, F, Fut> FinalHandler<P> for F
where
    F: Fn(Arc<RequestContext<P>>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn call(&self, ctx: Arc<RequestContext<P>>) -> BoxFuture<'static, Response> {
        let fut = self(ctx);
        async move { fut.await.into_response() }.boxed()
    }
}

/// Receives the request state and the error payload of a failed request.
pub type ErrorHandler = Arc<dyn Fn(&RequestState, ErrorPayload) -> Response + Send + Sync>;

/// Await a stage, turning a panic into a `StageError::Panicked`.
pub(crate) async fn catch_panic(stage: StageFuture) -> Result<(), StageError> {
    match AssertUnwindSafe(stage).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Err(StageError::Panicked(panic_message(panic))),
    }
}

pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_panic_converts_payload() {
        let stage: StageFuture = async {
            if true {
                panic!("exploded");
            }
            Ok::<(), StageError>(())
        }
        .boxed();
        let err = catch_panic(stage).await.unwrap_err();
        assert!(matches!(err, StageError::Panicked(ref m) if m == "exploded"));
    }

    #[tokio::test]
    async fn test_closure_implements_stage_traits() {
        let sync: Arc<dyn SyncStage<()>> = Arc::new(|ctx: Arc<RequestContext>| async move {
            ctx.insert_extra("seen", true);
            Ok::<(), StageError>(())
        });
        let ctx = Arc::new(RequestContext::new(
            None,
            RequestState::new("r", CancellationToken::new()),
        ));
        sync.run(Arc::clone(&ctx)).await.unwrap();
        assert_eq!(ctx.extra("seen"), Some(serde_json::Value::Bool(true)));
    }
}
