//! Async stage executor.
//!
//! # Responsibilities
//! - Run a route's independent stages concurrently
//! - Return the first error that reaches the collection point
//! - Cancel the execution handle so the remaining stages stop early
//!
//! # Design Decisions
//! - Zero stages: no work. One stage: awaited inline, no task spawned
//! - More stages: one detached task per stage. Every stage runs to
//!   completion; cancellation is only a signal the stage may observe
//! - Outcomes go into a channel sized to the stage count, so a stage that
//!   finishes after the executor returned publishes into nothing instead
//!   of blocking
//! - The executor returns as soon as an error is collected, or when the
//!   handle is cancelled by someone else. An outcome already published
//!   is collected before an observed cancellation
//! - Writes a stage makes to `extra`, before or after observing
//!   cancellation, are kept
//! - A panicking stage counts as a failed stage

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::pipeline::context::RequestContext;
use crate::pipeline::error::StageError;
use crate::pipeline::stage::{catch_panic, AsyncStage};

/// Run `stages` against `ctx`, first error wins.
pub async fn run_async_stages<P>(
    stages: &[Arc<dyn AsyncStage<P>>],
    ctx: &Arc<RequestContext<P>>,
) -> Result<(), StageError>
where
    P: Send + Sync + 'static,
{
    let handle = ctx.execution().clone();

    match stages {
        [] => Ok(()),
        [only] => catch_panic(only.run(Arc::clone(ctx), handle)).await,
        _ => {
            let (tx, mut outcomes) = mpsc::channel(stages.len());
            for stage in stages {
                let stage = Arc::clone(stage);
                let ctx = Arc::clone(ctx);
                let cancel = handle.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = catch_panic(stage.run(ctx, cancel)).await;
                    // The executor may already be gone.
                    let _ = tx.try_send(outcome);
                });
            }
            drop(tx);

            let mut settled = 0usize;
            while settled < stages.len() {
                let outcome = tokio::select! {
                    biased;
                    outcome = outcomes.recv() => outcome,
                    _ = handle.cancelled() => None,
                };
                let Some(outcome) = outcome else {
                    // Someone else cancelled the handle before every stage finished.
                    return Err(StageError::Cancelled);
                };

                if let Err(err) = outcome {
                    handle.cancel();
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        settled,
                        pending = stages.len() - settled - 1,
                        error = %err,
                        "Async stage failed, cancelling siblings"
                    );
                    return Err(err);
                }
                settled += 1;
            }
            Ok(())
        }
    }
}
