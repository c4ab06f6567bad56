//! Sync stage chain.
//!
//! Stages run strictly in declaration order; stage *i+1* starts only after
//! stage *i* returned `Ok`. The first error stops the chain. The chain does
//! not check for keys a stage depends on; a missing key is the stage's own
//! error to report.

use std::sync::Arc;

use crate::pipeline::context::RequestContext;
use crate::pipeline::error::StageError;
use crate::pipeline::stage::{catch_panic, SyncStage};

pub async fn run_sync_stages<P>(
    stages: &[Arc<dyn SyncStage<P>>],
    ctx: &Arc<RequestContext<P>>,
) -> Result<(), StageError>
where
    P: Send + Sync + 'static,
{
    for (index, stage) in stages.iter().enumerate() {
        if let Err(err) = catch_panic(stage.run(Arc::clone(ctx))).await {
            tracing::debug!(
                request_id = %ctx.request_id(),
                stage = index,
                error = %err,
                "Sync stage failed"
            );
            return Err(err);
        }
    }
    Ok(())
}
