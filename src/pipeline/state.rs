//! Pipeline state machine.
//!
//! ```text
//! Pending → Binding → AsyncPhase → SyncPhase → Handling → Done
//!    │         │          │            │
//!    └─────────┼──────────┘ (no param) │
//!              ▼          ▼            ▼
//!            Failed     Failed       Failed
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Pending,
    Binding,
    AsyncPhase,
    SyncPhase,
    Handling,
    Done,
    Failed,
}

impl PipelineState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Pending, Binding)
                | (Pending, AsyncPhase)
                | (Binding, AsyncPhase)
                | (Binding, Failed)
                | (AsyncPhase, SyncPhase)
                | (AsyncPhase, Failed)
                | (SyncPhase, Handling)
                | (SyncPhase, Failed)
                | (Handling, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Pending => "pending",
            PipelineState::Binding => "binding",
            PipelineState::AsyncPhase => "async_phase",
            PipelineState::SyncPhase => "sync_phase",
            PipelineState::Handling => "handling",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current state of one request and logs each transition.
#[derive(Debug)]
pub(crate) struct StateTracker<'a> {
    route: &'a str,
    request_id: &'a str,
    current: PipelineState,
}

impl<'a> StateTracker<'a> {
    pub(crate) fn new(route: &'a str, request_id: &'a str) -> Self {
        Self {
            route,
            request_id,
            current: PipelineState::Pending,
        }
    }

    pub(crate) fn current(&self) -> PipelineState {
        self.current
    }

    pub(crate) fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal pipeline transition {} -> {}",
            self.current,
            next
        );
        tracing::trace!(
            request_id = %self.request_id,
            route = %self.route,
            from = %self.current,
            to = %next,
            "Pipeline transition"
        );
        self.current = next;
    }
}
