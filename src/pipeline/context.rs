//! Per-request shared state.
//!
//! # Responsibilities
//! - Hold the bound parameter (written once, before any stage runs)
//! - Hold the `extra` scratch map and the error code override
//! - Carry the cancellable execution handle for the request
//!
//! # Design Decisions
//! - One mutex per request guards both `extra` and the error code, so a
//!   read-modify-write of either is atomic as a unit
//! - `extra` is created lazily on first write
//! - The lock is never held across an await point
//! - A poisoned lock is recovered rather than propagated; the map is only
//!   ever mutated through whole-value inserts

use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::pipeline::error::StageError;

/// Scratch map shared between stages.
pub type Extra = Map<String, Value>;

#[derive(Debug, Default)]
struct Shared {
    extra: Option<Extra>,
    error_code: Option<i64>,
}

/// Parameter-independent part of a request context.
///
/// Error handlers receive this view; stages reach it through `Deref` on
/// [`RequestContext`].
#[derive(Debug)]
pub struct RequestState {
    request_id: String,
    execution: CancellationToken,
    shared: Mutex<Shared>,
}

impl RequestState {
    pub fn new(request_id: impl Into<String>, execution: CancellationToken) -> Self {
        Self {
            request_id: request_id.into(),
            execution,
            shared: Mutex::new(Shared::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The execution handle. Cancelled when the async phase loses a stage,
    /// when the client goes away, or when the parent token is cancelled.
    pub fn execution(&self) -> &CancellationToken {
        &self.execution
    }

    pub fn is_cancelled(&self) -> bool {
        self.execution.is_cancelled()
    }

    /// Insert a value into `extra`, creating the map if needed.
    pub fn insert_extra(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.with_extra(|extra| extra.insert(key.into(), value.into()))
    }

    /// Clone a value out of `extra`.
    pub fn extra(&self, key: &str) -> Option<Value> {
        self.lock().extra.as_ref().and_then(|extra| extra.get(key).cloned())
    }

    /// Whether any stage has written to `extra` yet.
    pub fn has_extra(&self) -> bool {
        self.lock().extra.is_some()
    }

    /// Run `f` against `extra` under the lock, creating the map if needed.
    pub fn with_extra<R>(&self, f: impl FnOnce(&mut Extra) -> R) -> R {
        let mut shared = self.lock();
        f(shared.extra.get_or_insert_with(Extra::new))
    }

    /// Run `f` against `extra` under the lock without creating it.
    pub fn read_extra<R>(&self, f: impl FnOnce(Option<&Extra>) -> R) -> R {
        let shared = self.lock();
        f(shared.extra.as_ref())
    }

    /// Copy of `extra` (empty when never written).
    pub fn extra_snapshot(&self) -> Extra {
        self.lock().extra.clone().unwrap_or_default()
    }

    pub fn set_error_code(&self, code: i64) {
        self.lock().error_code = Some(code);
    }

    pub fn error_code(&self) -> Option<i64> {
        self.lock().error_code
    }

    /// Set the response code override and build the error to return.
    pub fn fail(&self, code: i64, err: impl Into<StageError>) -> StageError {
        self.set_error_code(code);
        err.into()
    }
}

/// Shared state of one request, passed to every stage and the final handler.
#[derive(Debug)]
pub struct RequestContext<P = ()> {
    param: Option<P>,
    state: RequestState,
}

impl<P> RequestContext<P> {
    /// The parameter is fixed here and cannot be replaced afterwards.
    pub fn new(param: Option<P>, state: RequestState) -> Self {
        Self { param, state }
    }

    /// The bound parameter, `None` when the route declares none.
    pub fn param(&self) -> Option<&P> {
        self.param.as_ref()
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }
}

impl<P> Deref for RequestContext<P> {
    type Target = RequestState;

    fn deref(&self) -> &RequestState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn state() -> RequestState {
        RequestState::new("req-1", CancellationToken::new())
    }

    #[test]
    fn test_extra_is_lazy() {
        let state = state();
        assert!(!state.has_extra());
        assert!(state.extra("name").is_none());
        assert!(state.extra_snapshot().is_empty());

        state.insert_extra("name", "Tan");
        assert!(state.has_extra());
        assert_eq!(state.extra("name"), Some(Value::from("Tan")));
    }

    #[test]
    fn test_read_extra_does_not_create_map() {
        let state = state();
        let present = state.read_extra(|extra| extra.is_some());
        assert!(!present);
        assert!(!state.has_extra());
    }

    #[test]
    fn test_fail_sets_code() {
        let state = state();
        assert_eq!(state.error_code(), None);

        let err = state.fail(200, "name err");
        assert_eq!(state.error_code(), Some(200));
        assert_eq!(err.to_string(), "name err");
    }

    #[test]
    fn test_param_and_deref() {
        let ctx = RequestContext::new(Some(7u32), state());
        assert_eq!(ctx.param(), Some(&7));
        assert_eq!(ctx.request_id(), "req-1");

        let empty: RequestContext = RequestContext::new(None, state());
        assert!(empty.param().is_none());
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_updates() {
        let ctx = Arc::new(RequestContext::<()>::new(None, state()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ctx = Arc::clone(&ctx);
                std::thread::spawn(move || {
                    for j in 0..100 {
                        ctx.insert_extra(format!("k{i}-{j}"), j);
                        ctx.with_extra(|extra| {
                            let count = extra.get("count").and_then(Value::as_i64).unwrap_or(0);
                            extra.insert("count".into(), Value::from(count + 1));
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = ctx.extra_snapshot();
        assert_eq!(snapshot.len(), 8 * 100 + 1);
        assert_eq!(snapshot["count"], Value::from(800));
    }
}
