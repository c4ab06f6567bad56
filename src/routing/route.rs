//! Route descriptors.
//!
//! A `Route` is a plain value until it is handed to the `Router`; building
//! one has no side effects, and cloning one gives an independent descriptor.

use std::fmt;
use std::sync::Arc;

use crate::pipeline::{AsyncStage, ErrorHandler, FinalHandler, SyncStage};
use crate::validation::Params;

/// Path, method, stages and handler of one endpoint.
///
/// `P` is the bound parameter type; `()` means the route binds nothing.
pub struct Route<P = ()> {
    path: String,
    method: String,
    handler: Arc<dyn FinalHandler<P>>,
    async_stages: Vec<Arc<dyn AsyncStage<P>>>,
    sync_stages: Vec<Arc<dyn SyncStage<P>>>,
    error_handler: Option<ErrorHandler>,
    binds: bool,
}

impl Route<()> {
    /// A route without a parameter.
    pub fn new(path: impl Into<String>, handler: impl FinalHandler<()>) -> Self {
        Self::build(path.into(), Arc::new(handler), false)
    }
}

impl<P: Params> Route<P> {
    /// A route whose requests are decoded and validated into `P`.
    pub fn with_param(path: impl Into<String>, handler: impl FinalHandler<P>) -> Self {
        Self::build(path.into(), Arc::new(handler), true)
    }

    fn build(path: String, handler: Arc<dyn FinalHandler<P>>, binds: bool) -> Self {
        Self {
            path,
            method: String::new(),
            handler,
            async_stages: Vec::new(),
            sync_stages: Vec::new(),
            error_handler: None,
            binds,
        }
    }

    /// Method name, parsed at registration. Defaults to POST.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn async_stage(mut self, stage: impl AsyncStage<P>) -> Self {
        self.async_stages.push(Arc::new(stage));
        self
    }

    pub fn sync_stage(mut self, stage: impl SyncStage<P>) -> Self {
        self.sync_stages.push(Arc::new(stage));
        self
    }

    /// Route-level error handler, taking precedence over the router's.
    pub fn error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method_name(&self) -> &str {
        &self.method
    }

    pub fn binds(&self) -> bool {
        self.binds
    }

    pub fn async_stages(&self) -> &[Arc<dyn AsyncStage<P>>] {
        &self.async_stages
    }

    pub fn sync_stages(&self) -> &[Arc<dyn SyncStage<P>>] {
        &self.sync_stages
    }

    pub(crate) fn into_parts(self) -> RouteParts<P> {
        RouteParts {
            handler: self.handler,
            async_stages: self.async_stages,
            sync_stages: self.sync_stages,
            error_handler: self.error_handler,
        }
    }
}

pub(crate) struct RouteParts<P> {
    pub handler: Arc<dyn FinalHandler<P>>,
    pub async_stages: Vec<Arc<dyn AsyncStage<P>>>,
    pub sync_stages: Vec<Arc<dyn SyncStage<P>>>,
    pub error_handler: Option<ErrorHandler>,
}

// Manual impl: stages are shared handles, `P` need not be `Clone`.
impl<P> Clone for Route<P> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            method: self.method.clone(),
            handler: Arc::clone(&self.handler),
            async_stages: self.async_stages.clone(),
            sync_stages: self.sync_stages.clone(),
            error_handler: self.error_handler.clone(),
            binds: self.binds,
        }
    }
}

impl<P> fmt::Debug for Route<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("async_stages", &self.async_stages.len())
            .field("sync_stages", &self.sync_stages.len())
            .field("binds", &self.binds)
            .finish()
    }
}
