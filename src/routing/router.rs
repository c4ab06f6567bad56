//! Route registry and dispatch.
//!
//! # Responsibilities
//! - Validate and store route registrations
//! - Build one pipeline per route, resolving router-wide options
//! - Dispatch each request: request ID, execution handle, binding, pipeline
//!
//! # Design Decisions
//! - Options apply to routes registered after they are set
//! - Pipelines are immutable after registration (shared without locks)
//! - Duplicate (method, path) pairs are an error, not a silent override
//! - Router-wide layers wrap each route's handler, never the fallback

use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service};

use crate::config::PipelineConfig;
use crate::http::binder::bind;
use crate::http::request::request_id_of;
use crate::http::response::{default_error_handler, DEFAULT_ERROR_CODE};
use crate::pipeline::{Binding, ErrorHandler, Pipeline, RequestState};
use crate::routing::method::Method;
use crate::routing::route::Route;
use crate::validation::mapper::DEFAULT_TAG_PREFIX;
use crate::validation::{locale::UnsupportedLocale, ErrorMapper, Locale, Params, Validator};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route {method} {path} is already registered")]
    Duplicate { method: Method, path: String },

    #[error("invalid route path '{0}': must start with '/'")]
    InvalidPath(String),

    #[error("unsupported method '{0}'")]
    UnsupportedMethod(String),
}

/// Wraps one route's method router in a router-wide layer.
type RouteLayer = Arc<dyn Fn(MethodRouter) -> MethodRouter + Send + Sync>;

/// Collects routes and mounts them onto an Axum router.
pub struct Router {
    paths: BTreeMap<String, MethodRouter>,
    registered: BTreeSet<(Method, String)>,
    error_handler: ErrorHandler,
    tag_prefix: String,
    validator: Arc<Validator>,
    translate: bool,
    mapper: Arc<ErrorMapper>,
    client_token: Option<CancellationToken>,
    layers: Vec<RouteLayer>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            paths: BTreeMap::new(),
            registered: BTreeSet::new(),
            error_handler: default_error_handler(DEFAULT_ERROR_CODE),
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            validator: Arc::new(Validator::default()),
            translate: false,
            mapper: Arc::new(ErrorMapper::default()),
            client_token: None,
            layers: Vec::new(),
        }
    }

    /// Router configured from the `[pipeline]` section.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, UnsupportedLocale> {
        let mut router = Self::new()
            .with_error_handler(default_error_handler(config.default_error_code))
            .with_err_tag_prefix(&config.err_tag_prefix);
        if let Some(locale) = &config.locale {
            router = router.with_translations(locale.parse()?);
        }
        Ok(router)
    }

    /// Error handler for routes that set none.
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = handler;
        self
    }

    /// Prefix of message override tags; `"err"` gives `err-required`.
    pub fn with_err_tag_prefix(mut self, prefix: &str) -> Self {
        self.tag_prefix = prefix.to_string();
        self.rebuild_mapper();
        self
    }

    /// Parent of every request's execution handle.
    pub fn with_client_token(mut self, token: CancellationToken) -> Self {
        self.client_token = Some(token);
        self
    }

    /// Run `layer` in front of every route registered afterwards.
    ///
    /// Layers run before binding and every stage. The last layer added is
    /// the outermost.
    pub fn with_layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<axum::routing::Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.layers
            .push(Arc::new(move |methods: MethodRouter| methods.route_layer(layer.clone())));
        self
    }

    /// Validate with `validator`; its locale is used only with translations on.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Arc::new(validator);
        self.rebuild_mapper();
        self
    }

    /// Translate messages without an override into `locale`.
    pub fn with_translations(mut self, locale: Locale) -> Self {
        self.validator = Arc::new(Validator::new(locale));
        self.translate = true;
        self.rebuild_mapper();
        self
    }

    fn rebuild_mapper(&mut self) {
        let mapper = ErrorMapper::new(&self.tag_prefix);
        self.mapper = Arc::new(if self.translate {
            mapper.with_translator(Arc::clone(&self.validator))
        } else {
            mapper
        });
    }

    /// Register `route`.
    pub fn add<P: Params>(&mut self, route: Route<P>) -> Result<(), RouteError> {
        let path = route.path().to_string();
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath(path));
        }
        let method: Method = route.method_name().parse()?;
        if !self.registered.insert((method, path.clone())) {
            return Err(RouteError::Duplicate { method, path });
        }

        let binds = route.binds();
        let parts = route.into_parts();
        let (async_count, sync_count) = (parts.async_stages.len(), parts.sync_stages.len());
        let name = format!("{method} {path}");
        let error_handler = parts
            .error_handler
            .unwrap_or_else(|| Arc::clone(&self.error_handler));

        let pipeline = Pipeline::new(name, parts.handler, error_handler, Arc::clone(&self.mapper))
            .with_fields(if binds { P::FIELDS } else { &[] })
            .with_async_stages(parts.async_stages)
            .with_sync_stages(parts.sync_stages);

        let endpoint = Endpoint {
            pipeline: Arc::new(pipeline),
            validator: Arc::clone(&self.validator),
            client_token: self.client_token.clone(),
            binds,
        };

        tracing::debug!(
            method = %method,
            path = %path,
            async_stages = async_count,
            sync_stages = sync_count,
            layers = self.layers.len(),
            "Route registered"
        );

        let handler = move |request: Request| {
            let endpoint = endpoint.clone();
            async move { endpoint.dispatch(request).await }
        };
        let route = self
            .layers
            .iter()
            .fold(MethodRouter::new().on(method.filter(), handler), |route, layer| {
                layer(route)
            });
        let methods = match self.paths.remove(&path) {
            Some(existing) => existing.merge(route),
            None => route,
        };
        self.paths.insert(path, methods);
        Ok(())
    }

    /// Registered (method, path) pairs, in order.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> {
        self.registered.iter().map(|(method, path)| (*method, path.as_str()))
    }

    pub fn into_axum(self) -> axum::Router {
        self.paths
            .into_iter()
            .fold(axum::Router::new(), |app, (path, methods)| app.route(&path, methods))
    }
}

struct Endpoint<P> {
    pipeline: Arc<Pipeline<P>>,
    validator: Arc<Validator>,
    client_token: Option<CancellationToken>,
    binds: bool,
}

impl<P> Clone for Endpoint<P> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            validator: Arc::clone(&self.validator),
            client_token: self.client_token.clone(),
            binds: self.binds,
        }
    }
}

impl<P: Params> Endpoint<P> {
    async fn dispatch(self, request: Request) -> Response {
        let request_id = request_id_of(&request);
        let execution = match &self.client_token {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        // Cancelled when the request future completes or is dropped.
        let _guard = execution.clone().drop_guard();
        let state = RequestState::new(request_id, execution);

        let binding = if self.binds {
            match bind::<P>(request, &self.validator).await {
                Ok(param) => Binding::Bound(param),
                Err(err) => Binding::Rejected(err),
            }
        } else {
            Binding::Unbound
        };

        self.pipeline.execute(binding, state).await
    }
}
