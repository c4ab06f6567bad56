//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount the registered routes onto an Axum app
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Serve on a listener until shutdown is signalled

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::binder::MAX_BODY_BYTES;
use crate::http::request::MakeRequestUuid;
use crate::routing::Router;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the registered pipelines.
pub struct HttpServer {
    app: axum::Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `router`'s routes.
    pub fn new(config: ServiceConfig, router: Router) -> Self {
        let app = Self::build_app(&config, router.into_axum());
        Self { app, config }
    }

    /// Wrap the routes with all middleware layers.
    ///
    /// The request ID is set outermost so the trace span and every
    /// pipeline see the same value.
    #[allow(deprecated)]
    fn build_app(config: &ServiceConfig, routes: axum::Router) -> axum::Router {
        routes
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered app, for in-process dispatch.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
