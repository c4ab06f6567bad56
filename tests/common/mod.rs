//! Shared utilities for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use rand::Rng;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use stage_router::config::ServiceConfig;
use stage_router::pipeline::{AsyncStage, SyncStage};
use stage_router::{HttpServer, RequestContext, Router, Shutdown, StageError};

/// Dispatch one request through the fully layered app.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let app = HttpServer::new(ServiceConfig::default(), router).app();
    send_app(app, request).await
}

pub async fn send_app(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn with_body(method: &str, uri: &str, content_type: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Bind the router on an ephemeral port and serve it until the returned
/// coordinator is triggered.
pub async fn start_server(router: Router) -> (SocketAddr, Arc<Shutdown>) {
    let shutdown = Arc::new(Shutdown::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(ServiceConfig::default(), router);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

fn jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(10..60))
}

/// Async stage storing `key = value` after a random delay, or failing at
/// once with `code` and `message`.
pub fn lookup(
    pass: bool,
    key: &'static str,
    value: impl Into<Value> + Clone + Send + Sync + 'static,
    code: i64,
    message: &'static str,
) -> impl AsyncStage<()> {
    move |ctx: Arc<RequestContext>, cancel: CancellationToken| {
        let value = value.clone();
        async move {
            if !pass {
                return Err(ctx.fail(code, message));
            }
            let delay = jitter();
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    ctx.insert_extra(key, value);
                }
            }
            Ok::<(), StageError>(())
        }
    }
}

pub fn name_stage(pass: bool) -> impl AsyncStage<()> {
    lookup(pass, "name", "Tan", 200, "name err")
}

pub fn age_stage(pass: bool) -> impl AsyncStage<()> {
    lookup(pass, "age", 27, 201, "age err")
}

pub fn address_stage(pass: bool) -> impl AsyncStage<()> {
    lookup(pass, "address", "Black Street No.1", 202, "addr err")
}

/// Sync stage copying `source` from the scratch map into `key`.
pub fn speak(pass: bool, source: &'static str, key: &'static str) -> impl SyncStage<()> {
    move |ctx: Arc<RequestContext>| async move {
        if !pass {
            tokio::time::sleep(jitter()).await;
            return Err(ctx.fail(201, format!("speak out {key} err")));
        }
        if !ctx.has_extra() {
            return Err(ctx.fail(202, "no message to speak"));
        }
        let Some(value) = ctx.extra(source) else {
            return Err(ctx.fail(203, format!("can't find {key} to speak")));
        };
        let spoken = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        ctx.insert_extra(key, format!("speak out {spoken}"));
        Ok::<(), StageError>(())
    }
}

/// Final handler echoing the scratch map.
pub async fn echo_extra(ctx: Arc<RequestContext>) -> axum::Json<Value> {
    axum::Json(serde_json::json!({
        "msg": "asynchronous handle test",
        "data": ctx.extra_snapshot(),
    }))
}
