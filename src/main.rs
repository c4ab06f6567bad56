//! stage-router demo service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ routing ──▶ binder ──▶ validator
//!                      (layers)      (Endpoint)              │
//!                                                            ▼
//!                                   ┌──────────── pipeline ────────────┐
//!                                   │ async stages (concurrent)        │
//!                                   │   → sync stages (in order)       │
//!                                   │   → final handler                │
//!                                   └───────────────┬──────────────────┘
//!     Client Response                               │ failure
//!     ◀────────────────────────── error handler ◀───┘
//!                                 {state, code, msg}
//! ```
//!
//! Routes:
//! - `GET /profile`: two lookups run concurrently, then two sync stages
//!   speak their results
//! - `POST /users`: a validated sign-up parameter

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use stage_router::config::{load_config, ServiceConfig};
use stage_router::lifecycle::{spawn_signal_listener, Shutdown};
use stage_router::observability::{logging, metrics};
use stage_router::pipeline::SyncStage;
use stage_router::{
    FieldSpec, FieldValue, HttpServer, Params, RequestContext, Route, Router, Rule, StageError,
};

#[derive(Parser, Debug)]
#[command(name = "stage-router", version, about = "Staged request pipeline demo service")]
struct Args {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("stage-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        locale = ?config.pipeline.locale,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let shutdown = Arc::new(Shutdown::new());
    let mut router = Router::from_config(&config.pipeline)?.with_client_token(shutdown.token());
    register_routes(&mut router)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server_shutdown = shutdown.subscribe();
    spawn_signal_listener(Arc::clone(&shutdown));

    HttpServer::new(config, router).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn register_routes(router: &mut Router) -> Result<(), stage_router::RouteError> {
    router.add(
        Route::new("/profile", |ctx: Arc<RequestContext>| async move {
            Json(json!({ "msg": "profile", "data": ctx.extra_snapshot() }))
        })
        .method("GET")
        .async_stage(lookup_name)
        .async_stage(lookup_age)
        .sync_stage(speak("name", "speak-name"))
        .sync_stage(speak("age", "speak-age")),
    )?;

    router.add(Route::with_param(
        "/users",
        |ctx: Arc<RequestContext<SignUp>>| async move {
            let name = ctx.param().map(|p| p.name.clone()).unwrap_or_default();
            Json(json!({ "state": 1, "msg": format!("welcome {name}") }))
        },
    ))?;

    Ok(())
}

async fn lookup_name(ctx: Arc<RequestContext>, cancel: CancellationToken) -> Result<(), StageError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(StageError::Cancelled),
        _ = tokio::time::sleep(Duration::from_millis(20)) => {
            ctx.insert_extra("name", "Tan");
            Ok(())
        }
    }
}

async fn lookup_age(ctx: Arc<RequestContext>, cancel: CancellationToken) -> Result<(), StageError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(StageError::Cancelled),
        _ = tokio::time::sleep(Duration::from_millis(30)) => {
            ctx.insert_extra("age", 27);
            Ok(())
        }
    }
}

/// Sync stage reading `source` from the scratch map and writing `key`.
fn speak(source: &'static str, key: &'static str) -> impl SyncStage<()> {
    move |ctx: Arc<RequestContext>| async move {
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

#[derive(Debug, Deserialize)]
struct SignUp {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    age: i64,
}

impl Params for SignUp {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("name")
            .tags(&[("json", "name"), ("form", "name"), ("err-required", "name is required")])
            .rules(&[Rule::Required]),
        FieldSpec::new("email")
            .tags(&[("json", "email"), ("form", "email")])
            .rules(&[Rule::Required, Rule::Email]),
        FieldSpec::new("age")
            .tags(&[("json", "age"), ("form", "age"), ("err-min", "age must be at least 18")])
            .rules(&[Rule::Min(18.0)]),
    ];

    fn value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "name" => FieldValue::Str(&self.name),
            "email" => FieldValue::Str(&self.email),
            "age" => FieldValue::Int(self.age),
            _ => FieldValue::Missing,
        }
    }
}
