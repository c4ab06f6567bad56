//! Tests against a served instance over real TCP.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use stage_router::{RequestContext, Route, Router, Shutdown, StageError};

mod common;
use common::{age_stage, echo_extra, name_stage, speak, start_server};

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_profile_over_tcp() {
    let mut router = Router::new();
    router
        .add(
            Route::new("/profile", echo_extra)
                .method("GET")
                .async_stage(name_stage(true))
                .async_stage(age_stage(true))
                .sync_stage(speak(true, "name", "speak-name")),
        )
        .unwrap();
    let (addr, shutdown) = start_server(router).await;

    let res = client()
        .get(format!("http://{addr}/profile"))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["data"],
        json!({"age": 27, "name": "Tan", "speak-name": "speak out Tan"})
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_stages() {
    let shutdown = Arc::new(Shutdown::new());
    let mut router = Router::new().with_client_token(shutdown.token());
    router
        .add(
            Route::new("/slow", echo_extra)
                .method("GET")
                .async_stage(|_ctx: Arc<RequestContext>, cancel: CancellationToken| async move {
                    tokio::select! {
                        _ = cancel.cancelled() => Err(StageError::Cancelled),
                        _ = tokio::time::sleep(Duration::from_secs(10)) => Ok(()),
                    }
                })
                .async_stage(|_ctx: Arc<RequestContext>, cancel: CancellationToken| async move {
                    cancel.cancelled().await;
                    Ok::<(), StageError>(())
                }),
        )
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = stage_router::HttpServer::new(Default::default(), router);
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let request = tokio::spawn(async move {
        client().get(format!("http://{addr}/slow")).send().await
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.trigger();

    let res = tokio::time::timeout(Duration::from_secs(3), request)
        .await
        .expect("request should finish after shutdown")
        .unwrap()
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"code": 402, "msg": "request execution cancelled", "state": 0}));

    tokio::time::timeout(Duration::from_secs(3), handle)
        .await
        .expect("server should drain")
        .unwrap()
        .unwrap();
}
