// tests/http_gateway.rs
//
// Drives the axum router directly; commands are real POSIX processes.
#![cfg(unix)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use cmdgate::config::ConfigFile;
use cmdgate::exec::ProcessBackend;
use cmdgate::server::build_router;
use cmdgate_test_utils::builders::{ConfigFileBuilder, RouteConfigBuilder};
use cmdgate_test_utils::{dispatcher_with, init_tracing, RecordingSink, ScriptedBackend, Step};

fn gateway(cfg: &ConfigFile) -> (Router, RecordingSink) {
    let (dispatcher, sink) = dispatcher_with(cfg, Arc::new(ProcessBackend));
    (build_router(dispatcher), sink)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec(), request_id)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response body is JSON")
}

#[tokio::test]
async fn test_health_route_runs_echo() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(RouteConfigBuilder::new("GET", "/health").command("echo", &["ok"]).build())
        .build();
    let (router, sink) = gateway(&cfg);

    let (status, body, request_id) = send(&router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["totalCommands"], 1);
    assert_eq!(body["successCount"], 1);
    assert_eq!(body["timedOut"], false);
    assert!(body["durationMs"].is_u64());
    assert!(body["startedAt"].as_str().unwrap().ends_with('Z'));
    assert!(body["finishedAt"].is_string());
    assert!(body.get("commandLogs").is_none());

    let access = sink.access_records();
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].status, 200);
    assert_eq!(access[0].method, "GET");
    assert_eq!(access[0].path, "/health");
    assert_eq!(Some(access[0].request_id.clone()), request_id);
}

#[tokio::test]
async fn test_secure_route_requires_bearer_header() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(
            RouteConfigBuilder::new("POST", "/secure")
                .bearer_header("secret123")
                .command("true", &[])
                .build(),
        )
        .build();
    let (router, sink) = gateway(&cfg);

    let anonymous = Request::builder()
        .method("POST")
        .uri("/secure")
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(&router, anonymous).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.is_empty());

    let authorized = Request::builder()
        .method("POST")
        .uri("/secure")
        .header("Authorization", "Bearer secret123")
        .body(Body::from("{\"ignored\":true}"))
        .unwrap();
    let (status, body, _) = send(&router, authorized).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["successCount"], 1);

    let statuses: Vec<u16> = sink.access_records().iter().map(|a| a.status).collect();
    assert_eq!(statuses, vec![403, 200]);
}

#[tokio::test]
async fn test_query_bearer_route() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(
            RouteConfigBuilder::new("GET", "/x")
                .bearer_query("q")
                .command("true", &[])
                .build(),
        )
        .build();
    let (router, _) = gateway(&cfg);

    let (status, _, _) = send(&router, get("/x?bearer=q")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) = send(&router, get("/x?bearer=wrong")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_second_command_failure_is_counted() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(
            RouteConfigBuilder::new("POST", "/two")
                .shell("echo one")
                .shell("echo two >&2; exit 1")
                .include_logs(true)
                .build(),
        )
        .build();
    let (router, _) = gateway(&cfg);

    let request = Request::builder()
        .method("POST")
        .uri("/two")
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(&router, request).await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["totalCommands"], 2);
    assert_eq!(body["successCount"], 1);

    let logs = body["commandLogs"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["executable"], "sh");
    assert_eq!(logs[0]["arguments"][1], "echo one");
    assert_eq!(logs[0]["stdoutText"], "one\n");
    assert_eq!(logs[1]["stderrText"], "two\n");
    assert!(logs[1]["durationMs"].is_u64());
    assert!(logs[1]["workingDirectory"].is_string());
    // The log view deliberately has no exit code or timestamps.
    assert!(logs[1].get("exitCode").is_none());
    assert!(logs[1].get("startedAt").is_none());
}

#[tokio::test]
async fn test_sleeping_command_times_out() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(
            RouteConfigBuilder::new("GET", "/slow")
                .command("sleep", &["5"])
                .timeout_ms(200)
                .include_logs(true)
                .build(),
        )
        .build();
    let (router, _) = gateway(&cfg);

    let started = std::time::Instant::now();
    let (status, body, _) = send(&router, get("/slow")).await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["timedOut"], true);
    assert_eq!(body["successCount"], 0);
    assert!(body["commandLogs"].as_array().unwrap().len() <= 1);
    assert!(started.elapsed() < std::time::Duration::from_secs(3));
}

#[tokio::test]
async fn test_unregistered_route_is_404_regardless_of_credentials() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(
            RouteConfigBuilder::new("GET", "/health")
                .bearer_header("k")
                .command("true", &[])
                .build(),
        )
        .build();
    let (router, sink) = gateway(&cfg);

    let requests = [
        get("/missing"),
        get("/missing?bearer=k"),
        Request::builder()
            .method("DELETE")
            .uri("/health")
            .header("Authorization", "Bearer k")
            .body(Body::empty())
            .unwrap(),
    ];
    for request in requests {
        let (status, body, _) = send(&router, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }
    assert_eq!(sink.access_records().len(), 3);
}

#[tokio::test]
async fn test_internal_fault_is_500_with_generic_body() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(RouteConfigBuilder::new("GET", "/boom").command("boom", &[]).build())
        .build();
    let backend = ScriptedBackend::new().on("boom", Step::Fault("secret internals".into()));
    let (dispatcher, sink) = dispatcher_with(&cfg, Arc::new(backend));
    let router = build_router(dispatcher);

    let (status, body, _) = send(&router, get("/boom")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body), serde_json::json!({ "error": "Internal Server Error" }));
    assert!(!String::from_utf8_lossy(&body).contains("secret"));
    assert_eq!(sink.access_records()[0].status, 500);
    assert_eq!(sink.fault_count(), 1);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(RouteConfigBuilder::new("GET", "/health").command("true", &[]).build())
        .build();
    let (router, sink) = gateway(&cfg);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let (_, _, request_id) = send(&router, request).await;

    assert_eq!(request_id.as_deref(), Some("abc-123"));
    assert_eq!(sink.access_records()[0].request_id, "abc-123");

    let (_, _, generated) = send(&router, get("/missing")).await;
    let generated = generated.expect("request id header on 404");
    assert!(uuid_like(&generated), "{generated}");
}

fn uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().filter(|c| *c == '-').count() == 4
}

#[tokio::test]
async fn test_concurrent_requests_run_independently() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(
            RouteConfigBuilder::new("GET", "/nap")
                .command("sleep", &["0.3"])
                .build(),
        )
        .build();
    let (router, sink) = gateway(&cfg);

    let started = std::time::Instant::now();
    let (a, b, c) = tokio::join!(
        send(&router, get("/nap")),
        send(&router, get("/nap")),
        send(&router, get("/nap")),
    );

    for (status, body, _) in [a, b, c] {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["successCount"], 1);
    }
    // Three 300ms chains in parallel, not back to back.
    assert!(started.elapsed() < std::time::Duration::from_millis(850));
    assert_eq!(sink.step_count(), 3);
}

#[tokio::test]
async fn test_client_disconnect_still_logs_one_access_record() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(RouteConfigBuilder::new("GET", "/slow").command("slow", &[]).build())
        .build();
    let backend = ScriptedBackend::new().on("slow", Step::Sleep { ms: 300, exit: 0 });
    let (dispatcher, sink) = dispatcher_with(&cfg, Arc::new(backend));
    let router = build_router(dispatcher);

    // The client gives up long before the chain finishes.
    let abandoned =
        tokio::time::timeout(std::time::Duration::from_millis(50), router.oneshot(get("/slow")))
            .await;
    assert!(abandoned.is_err());
    assert!(sink.access_records().is_empty());

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(3);
    while sink.access_records().is_empty() && std::time::Instant::now() < deadline {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    // Give a duplicate write a chance to show up.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let access = sink.access_records();
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].status, 200);
    assert_eq!(access[0].path, "/slow");
    assert_eq!(sink.step_count(), 1);
}

#[tokio::test]
async fn test_access_record_is_written_after_body_is_sent() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_route(RouteConfigBuilder::new("GET", "/health").command("ok", &[]).build())
        .build();
    let (dispatcher, sink) = dispatcher_with(&cfg, Arc::new(ScriptedBackend::new()));
    let router = build_router(dispatcher);

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("content-length"));
    assert!(sink.access_records().is_empty());

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(json(&body)["successCount"], 1);

    let access = sink.access_records();
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].status, 200);
}
