//! Integration tests for the webhook listener HTTP surface.

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use redeployer::api::{AppState, create_router};
use redeployer::queue::{NotificationReceiver, QUEUE_CAPACITY, notification_queue};
use redeployer::server::RemoteAddr;
use redeployer_core::domain::notification::BuildNotification;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use tracing::Span;

fn build_test_app() -> (Router, NotificationReceiver) {
    let (sender, receiver) = notification_queue();
    (create_router(AppState::new(sender, Span::none())), receiver)
}

fn post(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

// ---------------------------------------------------------------------------
// Test: GET / is a health check with an empty body
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_empty_body() {
    let (app, mut receiver) = build_test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());

    receiver.close();
    assert!(receiver.next().await.is_none(), "health check must not enqueue");
}

// ---------------------------------------------------------------------------
// Test: POST / enqueues the decoded notification with permissive headers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notification_is_enqueued() {
    let (app, mut receiver) = build_test_app();

    let response = app
        .oneshot(post(
            r#"{"repository": "acme/app", "docker_url": "registry/app", "docker_tags": ["v42", "v41"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let queued = receiver.next().await.unwrap();
    assert_eq!(queued.notification.docker_url, "registry/app");
    assert_eq!(queued.notification.deploy_tag(), Some("v42"));
}

// ---------------------------------------------------------------------------
// Test: a malformed body is still accepted and enqueued as an empty notification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_body_is_accepted() {
    let (app, mut receiver) = build_test_app();

    let response = app.oneshot(post("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let queued = receiver.next().await.unwrap();
    assert_eq!(queued.notification, BuildNotification::default());
}

// ---------------------------------------------------------------------------
// Test: nulls and wrong-typed fields only affect their own field
// ---------------------------------------------------------------------------

#[tokio::test]
async fn partially_invalid_body_keeps_valid_fields() {
    let (app, mut receiver) = build_test_app();

    let response = app
        .oneshot(post(
            r#"{
                "build_id": 123,
                "trigger_id": null,
                "homepage": null,
                "docker_url": "registry/app",
                "docker_tags": ["v42"]
            }"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let queued = receiver.next().await.unwrap();
    assert_eq!(queued.notification.docker_url, "registry/app");
    assert_eq!(queued.notification.deploy_tag(), Some("v42"));
    assert_eq!(queued.notification.build_id, "");
}

// ---------------------------------------------------------------------------
// Test: bodies larger than axum's default limit are still accepted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn large_body_is_accepted() {
    let (app, mut receiver) = build_test_app();

    let homepage = "x".repeat(3 * 1024 * 1024);
    let body = serde_json::json!({
        "docker_url": "registry/app",
        "docker_tags": ["v42"],
        "homepage": homepage,
    })
    .to_string();

    let response = app.oneshot(post(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let queued = receiver.next().await.unwrap();
    assert_eq!(queued.notification.docker_url, "registry/app");
    assert_eq!(queued.notification.homepage.len(), homepage.len());
}

// ---------------------------------------------------------------------------
// Test: every request gets one access log line, whatever its outcome
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_request_is_logged() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (app, _receiver) = build_test_app();
    let remote: SocketAddr = "10.1.2.3:45678".parse().unwrap();

    for (method, expected) in [
        (Method::GET, StatusCode::OK),
        (Method::POST, StatusCode::OK),
        (Method::PUT, StatusCode::METHOD_NOT_ALLOWED),
    ] {
        let mut request = Request::builder()
            .method(method)
            .uri("/")
            .body(Body::from(r#"{"docker_url": "registry/app"}"#))
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(RemoteAddr(remote)));

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), expected);
    }

    let served: Vec<String> = logs
        .lines()
        .into_iter()
        .filter(|line| line.contains("served http request"))
        .collect();
    assert_eq!(served.len(), 3, "logs: {served:#?}");

    for (line, method, status) in [
        (&served[0], "GET", 200),
        (&served[1], "POST", 200),
        (&served[2], "PUT", 405),
    ] {
        assert!(line.contains(&format!("http_request_method={method}")), "{line}");
        assert!(line.contains("http_request_url=/"), "{line}");
        assert!(line.contains("remote_address=10.1.2.3:45678"), "{line}");
        assert!(line.contains(&format!("status={status}")), "{line}");
        assert!(line.contains("request_duration="), "{line}");
    }
}

// ---------------------------------------------------------------------------
// Test: other methods are rejected with 405
// ---------------------------------------------------------------------------

#[tokio::test]
async fn other_methods_return_405() {
    for method in [Method::PUT, Method::DELETE, Method::PATCH] {
        let (app, _receiver) = build_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method(method.clone())
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{method} should not be allowed"
        );
    }
}

// ---------------------------------------------------------------------------
// Test: with a full queue the next POST waits until the updater takes one
// ---------------------------------------------------------------------------

#[tokio::test]
async fn post_waits_while_queue_is_full() {
    let (app, mut receiver) = build_test_app();

    for _ in 0..QUEUE_CAPACITY {
        let response = app
            .clone()
            .oneshot(post(r#"{"docker_url": "registry/app", "docker_tags": ["v1"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let pending = tokio::spawn(
        app.clone()
            .oneshot(post(r#"{"docker_url": "registry/app", "docker_tags": ["v2"]}"#)),
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!pending.is_finished(), "sixth POST should wait for a free slot");

    receiver.next().await.unwrap();

    let response = tokio::time::timeout(Duration::from_secs(1), pending)
        .await
        .expect("sixth POST should complete once a slot frees up")
        .unwrap()
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
