//! End-to-end tests for the HTTP surface
//!
//! Requests go through the full router with an in-memory mail transport and
//! a temporary template directory. No SMTP server or network is needed.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use lettre::Message;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use templated_mailer::config::{ApiConfig, MailConfig, MailTransportKind, Settings, TemplateConfig};
use templated_mailer::mail::{DispatchError, MailTransport, MemoryMailTransport};
use templated_mailer::ratelimit::RateLimitConfig;
use templated_mailer::server::{create_app, AppState};

const API_KEY: &str = "test-secret";

struct TestApp {
    _templates: TempDir,
    router: Router,
    state: AppState,
}

/// Transport that refuses every message
struct FailingTransport;

#[async_trait]
impl MailTransport for FailingTransport {
    async fn send(&self, _message: Message) -> Result<(), DispatchError> {
        Err(DispatchError::Transport("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn settings(templates: &TempDir, max_requests: u32) -> Settings {
    Settings {
        api: ApiConfig {
            key: Some(API_KEY.to_string()),
            ..Default::default()
        },
        rate_limit: RateLimitConfig {
            max_requests,
            ..Default::default()
        },
        templates: TemplateConfig {
            dir: templates.path().to_string_lossy().into_owned(),
            ..Default::default()
        },
        mail: MailConfig {
            transport: MailTransportKind::Memory,
            from_address: Some("noreply@example.com".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn build_app(max_requests: u32, transport: Arc<dyn MailTransport>) -> TestApp {
    let templates = tempfile::tempdir().unwrap();
    std::fs::write(
        templates.path().join("welcome.hbs"),
        "<h1>Welcome, {{name}}!</h1>",
    )
    .unwrap();

    let state = AppState::with_transport(settings(&templates, max_requests), transport).unwrap();
    let router = create_app(state.clone())
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

    TestApp {
        _templates: templates,
        router,
        state,
    }
}

fn send_request(key: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/send-email")
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn welcome_body() -> Value {
    json!({
        "to": "ada@example.com",
        "subject": "Welcome aboard",
        "template": "welcome",
        "variables": { "name": "Ada" }
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_reports_running() {
    let app = build_app(10, Arc::new(MemoryMailTransport::new()));

    let response = app
        .router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "Email API running" }));
}

#[tokio::test]
async fn test_send_email_delivers_rendered_template() {
    let transport = Arc::new(MemoryMailTransport::new());
    let app = build_app(10, transport.clone());

    let response = app
        .router
        .oneshot(send_request(Some(API_KEY), welcome_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["X-RateLimit-Limit"], "10");
    assert_eq!(response.headers()["X-RateLimit-Remaining"], "9");

    let body = json_body(response).await;
    assert_eq!(body["message"], "Email sent");
    let message_id = body["messageId"].as_str().unwrap();
    assert!(message_id.ends_with("@example.com>"));

    let sent = transport.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["ada@example.com".to_string()]);
    assert!(sent[0].raw.contains("Welcome, Ada!"));
    assert!(sent[0].raw.contains(message_id));
}

#[tokio::test]
async fn test_missing_or_wrong_key_is_unauthorized() {
    let transport = Arc::new(MemoryMailTransport::new());
    let app = build_app(10, transport.clone());

    for key in [None, Some("wrong")] {
        let response = app
            .router
            .clone()
            .oneshot(send_request(key, welcome_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({ "error": "Unauthorized" }));
    }

    // Rejected callers never reach the limiter
    assert_eq!(app.state.rate_limiter.tracked_clients(), 0);
    assert!(transport.sent().await.is_empty());
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let app = build_app(2, Arc::new(MemoryMailTransport::new()));

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(send_request(Some(API_KEY), welcome_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .router
        .clone()
        .oneshot(send_request(Some(API_KEY), welcome_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    assert_eq!(response.headers()["X-RateLimit-Remaining"], "0");
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Too many requests, please try again later" })
    );
}

#[tokio::test]
async fn test_invalid_body_lists_every_problem() {
    let transport = Arc::new(MemoryMailTransport::new());
    let app = build_app(10, transport.clone());

    let response = app
        .router
        .oneshot(send_request(
            Some(API_KEY),
            json!({ "to": "not-an-email", "subject": "Hi", "template": "welcome" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");

    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["field"], "to");
    assert_eq!(details[0]["message"], "\"to\" must be a valid email");
    assert_eq!(details[1]["field"], "subject");
    assert!(transport.sent().await.is_empty());
}

#[tokio::test]
async fn test_unsendable_recipient_is_bad_request() {
    let transport = Arc::new(MemoryMailTransport::new());
    let app = build_app(10, transport.clone());

    for to in ["a.@b.com", "a..b@c.com", "a@[127.0.0.1]", "a@localhost"] {
        let mut body = welcome_body();
        body["to"] = json!(to);

        let response = app
            .router
            .clone()
            .oneshot(send_request(Some(API_KEY), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{to}");
        let body = json_body(response).await;
        assert_eq!(
            body["details"],
            json!([{ "field": "to", "message": "\"to\" must be a valid email" }])
        );
    }
    assert!(transport.sent().await.is_empty());
}

#[tokio::test]
async fn test_empty_body_reports_required_fields() {
    let app = build_app(10, Arc::new(MemoryMailTransport::new()));

    let request = Request::builder()
        .method("POST")
        .uri("/send-email")
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["to", "subject", "template"]);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = build_app(10, Arc::new(MemoryMailTransport::new()));

    let request = Request::builder()
        .method("POST")
        .uri("/send-email")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn test_unknown_template_is_server_error() {
    let transport = Arc::new(MemoryMailTransport::new());
    let app = build_app(10, transport.clone());

    let mut body = welcome_body();
    body["template"] = json!("does-not-exist");

    let response = app
        .router
        .oneshot(send_request(Some(API_KEY), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Failed to send email: "));
    assert!(error.contains("not found"));
    assert!(transport.sent().await.is_empty());
}

#[tokio::test]
async fn test_template_path_traversal_is_rejected() {
    let app = build_app(10, Arc::new(MemoryMailTransport::new()));

    let mut body = welcome_body();
    body["template"] = json!("../secrets");

    let response = app
        .router
        .oneshot(send_request(Some(API_KEY), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_transport_failure_is_server_error() {
    let app = build_app(10, Arc::new(FailingTransport));

    let response = app
        .router
        .oneshot(send_request(Some(API_KEY), welcome_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to send email: connection refused");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_counters() {
    let app = build_app(10, Arc::new(MemoryMailTransport::new()));

    let response = app
        .router
        .clone()
        .oneshot(send_request(Some(API_KEY), welcome_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("mailer_requests_total"));
    assert!(text.contains("mailer_ratelimit_tracked_clients"));
    assert!(text.contains("mailer_ratelimit_enabled 1"));
    assert!(text.contains("mailer_ratelimit_max_requests 10"));
}
