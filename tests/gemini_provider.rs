//! Gemini Provider Integration Tests
//!
//! Runs the real reqwest-based provider against a local stand-in for the
//! Gemini API so status classification and retries are exercised over HTTP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use pm_agent::core::{Credentials, ProviderConfig};
use pm_agent::{
    AgentError, AgentSettings, BacklogItem, GeminiProvider, ItemType, ModelProvider,
    ModelRequest, ProviderError, RetryPolicy, Strategist,
};

#[derive(Clone)]
struct Fake {
    hits: Arc<AtomicUsize>,
    status: StatusCode,
    body: Value,
}

async fn generate(State(fake): State<Fake>, headers: HeaderMap, Json(_): Json<Value>) -> impl IntoResponse {
    fake.hits.fetch_add(1, Ordering::SeqCst);
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (StatusCode::FORBIDDEN, Json(json!({"error": {"message": "bad key"}})));
    }
    (fake.status, Json(fake.body.clone()))
}

/// Start a fake Gemini server and return its base URL plus a hit counter.
async fn fake_gemini(status: StatusCode, body: Value) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let fake = Fake { hits: Arc::clone(&hits), status, body };
    let app = Router::new()
        .route("/v1beta/models/:call", post(generate))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), hits)
}

fn provider(base_url: &str, key: &str) -> GeminiProvider {
    let config = ProviderConfig { base_url: base_url.to_string(), timeout_secs: 10 };
    GeminiProvider::new(&Credentials::new(key), &config).unwrap()
}

fn request() -> ModelRequest {
    ModelRequest {
        model: "gemini-1.5-flash".to_string(),
        system: "You plan.".to_string(),
        prompt: "Plan this.".to_string(),
    }
}

fn candidate(text: &str) -> Value {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
}

#[tokio::test]
async fn test_successful_generation() {
    let (url, hits) = fake_gemini(StatusCode::OK, candidate("hello")).await;

    let text = provider(&url, "test-key").generate(&request()).await.unwrap();
    assert_eq!(text, "hello");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_429_is_rate_limited() {
    let body = json!({"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}});
    let (url, _) = fake_gemini(StatusCode::TOO_MANY_REQUESTS, body).await;

    let err = provider(&url, "test-key").generate(&request()).await.unwrap_err();
    assert_eq!(err, ProviderError::RateLimited { status: 429, message: "Quota exceeded".into() });
}

#[tokio::test]
async fn test_wrong_key_is_api_error() {
    let (url, _) = fake_gemini(StatusCode::OK, candidate("unused")).await;

    let err = provider(&url, "other-key").generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Api { status: 403, .. }));
    assert!(!err.is_rate_limit());
}

#[tokio::test]
async fn test_no_candidates_is_empty_response() {
    let (url, _) = fake_gemini(StatusCode::OK, json!({"candidates": []})).await;

    let err = provider(&url, "test-key").generate(&request()).await.unwrap_err();
    assert_eq!(err, ProviderError::EmptyResponse);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = provider(&url, "test-key").generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)));
}

#[tokio::test]
async fn test_strategist_retries_real_429_up_to_cap() {
    let (url, hits) = fake_gemini(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"code": 429, "message": "slow down", "status": "RESOURCE_EXHAUSTED"}}),
    )
    .await;

    let retry = RetryPolicy {
        initial_delay: Duration::from_millis(2),
        max_delay: Duration::from_millis(20),
        ..RetryPolicy::strategist()
    };
    let strategist = Strategist::new(
        Arc::new(provider(&url, "test-key")),
        AgentSettings::new("gemini-1.5-flash", retry),
    );
    let items = vec![BacklogItem::new("1", "Setup Auth", "JWT", ItemType::Feature)];

    let err = strategist.plan(&items).await.unwrap_err();
    assert!(matches!(err, AgentError::RateLimitExhausted { attempts: 5, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_strategist_parses_fenced_plan_over_http() {
    let plan = "```json\n{\"items\":[{\"item_id\":\"1\",\"week\":1,\"risk_level\":\"high\"}],\"warnings\":[]}\n```";
    let (url, _) = fake_gemini(StatusCode::OK, candidate(plan)).await;

    let strategist = Strategist::new(
        Arc::new(provider(&url, "test-key")),
        AgentSettings::new("gemini-1.5-flash", RetryPolicy::strategist()),
    );

    let plan = strategist.plan(&[]).await.unwrap();
    assert_eq!(plan.items[0].item_id, "1");
    assert_eq!(plan.items[0].risk_level, pm_agent::RiskLevel::High);
}
