//! HTTP API Integration Tests
//!
//! Drives the axum router end-to-end with a stub model provider.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use pm_agent::core::{AgentsConfig, RetryConfig, ServerConfig};
use pm_agent::server::{router, AppState};
use pm_agent::{Agents, ModelProvider, ProviderError, StubProvider};

/// Default agent config with millisecond backoff so retries run fast.
fn fast_agents_config() -> AgentsConfig {
    let mut config = AgentsConfig::default();
    for agent in [&mut config.groomer, &mut config.analyst, &mut config.strategist] {
        agent.retry = RetryConfig {
            initial_delay_secs: 0.001,
            max_delay_secs: 0.01,
            ..agent.retry.clone()
        };
    }
    config
}

fn app(stub: &Arc<StubProvider>) -> Router {
    let provider: Arc<dyn ModelProvider> = stub.clone();
    let agents = Agents::from_config(provider, &fast_agents_config());
    router(AppState::new(agents), &ServerConfig::default())
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ============================================================================
// Liveness
// ============================================================================

#[tokio::test]
async fn test_root_liveness() {
    let stub = Arc::new(StubProvider::replying("{}"));
    let (status, body) = send(app(&stub), Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Smart PM Agent API is running");
    assert_eq!(stub.calls(), 0);
}

// ============================================================================
// Groom
// ============================================================================

#[tokio::test]
async fn test_groom_end_to_end() {
    let stub = Arc::new(StubProvider::replying(
        r#"{"id":"5","title":"fix it","description":"","type":"bug","quality_score":20,"quality_issues":[{"issue_type":"clarity","suggestion":"add detail"}]}"#,
    ));
    let request = json!({"id": "5", "title": "fix it", "description": "", "type": "bug"});

    let (status, body) = send(app(&stub), Method::POST, "/api/groom", Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "5");
    assert_eq!(body["quality_score"], 20);
    assert_eq!(body["quality_issues"].as_array().unwrap().len(), 1);
    assert_eq!(body["quality_issues"][0]["issue_type"], "clarity");
    assert_eq!(body["status"], "backlog");
}

#[tokio::test]
async fn test_groom_overrides_model_id() {
    let stub = Arc::new(StubProvider::replying(
        r#"{"id":"999","title":"t","description":"d","type":"feature","quality_score":90}"#,
    ));
    let request = json!({"id": "abc", "title": "t", "description": "d", "type": "feature"});

    let (status, body) = send(app(&stub), Method::POST, "/api/groom", Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "abc");
}

#[tokio::test]
async fn test_groom_out_of_range_score_is_500() {
    let stub = Arc::new(StubProvider::replying(
        r#"{"id":"1","title":"t","description":"d","type":"bug","quality_score":101}"#,
    ));
    let request = json!({"id": "1", "title": "t", "description": "d", "type": "bug"});

    let (status, body) = send(app(&stub), Method::POST, "/api/groom", Some(request)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "invalid_response");
    assert!(body["detail"].as_str().unwrap().contains("quality_score"));
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_groom_rejects_invalid_body_without_calling_model() {
    let stub = Arc::new(StubProvider::replying("{}"));
    let request = json!({"id": "1", "title": "t", "description": "d", "type": "epic"});

    let (status, body) = send(app(&stub), Method::POST, "/api/groom", Some(request)).await;

    assert!(status.is_client_error());
    assert_eq!(body["kind"], "invalid_request");
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_groom_rate_limit_exhausted() {
    let stub = Arc::new(StubProvider::failing(ProviderError::RateLimited {
        status: 429,
        message: "quota".into(),
    }));
    let request = json!({"id": "1", "title": "t", "description": "d", "type": "bug"});

    let (status, body) = send(app(&stub), Method::POST, "/api/groom", Some(request)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "rate_limited");
    assert_eq!(stub.calls(), 3);
}

// ============================================================================
// Cluster
// ============================================================================

#[tokio::test]
async fn test_cluster_feedback() {
    let stub = Arc::new(StubProvider::replying(
        r#"[{"theme":"Speed","description":"Slow pages","related_feedback_ids":["f1","f2"],"sentiment_distribution":{"negative":2}}]"#,
    ));
    let request = json!([
        {"id": "f1", "source": "support", "content": "Dashboard is slow"},
        {"id": "f2", "source": "email", "content": "Reports take forever", "sentiment": "negative"}
    ]);

    let (status, body) =
        send(app(&stub), Method::POST, "/api/cluster-feedback", Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["theme"], "Speed");
    assert_eq!(body[0]["related_feedback_ids"], json!(["f1", "f2"]));

    let prompt = &stub.requests()[0].prompt;
    assert!(prompt.contains("ID: f1 | Content: Dashboard is slow | Source: support"));
}

#[tokio::test]
async fn test_cluster_provider_error_is_not_retried() {
    let stub = Arc::new(StubProvider::failing(ProviderError::Api {
        status: 403,
        message: "API key not valid".into(),
    }));

    let (status, body) =
        send(app(&stub), Method::POST, "/api/cluster-feedback", Some(json!([]))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "provider");
    assert!(body["detail"].as_str().unwrap().contains("API key not valid"));
    assert_eq!(stub.calls(), 1);
}

// ============================================================================
// Roadmap
// ============================================================================

#[tokio::test]
async fn test_roadmap_fenced_response() {
    let stub = Arc::new(StubProvider::replying(
        "```json\n{\"items\":[{\"item_id\":\"3\",\"week\":1},{\"item_id\":\"1\",\"week\":2,\"dependencies\":[\"3\"]}],\"warnings\":[]}\n```",
    ));
    let request = json!([
        {"id": "1", "title": "Setup Auth", "description": "JWT", "type": "feature", "status": "todo"},
        {"id": "3", "title": "Database Schema", "description": "", "type": "chore", "status": "todo"}
    ]);

    let (status, body) = send(app(&stub), Method::POST, "/api/roadmap", Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][1]["dependencies"], json!(["3"]));
    assert_eq!(body["items"][0]["risk_level"], "low");
}

#[tokio::test]
async fn test_roadmap_missing_week_fails_without_retry() {
    let stub = Arc::new(StubProvider::replying(r#"{"items":[{"item_id":"1"}],"warnings":[]}"#));

    let (status, body) = send(app(&stub), Method::POST, "/api/roadmap", Some(json!([]))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "invalid_response");
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_roadmap_rate_limit_cap_is_five() {
    let stub = Arc::new(StubProvider::failing(ProviderError::Transport(
        "upstream returned 429 Too Many Requests".into(),
    )));

    let (status, body) = send(app(&stub), Method::POST, "/api/roadmap", Some(json!([]))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "rate_limited");
    assert_eq!(stub.calls(), 5);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let stub = Arc::new(StubProvider::replying(r#"{"items":[],"warnings":[]}"#));
    let app = app(&stub);

    let handles: Vec<_> = (0..4)
        .map(|_| tokio::spawn(send(app.clone(), Method::POST, "/api/roadmap", Some(json!([])))))
        .collect();

    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(stub.calls(), 4);
}
