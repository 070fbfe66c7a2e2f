//! API integration tests.
//!
//! These tests verify the complete API flow end-to-end using axum's test utilities.
//! A scripted engine stands in for OpenAI so no network access is needed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use site_chat::api::{create_router_with_state, AppState};
use site_chat::engine::{EngineError, EngineFactory, EngineResult, QueryEngine};
use tower::ServiceExt;

/// Engine whose answers are derived from its input.
///
/// URLs and questions containing "fail" produce errors.
struct ScriptedEngine {
    credential: String,
}

#[async_trait]
impl QueryEngine for ScriptedEngine {
    async fn ingest(&self, url: &str) -> EngineResult<String> {
        if url.contains("fail") {
            return Err(EngineError::Status {
                status: 404,
                url: url.to_string(),
            });
        }
        Ok(format!("Success: indexed 3 passages from {}", url))
    }

    async fn ask(&self, question: &str) -> EngineResult<String> {
        if question.contains("fail") {
            return Err(EngineError::Provider {
                status: 401,
                message: format!("bad key {}", self.credential),
            });
        }
        Ok(format!("Answer: {}", question))
    }
}

struct ScriptedFactory;

impl EngineFactory for ScriptedFactory {
    fn create(&self, credential: &str) -> Arc<dyn QueryEngine> {
        Arc::new(ScriptedEngine {
            credential: credential.to_string(),
        })
    }
}

fn app() -> Router {
    create_router_with_state(AppState::new(Arc::new(ScriptedFactory)))
}

fn app_with_default_key(key: &str) -> Router {
    create_router_with_state(
        AppState::new(Arc::new(ScriptedFactory)).with_default_credential(Some(key)),
    )
}

/// Helper to create a JSON request.
fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Helper to extract body as string.
async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).to_string()
}

/// Helper to extract JSON from response.
async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Send a request and return status plus JSON body.
async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(method, uri, body))
        .await
        .unwrap();
    let status = response.status();
    (status, response_json(response).await)
}

/// Create a session and return its ID.
async fn create_session(app: &Router) -> String {
    let (status, json) = call(app, Method::POST, "/api/v1/sessions", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    json["session_id"].as_str().unwrap().to_string()
}

async fn set_key(app: &Router, id: &str, key: &str) -> Value {
    let (status, json) = call(
        app,
        Method::PUT,
        &format!("/api/v1/sessions/{}/credential", id),
        Some(json!({ "api_key": key })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json
}

async fn transcript(app: &Router, id: &str) -> Value {
    let (status, json) = call(
        app,
        Method::GET,
        &format!("/api/v1/sessions/{}/transcript", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json
}

// ============================================================================
// Page, Health & Info Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let response = app()
        .oneshot(json_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_text(response).await, "OK");
}

#[tokio::test]
async fn test_api_info_endpoint() {
    let (status, json) = call(&app(), Method::GET, "/api/v1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "site-chat");
    assert_eq!(json["status"], "running");
}

#[tokio::test]
async fn test_index_page() {
    let response = app()
        .oneshot(json_request(Method::GET, "/", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    assert!(response_text(response).await.contains("Website to Chatbot"));
}

// ============================================================================
// Session Management Tests
// ============================================================================

#[tokio::test]
async fn test_create_session_without_credential() {
    let app = app();
    let (status, json) = call(&app, Method::POST, "/api/v1/sessions", Some(json!({}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(json["session_id"].is_string());
    assert_eq!(json["state"], "awaiting_credential");
    assert_eq!(json["has_credential"], false);
}

#[tokio::test]
async fn test_create_session_with_default_credential() {
    let app = app_with_default_key("sk-default");
    let (status, json) = call(&app, Method::POST, "/api/v1/sessions", Some(json!({}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["state"], "ready");
    assert_eq!(json["has_credential"], true);
    assert!(!json.to_string().contains("sk-default"));
}

#[tokio::test]
async fn test_create_session_with_explicit_credential() {
    let app = app();
    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(json!({ "api_key": "sk-mine" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["state"], "ready");
}

#[tokio::test]
async fn test_get_session_status() {
    let app = app();
    let id = create_session(&app).await;

    let (status, json) = call(&app, Method::GET, &format!("/api/v1/sessions/{}", id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session_id"], id.as_str());
    assert_eq!(json["transcript_len"], 0);
    assert!(json["idle_seconds"].is_number());
    assert!(json["age_seconds"].is_number());
}

#[tokio::test]
async fn test_get_session_not_found() {
    let app = app();
    let (status, json) = call(
        &app,
        Method::GET,
        "/api/v1/sessions/00000000-0000-4000-8000-000000000000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_session_id_is_not_found() {
    let (status, json) = call(&app(), Method::GET, "/api/v1/sessions/99999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn test_delete_session() {
    let app = app();
    let id = create_session(&app).await;
    let uri = format!("/api/v1/sessions/{}", id);

    let response = app
        .clone()
        .oneshot(json_request(Method::DELETE, &uri, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = app();
    let first = create_session(&app).await;
    let second = create_session(&app).await;
    assert_ne!(first, second);

    set_key(&app, &first, "sk-1").await;
    call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/messages", first),
        Some(json!({ "message": "hello" })),
    )
    .await;

    assert_eq!(transcript(&app, &first).await["count"], 2);
    assert_eq!(transcript(&app, &second).await["count"], 0);
}

// ============================================================================
// Credential Tests
// ============================================================================

#[tokio::test]
async fn test_actions_require_credential() {
    let app = app();
    let id = create_session(&app).await;

    let (status, json) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/ingest", id),
        Some(json!({ "url": "https://example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CREDENTIAL_REQUIRED");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/messages", id),
        Some(json!({ "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(transcript(&app, &id).await["count"], 0);
}

#[tokio::test]
async fn test_set_credential() {
    let app = app();
    let id = create_session(&app).await;

    let json = set_key(&app, &id, "sk-1").await;
    assert_eq!(json["changed"], true);
    assert_eq!(json["state"], "ready");
    assert_eq!(json["has_credential"], true);

    let json = set_key(&app, &id, "sk-1").await;
    assert_eq!(json["changed"], false);

    let json = set_key(&app, &id, "").await;
    assert_eq!(json["changed"], false);
    assert_eq!(json["state"], "ready");
}

#[tokio::test]
async fn test_credential_change_resets_transcript() {
    let app = app();
    let id = create_session(&app).await;
    set_key(&app, &id, "sk-1").await;

    call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/ingest", id),
        Some(json!({ "url": "https://example.com" })),
    )
    .await;
    assert_eq!(transcript(&app, &id).await["count"], 1);

    // Same key keeps the transcript
    set_key(&app, &id, "sk-1").await;
    assert_eq!(transcript(&app, &id).await["count"], 1);

    // New key clears it
    set_key(&app, &id, "sk-2").await;
    assert_eq!(transcript(&app, &id).await["count"], 0);
}

// ============================================================================
// Ingest & Message Tests
// ============================================================================

#[tokio::test]
async fn test_ingest_success() {
    let app = app_with_default_key("sk-default");
    let id = create_session(&app).await;

    let (status, json) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/ingest", id),
        Some(json!({ "url": "https://example.com/docs" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["transcript_len"], 1);
    assert_eq!(json["appended"][0]["role"], "assistant");
    assert_eq!(
        json["appended"][0]["text"],
        "Success: indexed 3 passages from https://example.com/docs"
    );
}

#[tokio::test]
async fn test_ingest_failure_is_shown_in_transcript() {
    let app = app_with_default_key("sk-default");
    let id = create_session(&app).await;

    let (status, json) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/ingest", id),
        Some(json!({ "url": "https://example.com/fail" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["appended"][0]["text"],
        "Error ingesting the URL: HTTP 404 from https://example.com/fail"
    );
}

#[tokio::test]
async fn test_send_message() {
    let app = app_with_default_key("sk-default");
    let id = create_session(&app).await;

    let (status, json) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/messages", id),
        Some(json!({ "message": "What is this?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["transcript_len"], 2);
    assert_eq!(json["appended"][0]["role"], "user");
    assert_eq!(json["appended"][0]["text"], "What is this?");
    assert_eq!(json["appended"][1]["role"], "assistant");
    assert_eq!(json["appended"][1]["text"], "Answer: What is this?");
}

#[tokio::test]
async fn test_send_message_failure_is_shown_in_transcript() {
    let app = app();
    let id = create_session(&app).await;
    set_key(&app, &id, "sk-bad").await;

    let (status, json) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/messages", id),
        Some(json!({ "message": "please fail" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["appended"][0]["text"], "please fail");
    assert_eq!(
        json["appended"][1]["text"],
        "Error processing your request: OpenAI API error (401): bad key sk-bad"
    );
}

#[tokio::test]
async fn test_blank_input_appends_nothing() {
    let app = app_with_default_key("sk-default");
    let id = create_session(&app).await;

    let (status, json) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/messages", id),
        Some(json!({ "message": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["appended"].as_array().unwrap().len(), 0);

    let (_, json) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/ingest", id),
        Some(json!({ "url": "" })),
    )
    .await;
    assert_eq!(json["transcript_len"], 0);
}

#[tokio::test]
async fn test_transcript_order_and_keys() {
    let app = app_with_default_key("sk-default");
    let id = create_session(&app).await;

    call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/ingest", id),
        Some(json!({ "url": "https://example.com" })),
    )
    .await;
    call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/messages", id),
        Some(json!({ "message": "first" })),
    )
    .await;
    call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/messages", id),
        Some(json!({ "message": "second" })),
    )
    .await;

    let json = transcript(&app, &id).await;
    assert_eq!(json["count"], 5);

    let entries = json["entries"].as_array().unwrap();
    let texts: Vec<&str> = entries.iter().map(|e| e["text"].as_str().unwrap()).collect();
    assert_eq!(
        texts,
        vec![
            "Success: indexed 3 passages from https://example.com",
            "first",
            "Answer: first",
            "second",
            "Answer: second",
        ]
    );
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry["key"], i);
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_json_body() {
    let app = app_with_default_key("sk-default");
    let id = create_session(&app).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/sessions/{}/messages", id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not valid json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_missing_field() {
    let app = app_with_default_key("sk-default");
    let id = create_session(&app).await;

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/ingest", id),
        Some(json!({ "link": "https://example.com" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (status, _) = call(&app(), Method::PUT, "/health", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _) = call(&app(), Method::GET, "/api/v1/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
