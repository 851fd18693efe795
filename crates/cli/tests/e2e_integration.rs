//! End-to-end integration tests for Parley.
//!
//! These tests run the whole pipeline from a user action to the recorded
//! transcript: session engine → Gemini provider over real HTTP → a local
//! stand-in for the Gemini API, and the gateway router on top.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use parley_config::AppConfig;
use parley_core::error::ProviderError;
use parley_core::provider::{GenerationRequest, Provider, ProviderReply};
use parley_core::session::{SessionId, SessionStore};
use parley_core::transcript::Transcript;
use parley_core::turn::{Role, Turn};
use parley_engine::SessionEngine;
use parley_gateway::{GatewayState, build_router};
use parley_sessions::InMemorySessionStore;

// ── Mock Gemini API ──────────────────────────────────────────────────────

/// Canned `(status, body)` answers served in order, plus every request
/// body received.
#[derive(Default)]
struct MockGemini {
    answers: Mutex<VecDeque<(StatusCode, Value)>>,
    requests: Mutex<Vec<Value>>,
}

impl MockGemini {
    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

fn text_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3},
        "modelVersion": "gemini-2.5-pro"
    })
}

/// Start the mock on a random local port; returns its base URL.
async fn spawn_gemini(answers: Vec<(StatusCode, Value)>) -> (String, Arc<MockGemini>) {
    let mock = Arc::new(MockGemini {
        answers: Mutex::new(answers.into()),
        requests: Mutex::default(),
    });

    let app = Router::new()
        .fallback(|State(mock): State<Arc<MockGemini>>, payload: String| async move {
            mock.requests
                .lock()
                .unwrap()
                .push(serde_json::from_str(&payload).unwrap_or(Value::Null));
            let (status, body) = mock
                .answers
                .lock()
                .unwrap()
                .pop_front()
                .expect("mock Gemini received more requests than scripted");
            (status, axum::Json(body)).into_response()
        })
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), mock)
}

fn config_for(base_url: &str) -> AppConfig {
    let mut config = AppConfig {
        api_key: Some("test-key".into()),
        ..AppConfig::default()
    };
    config.provider.base_url = base_url.into();
    config.provider.request_timeout_secs = 5;
    config
}

fn engine_for(config: &AppConfig) -> SessionEngine {
    let provider = parley_providers::build_from_config(config).unwrap();
    SessionEngine::from_config(config, provider)
}

fn roles_and_contents(t: &Transcript) -> Vec<(Role, &str)> {
    t.iter().map(|turn| (turn.role(), turn.content())).collect()
}

// ── E2E: Engine over Gemini ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_reply_is_recorded_and_prompt_carries_context() {
    let (base, mock) = spawn_gemini(vec![(StatusCode::OK, text_body("  I'm well\n"))]).await;
    let engine = engine_for(&config_for(&base));

    let mut transcript = engine.new_transcript();
    transcript.append(Turn::user("Hi"));
    transcript.append(Turn::assistant("Hello"));

    engine.send_message(&mut transcript, "How are you?").await;

    assert_eq!(
        roles_and_contents(&transcript),
        vec![
            (Role::User, "Hi"),
            (Role::Assistant, "Hello"),
            (Role::User, "How are you?"),
            (Role::Assistant, "I'm well"),
        ]
    );

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let body = &requests[0];
    assert_eq!(
        body["contents"][0]["parts"][0]["text"],
        "\nPrevious conversation:\nUser: Hi\nAI: Hello\n\n\
         Now respond naturally to this new message:\nHow are you?\n"
    );
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 3024);
    let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.7).abs() < 1e-6);

    let safety = body["safetySettings"].as_array().unwrap();
    assert_eq!(safety.len(), 4);
    assert!(
        safety
            .iter()
            .all(|s| s["threshold"] == "BLOCK_MEDIUM_AND_ABOVE")
    );
}

#[tokio::test]
async fn e2e_long_history_is_truncated_in_prompt() {
    let (base, mock) = spawn_gemini(vec![(StatusCode::OK, text_body("ok"))]).await;
    let engine = engine_for(&config_for(&base));

    let long = "z".repeat(200);
    let mut transcript = engine.new_transcript();
    transcript.append(Turn::assistant(long.clone()));

    engine.send_message(&mut transcript, "next").await;

    let prompt = mock.requests()[0]["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(prompt.contains(&format!("AI: {}...\n", "z".repeat(150))));
    assert!(!prompt.contains(&long));
}

#[tokio::test]
async fn e2e_prompt_blocked() {
    let (base, _) = spawn_gemini(vec![(
        StatusCode::OK,
        json!({"promptFeedback": {"blockReason": "SAFETY"}}),
    )])
    .await;
    let engine = engine_for(&config_for(&base));
    let mut transcript = engine.new_transcript();

    engine.send_message(&mut transcript, "something unsafe").await;

    let last = transcript.last().unwrap();
    assert_eq!(last.role(), Role::Error);
    assert_eq!(
        last.content(),
        "Your prompt was blocked due to safety policies. Please rephrase."
    );
}

#[tokio::test]
async fn e2e_safety_stop() {
    let (base, _) = spawn_gemini(vec![(
        StatusCode::OK,
        json!({"candidates": [{"finishReason": "SAFETY"}]}),
    )])
    .await;
    let engine = engine_for(&config_for(&base));
    let mut transcript = engine.new_transcript();

    engine.send_message(&mut transcript, "tell me").await;

    assert_eq!(
        transcript.last().unwrap().content(),
        "Response generation stopped by safety filters."
    );
}

#[tokio::test]
async fn e2e_unknown_model_is_configuration_error() {
    let (base, _) = spawn_gemini(vec![(
        StatusCode::NOT_FOUND,
        json!({"error": {"code": 404, "message": "models/gemini-nope is not found.", "status": "NOT_FOUND"}}),
    )])
    .await;
    let engine = engine_for(&config_for(&base));
    let mut transcript = engine.new_transcript();

    engine.send_message(&mut transcript, "hi").await;

    let last = transcript.last().unwrap();
    assert_eq!(last.role(), Role::Error);
    assert_eq!(
        last.content(),
        "Configuration error: models/gemini-nope is not found."
    );
}

#[tokio::test]
async fn e2e_rate_limit_is_unexpected_error() {
    let (base, _) = spawn_gemini(vec![(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}),
    )])
    .await;
    let engine = engine_for(&config_for(&base));
    let mut transcript = engine.new_transcript();

    engine.send_message(&mut transcript, "hi").await;

    assert_eq!(
        transcript.last().unwrap().content(),
        "Unexpected error: RateLimited - Resource has been exhausted."
    );
}

#[tokio::test]
async fn e2e_empty_candidates_is_placeholder_reply() {
    let (base, _) = spawn_gemini(vec![(StatusCode::OK, json!({"candidates": []}))]).await;
    let engine = engine_for(&config_for(&base));
    let mut transcript = engine.new_transcript();

    engine.send_message(&mut transcript, "hi").await;

    let last = transcript.last().unwrap();
    assert_eq!(last.role(), Role::Assistant);
    assert_eq!(last.content(), "No response generated.");
}

#[tokio::test]
async fn e2e_missing_api_key_never_calls_out() {
    let (base, mock) = spawn_gemini(vec![]).await;
    let mut config = config_for(&base);
    config.api_key = None;
    let engine = engine_for(&config);
    let mut transcript = engine.new_transcript();

    engine.send_message(&mut transcript, "hi").await;

    let last = transcript.last().unwrap();
    assert_eq!(last.role(), Role::Error);
    assert!(last.content().starts_with("Configuration error: "));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn e2e_unreachable_service_is_network_issue() {
    // Nothing listens on port 1.
    let engine = engine_for(&config_for("http://127.0.0.1:1"));
    let mut transcript = engine.new_transcript();

    engine.send_message(&mut transcript, "anyone there?").await;

    assert_eq!(
        roles_and_contents(&transcript),
        vec![
            (Role::User, "anyone there?"),
            (
                Role::Error,
                "Network issue: failed to connect to the AI service. Please try again later."
            ),
        ]
    );
}

#[tokio::test]
async fn e2e_connection_closed_mid_request_is_network_issue() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let engine = engine_for(&config_for(&format!("http://{addr}")));
    let mut transcript = engine.new_transcript();

    engine.send_message(&mut transcript, "still there?").await;

    let last = transcript.last().unwrap();
    assert_eq!(last.role(), Role::Error);
    assert_eq!(
        last.content(),
        "Network issue: failed to connect to the AI service. Please try again later."
    );
}

#[tokio::test]
async fn e2e_error_turns_feed_later_context() {
    let (base, mock) = spawn_gemini(vec![
        (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": {"code": 503, "message": "The model is overloaded."}}),
        ),
        (StatusCode::OK, text_body("Back now")),
    ])
    .await;
    let engine = engine_for(&config_for(&base));
    let mut transcript = engine.new_transcript();

    engine.send_message(&mut transcript, "first").await;
    engine.send_message(&mut transcript, "second").await;

    assert_eq!(
        roles_and_contents(&transcript),
        vec![
            (Role::User, "first"),
            (Role::Error, "Unexpected error: ApiError - The model is overloaded."),
            (Role::User, "second"),
            (Role::Assistant, "Back now"),
        ]
    );

    let prompt = mock.requests()[1]["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(prompt.contains("User: first\nError: Unexpected error: ApiError"));
}

// ── E2E: Bound and actions with an in-process provider ──────────────────

/// Answers "reply N" for the N-th call.
struct CountingProvider {
    calls: Mutex<usize>,
}

#[async_trait::async_trait]
impl Provider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    async fn complete(&self, _request: GenerationRequest) -> Result<ProviderReply, ProviderError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        Ok(ProviderReply::text(format!("reply {calls}")))
    }
}

#[tokio::test]
async fn e2e_bound_holds_over_long_conversation() {
    let engine = SessionEngine::from_config(
        &AppConfig::default(),
        Arc::new(CountingProvider {
            calls: Mutex::new(0),
        }),
    );
    let store = InMemorySessionStore::new();
    let id = SessionId::from("long");

    for i in 0..25 {
        let mut transcript = store
            .load(&id)
            .await
            .unwrap()
            .unwrap_or_else(|| engine.new_transcript());
        engine.send_message(&mut transcript, &format!("question {i}")).await;
        assert!(transcript.len() <= 40);
        store.save(&id, &transcript).await.unwrap();
    }

    let transcript = store.load(&id).await.unwrap().unwrap();
    assert_eq!(transcript.len(), 40);
    assert_eq!(transcript.turns()[0].content(), "question 5");
    assert_eq!(transcript.last().unwrap().content(), "reply 25");
}

// ── E2E: Gateway over Gemini ─────────────────────────────────────────────

async fn post(app: Router, session: &str, action: Value) -> Value {
    let req = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .header("x-session-id", session)
        .body(Body::from(action.to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn e2e_gateway_session_lifecycle() {
    let (base, _) = spawn_gemini(vec![
        (StatusCode::OK, text_body("Hello!")),
        (StatusCode::OK, text_body("Doing great.")),
    ])
    .await;
    let config = config_for(&base);
    let provider = parley_providers::build_from_config(&config).unwrap();
    let state = Arc::new(GatewayState::from_config(&config, provider));

    post(
        build_router(state.clone()),
        "web",
        json!({"action": "send_message", "content": "Hi"}),
    )
    .await;
    let chat = post(
        build_router(state.clone()),
        "web",
        json!({"action": "send_message", "content": "How are you?"}),
    )
    .await;

    assert_eq!(chat["session_id"], "web");
    let history = chat["chat_history"].as_array().unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[1]["role"], "assistant");
    assert_eq!(history[1]["content"], "Hello!");
    assert_eq!(history[3]["content"], "Doing great.");

    let chat = post(
        build_router(state.clone()),
        "web",
        json!({"action": "delete_message", "message_index": 1}),
    )
    .await;
    assert_eq!(chat["chat_history"].as_array().unwrap().len(), 3);

    let chat = post(build_router(state.clone()), "web", json!({"action": "clear_all"})).await;
    assert!(chat["chat_history"].as_array().unwrap().is_empty());

    assert_eq!(state.sessions.count().await.unwrap(), 1);
}
