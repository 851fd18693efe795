//! HTTP API v1: the session engine's actions.
//!
//! Endpoints:
//!
//! - `GET  /v1/chat`: Current transcript of the caller's session
//! - `POST /v1/chat`: Run one action (`clear_all`, `delete_message`,
//!   `send_message`, `list_history`) and return the transcript
//!
//! Both answer `{ session_id, chat_history }` and echo the session id in
//! the `X-Session-Id` response header. Provider failures are entries in
//! `chat_history`, not HTTP errors.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use parley_core::session::SessionId;
use parley_core::transcript::Transcript;
use parley_core::turn::Turn;
use parley_engine::SessionAction;

use crate::SharedState;

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: &str = "x-session-id";

/// Longest session id accepted from a client; longer ids are replaced.
const MAX_SESSION_ID_LEN: usize = 128;

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", get(history_handler).post(action_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub chat_history: Vec<Turn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// ── Handlers ──────────────────────────────────────────────────────────────

async fn history_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    run_action(&state, session_id(&headers), SessionAction::ListHistory).await
}

async fn action_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(action): Json<SessionAction>,
) -> Result<Response, ApiError> {
    run_action(&state, session_id(&headers), action).await
}

/// Load → act → save, holding the session's lock throughout.
///
/// A session minted for this request is only stored once an action has
/// put something in it, so header-less reads never take up store capacity.
async fn run_action(
    state: &SharedState,
    requested: Option<SessionId>,
    action: SessionAction,
) -> Result<Response, ApiError> {
    let minted = requested.is_none();
    let id = requested.unwrap_or_default();
    let _guard = state.locks.acquire(&id).await;

    let mut transcript = load_transcript(state, &id).await;
    let before = minted.then(|| transcript.clone());
    state.engine.handle(action, &mut transcript).await;

    if before.as_ref() == Some(&transcript) {
        debug!(session = %id, "Nothing to store for a fresh session");
        return Ok(chat_response(id, &transcript));
    }

    state.sessions.save(&id, &transcript).await.map_err(|e| {
        warn!(session = %id, error = %e, "Failed to save session");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    Ok(chat_response(id, &transcript))
}

async fn load_transcript(state: &SharedState, id: &SessionId) -> Transcript {
    match state.sessions.load(id).await {
        Ok(Some(transcript)) => transcript,
        Ok(None) => {
            debug!(session = %id, "Starting new session");
            state.engine.new_transcript()
        }
        Err(e) => {
            warn!(session = %id, error = %e, "Unreadable session, starting over");
            state.engine.new_transcript()
        }
    }
}

fn chat_response(id: SessionId, transcript: &Transcript) -> Response {
    let header = HeaderValue::from_str(id.as_str()).ok();
    let mut response = Json(ChatResponse {
        session_id: id.0,
        chat_history: transcript.to_vec(),
    })
    .into_response();

    if let Some(value) = header {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

/// The caller's session id; `None` when the header is missing or unusable
/// and a fresh id has to be minted.
fn session_id(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_SESSION_ID_LEN)
        .map(SessionId::from)
}

// ── Tests ─────────────────────────────────────────────────────────────────
