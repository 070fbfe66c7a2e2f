//! REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use tracing::info;

use super::page::INDEX_HTML;
use super::types::{
    CreateSessionRequest, CreateSessionResponse, ErrorResponse, IngestRequest, MessageRequest,
    SessionStatusResponse, SetCredentialRequest, SetCredentialResponse, TranscriptResponse,
    TurnResponse,
};
use crate::engine::EngineFactory;
use crate::error::SiteChatError;
use crate::session::{SessionHandle, SessionId, SessionStore};

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state.
///
/// Only the session map is shared; everything a session mutates lives
/// inside its own handle.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    default_credential: Option<Arc<str>>,
}

impl AppState {
    /// Create state whose sessions build engines with `factory`.
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            store: Arc::new(SessionStore::new(factory)),
            default_credential: None,
        }
    }

    /// Seed new sessions with this credential (usually `OPENAI_API_KEY`).
    pub fn with_default_credential(mut self, credential: Option<&str>) -> Self {
        self.default_credential = credential.filter(|c| !c.is_empty()).map(Arc::from);
        self
    }

    /// Look up a session by its textual ID.
    fn session(&self, raw_id: &str) -> Result<(SessionId, SessionHandle), ApiError> {
        let id: SessionId = raw_id.parse().map_err(api_error)?;
        let handle = self.store.require(&id).map_err(api_error)?;
        Ok((id, handle))
    }
}

/// Map a crate error onto a status code and JSON body.
pub fn api_error(err: SiteChatError) -> ApiError {
    match err {
        SiteChatError::SessionNotFound(id) | SiteChatError::InvalidSessionId(id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::session_not_found(&id)),
        ),
        SiteChatError::CredentialRequired => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::credential_required()),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::internal_error(other.to_string())),
        ),
    }
}

/// Chat page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "site-chat",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Create a new session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let credential = req
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .or(state.default_credential.as_deref());

    let id = state.store.create(credential).map_err(api_error)?;
    let handle = state.store.require(&id).map_err(api_error)?;
    let session = handle.lock().await;

    info!(session = %id, state = %session.controller.state(), "session created");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse::new(
            id,
            session.controller.state(),
            session.controller.has_credential(),
        )),
    ))
}

/// Get session status.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let (_, handle) = state.session(&session_id)?;
    let session = handle.lock().await;

    Ok(Json(SessionStatusResponse::from_session(&session)))
}

/// End a session, discarding its transcript, credential and engine.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: SessionId = session_id.parse().map_err(api_error)?;

    match state.store.remove(&id).map_err(api_error)? {
        Some(_) => {
            info!(session = %id, "session ended");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(api_error(SiteChatError::SessionNotFound(session_id))),
    }
}

/// Set or replace the session credential.
pub async fn set_credential(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SetCredentialRequest>,
) -> Result<Json<SetCredentialResponse>, ApiError> {
    let (_, handle) = state.session(&session_id)?;
    let mut session = handle.lock().await;

    let changed = session.controller.set_credential(&req.api_key);
    session.touch();

    Ok(Json(SetCredentialResponse {
        changed,
        state: session.controller.state().as_str(),
        has_credential: session.controller.has_credential(),
    }))
}

/// Ingest a URL into the session's engine.
pub async fn ingest_url(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let (_, handle) = state.session(&session_id)?;
    let mut session = handle.lock().await;

    let appended = session.controller.ingest(&req.url).await.map_err(api_error)?;
    session.touch();

    Ok(Json(TurnResponse {
        appended,
        transcript_len: session.controller.transcript().len(),
    }))
}

/// Send a chat message.
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let (_, handle) = state.session(&session_id)?;
    let mut session = handle.lock().await;

    let appended = session.controller.ask(&req.message).await.map_err(api_error)?;
    session.touch();

    Ok(Json(TurnResponse {
        appended,
        transcript_len: session.controller.transcript().len(),
    }))
}

/// Render the session transcript.
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let (_, handle) = state.session(&session_id)?;
    let session = handle.lock().await;

    Ok(Json(TranscriptResponse::new(session.controller.render())))
}
