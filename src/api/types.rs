//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::session::{RenderedEntry, Session, SessionId, SessionState};

/// Request to create a new session.
#[derive(Deserialize, Default)]
pub struct CreateSessionRequest {
    /// Credential to start with instead of the server default.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Response for session creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    /// The assigned session ID.
    pub session_id: String,
    /// Current state.
    pub state: &'static str,
    /// Whether a credential is set. The credential itself is never returned.
    pub has_credential: bool,
}

impl CreateSessionResponse {
    pub fn new(id: SessionId, state: SessionState, has_credential: bool) -> Self {
        Self {
            session_id: id.to_string(),
            state: state.as_str(),
            has_credential,
        }
    }
}

/// Response for session status query.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusResponse {
    /// Session ID.
    pub session_id: String,
    /// Current state.
    pub state: &'static str,
    /// Whether a credential is set.
    pub has_credential: bool,
    /// Number of transcript entries.
    pub transcript_len: usize,
    /// Seconds since the session was created.
    pub age_seconds: f64,
    /// Idle duration in seconds.
    pub idle_seconds: f64,
}

impl SessionStatusResponse {
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.id.to_string(),
            state: session.controller.state().as_str(),
            has_credential: session.controller.has_credential(),
            transcript_len: session.controller.transcript().len(),
            age_seconds: session.age().as_secs_f64(),
            idle_seconds: session.idle_duration().as_secs_f64(),
        }
    }
}

/// Request to set the session credential.
#[derive(Deserialize)]
pub struct SetCredentialRequest {
    pub api_key: String,
}

/// Response for a credential update.
#[derive(Debug, Clone, Serialize)]
pub struct SetCredentialResponse {
    /// Whether the credential changed (and the transcript was reset).
    pub changed: bool,
    pub state: &'static str,
    pub has_credential: bool,
}

/// Request to ingest a URL.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub url: String,
}

/// Request to send a chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// Response for ingest and message actions.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    /// Entries appended by this action; empty for blank input.
    pub appended: Vec<RenderedEntry>,
    /// Transcript length after the action.
    pub transcript_len: usize,
}

/// Full rendered transcript.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResponse {
    pub count: usize,
    pub entries: Vec<RenderedEntry>,
}

impl TranscriptResponse {
    pub fn new(entries: Vec<RenderedEntry>) -> Self {
        Self {
            count: entries.len(),
            entries,
        }
    }
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "SESSION_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn session_not_found(id: &str) -> Self {
        Self::new("SESSION_NOT_FOUND", format!("Session '{}' not found", id))
    }

    pub fn credential_required() -> Self {
        Self::new(
            "CREDENTIAL_REQUIRED",
            "Set an OpenAI API key before adding URLs or sending messages",
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}
