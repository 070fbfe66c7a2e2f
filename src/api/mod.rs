//! API layer for site-chat.
//!
//! This module serves the chat page and the REST endpoints that drive a
//! chat session.
//!
//! ## Endpoints
//!
//! ### Page, Health & Info
//! - `GET /` - Chat page
//! - `GET /health` - Health check
//! - `GET /api/v1/` - API information
//!
//! ### Sessions
//! - `POST /api/v1/sessions` - Create a new session
//! - `GET /api/v1/sessions/{id}` - Get session status
//! - `DELETE /api/v1/sessions/{id}` - End a session
//! - `PUT /api/v1/sessions/{id}/credential` - Set the OpenAI API key
//! - `POST /api/v1/sessions/{id}/ingest` - Ingest a URL
//! - `POST /api/v1/sessions/{id}/messages` - Ask a question
//! - `GET /api/v1/sessions/{id}/transcript` - Render the transcript
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use site_chat::api::{serve_with_state, AppState, ServerConfig};
//! use site_chat::engine::{EngineSettings, OpenAiEngineFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = OpenAiEngineFactory::new(EngineSettings::default())?;
//!     let state = AppState::new(Arc::new(factory));
//!     serve_with_state(ServerConfig::new("127.0.0.1", 8501), state).await?;
//!     Ok(())
//! }
//! ```

pub mod handlers;
pub mod page;
pub mod router;
pub mod types;

// Re-export commonly used types
pub use handlers::{api_error, ApiError, AppState};
pub use router::{create_router_with_state, serve_with_state, ServerConfig};
pub use types::{
    CreateSessionRequest, CreateSessionResponse, ErrorResponse, IngestRequest, MessageRequest,
    SessionStatusResponse, SetCredentialRequest, SetCredentialResponse, TranscriptResponse,
    TurnResponse,
};
