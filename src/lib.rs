//! # site-chat
//!
//! Turn any web page into a chatbot.
//!
//! A user supplies an OpenAI API key, points a session at a URL, and then
//! asks questions about that page. Every session keeps its own credential,
//! query engine and transcript; errors from ingesting or answering are
//! shown in the transcript instead of failing the request.
//!
//! ## Features
//!
//! - **Session controller**: credential, ingest and ask actions over an append-only transcript
//! - **Query engine**: page scraping, passage chunking, embeddings and retrieval
//! - **HTTP server**: chat page plus a JSON API, built on axum
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use site_chat::engine::{EngineSettings, OpenAiEngineFactory};
//! use site_chat::SessionController;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Initialize logging
//!     site_chat::logging::try_init().ok();
//!
//!     let factory = Arc::new(OpenAiEngineFactory::new(EngineSettings::default())?);
//!     let mut chat = SessionController::new(factory, None);
//!
//!     chat.set_credential("sk-...");
//!     chat.ingest("https://example.com").await?;
//!     chat.ask("What is this page about?").await?;
//!
//!     for entry in chat.render() {
//!         println!("[{:?}] {}", entry.role, entry.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use engine::{EngineError, EngineFactory, EngineSettings, QueryEngine};
pub use error::{Result, SiteChatError};
pub use session::{
    RenderedEntry, Role, Session, SessionController, SessionId, SessionState, SessionStore,
    Transcript,
};
