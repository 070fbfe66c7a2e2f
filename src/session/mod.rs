//! Session management module.
//!
//! This module provides the per-session chat state (credential, transcript
//! and query engine), session identification, and storage.

mod controller;
mod id;
mod state;
mod store;
mod transcript;

pub use controller::{SessionController, ASK_ERROR_PREFIX, INGEST_ERROR_PREFIX};
pub use id::SessionId;
pub use state::SessionState;
pub use store::{spawn_reaper, Session, SessionHandle, SessionStore};
pub use transcript::{RenderedEntry, Role, Transcript, TranscriptEntry};
