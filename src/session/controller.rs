//! Per-session chat controller.
//!
//! Owns the credential, transcript and engine handle of one session and
//! turns the three user actions into transcript entries. Engine failures
//! never escape: they become assistant messages.

use std::sync::Arc;

use tracing::{info, warn};

use super::transcript::{RenderedEntry, Transcript, TranscriptEntry};
use super::SessionState;
use crate::engine::{EngineFactory, QueryEngine};
use crate::error::SiteChatError;
use crate::Result;

/// Prefix of the transcript message shown when ingestion fails.
pub const INGEST_ERROR_PREFIX: &str = "Error ingesting the URL: ";

/// Prefix of the transcript message shown when a question fails.
pub const ASK_ERROR_PREFIX: &str = "Error processing your request: ";

pub struct SessionController {
    factory: Arc<dyn EngineFactory>,
    credential: String,
    transcript: Transcript,
    engine: Option<Arc<dyn QueryEngine>>,
}

impl SessionController {
    /// Create a controller, building an engine right away if
    /// `default_credential` is non-empty.
    pub fn new(factory: Arc<dyn EngineFactory>, default_credential: Option<&str>) -> Self {
        let credential = default_credential.unwrap_or_default().to_string();
        let engine = (!credential.is_empty()).then(|| factory.create(&credential));

        Self {
            factory,
            credential,
            transcript: Transcript::new(),
            engine,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.engine.is_some() {
            SessionState::Ready
        } else {
            SessionState::AwaitingCredential
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.credential.is_empty()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Replace the credential.
    ///
    /// Empty values and the current value are ignored. Otherwise the
    /// transcript is cleared and a new engine replaces the old one.
    /// Returns whether anything changed.
    pub fn set_credential(&mut self, new_value: &str) -> bool {
        if new_value.is_empty() || new_value == self.credential {
            return false;
        }

        self.credential = new_value.to_string();
        self.transcript.clear();
        self.engine = Some(self.factory.create(&self.credential));
        info!("credential replaced, transcript reset");
        true
    }

    /// Ingest the page at `url` and append one status entry.
    ///
    /// Blank input is a no-op. Returns the appended entries.
    pub async fn ingest(&mut self, url: &str) -> Result<Vec<RenderedEntry>> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(Vec::new());
        }
        let engine = self.engine()?;

        let start = self.transcript.len();
        let status = match engine.ingest(url).await {
            Ok(status) => status,
            Err(e) => {
                warn!(%url, error = %e, "ingest failed");
                format!("{INGEST_ERROR_PREFIX}{e}")
            }
        };
        self.transcript.push(TranscriptEntry::assistant(status));

        Ok(self.transcript.render_from(start))
    }

    /// Ask `question` and append the question followed by the answer.
    ///
    /// Blank input is a no-op. Returns the appended entries.
    pub async fn ask(&mut self, question: &str) -> Result<Vec<RenderedEntry>> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(Vec::new());
        }
        let engine = self.engine()?;

        let start = self.transcript.len();
        let answer = match engine.ask(question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "question failed");
                format!("{ASK_ERROR_PREFIX}{e}")
            }
        };
        self.transcript.push(TranscriptEntry::user(question));
        self.transcript.push(TranscriptEntry::assistant(answer));

        Ok(self.transcript.render_from(start))
    }

    /// Render the whole transcript.
    pub fn render(&self) -> Vec<RenderedEntry> {
        self.transcript.render()
    }

    fn engine(&self) -> Result<Arc<dyn QueryEngine>> {
        self.engine.clone().ok_or(SiteChatError::CredentialRequired)
    }
}
