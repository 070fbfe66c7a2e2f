//! Query engine: turns a web page into something a chat session can ask.
//!
//! The session layer only sees the [`QueryEngine`] and [`EngineFactory`]
//! traits. The production implementation is [`WebQuery`], which scrapes a
//! page, chunks and embeds its text, and answers questions by retrieving
//! the closest passages and handing them to an OpenAI chat model.
//!
//! ## Example
//!
//! ```no_run
//! use site_chat::engine::{EngineFactory, EngineSettings, OpenAiEngineFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), site_chat::engine::EngineError> {
//!     let factory = OpenAiEngineFactory::new(EngineSettings::default())?;
//!     let engine = factory.create("sk-...");
//!
//!     println!("{}", engine.ingest("https://example.com").await?);
//!     println!("{}", engine.ask("What is this page about?").await?);
//!     Ok(())
//! }
//! ```

pub mod chunk;
pub mod index;
pub mod openai;
pub mod scrape;
pub mod web_query;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use chunk::{chunk_text, TextChunk};
pub use index::VectorIndex;
pub use openai::OpenAiClient;
pub use scrape::{Page, PageFetcher};
pub use web_query::{OpenAiEngineFactory, WebQuery, NO_DOCUMENT_REPLY};

/// Errors raised by a query engine.
///
/// The session controller turns these into transcript messages, so the
/// `Display` text is what the user ends up reading.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Transport-level HTTP failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// URL could not be parsed or uses an unsupported scheme.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Page content type cannot be turned into text.
    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),

    /// Response body exceeded the download budget.
    #[error("page at {url} is larger than {limit} bytes")]
    PageTooLarge { url: String, limit: usize },

    /// URL names a loopback, private or link-local host.
    #[error("refusing to fetch non-public address {0}")]
    BlockedHost(String),

    /// Page had no readable text.
    #[error("no readable text found at {0}")]
    EmptyPage(String),

    /// Language-model provider reported an error.
    #[error("OpenAI API error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// Provider response did not have the expected shape.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Internal invariant broken.
    #[error("internal engine error: {0}")]
    Internal(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Ingests pages and answers questions about them.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Ingest the page at `url`, returning a status message for the user.
    async fn ingest(&self, url: &str) -> EngineResult<String>;

    /// Answer `question` from previously ingested content.
    async fn ask(&self, question: &str) -> EngineResult<String>;
}

/// Builds a fresh engine for a credential.
///
/// Called every time a session's credential changes; the previous engine
/// is dropped by the caller.
pub trait EngineFactory: Send + Sync {
    fn create(&self, credential: &str) -> Arc<dyn QueryEngine>;
}

/// Runtime settings shared by every engine a factory builds.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Base URL of the OpenAI-compatible API, including `/v1`.
    pub api_base: String,
    /// Chat completion model.
    pub chat_model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Sampling temperature for answers.
    pub temperature: f32,
    /// Target passage size in characters.
    pub chunk_size: usize,
    /// Characters of the previous passage carried into the next.
    pub chunk_overlap: usize,
    /// Passages handed to the model per question.
    pub top_k: usize,
    /// Upper bound on extracted page text, in characters.
    pub max_page_chars: usize,
    /// Upper bound on a downloaded page body, in bytes.
    pub max_body_bytes: usize,
    /// Allow fetching loopback, private and link-local addresses.
    pub allow_private_hosts: bool,
    /// Timeout for every outbound HTTP request.
    pub request_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.0,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            max_page_chars: 200_000,
            max_body_bytes: 5 * 1024 * 1024,
            allow_private_hosts: false,
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();
        assert_eq!(settings.api_base, "https://api.openai.com/v1");
        assert_eq!(settings.chunk_size, 1000);
        assert_eq!(settings.chunk_overlap, 200);
        assert_eq!(settings.top_k, 4);
        assert_eq!(settings.temperature, 0.0);
        assert_eq!(settings.max_body_bytes, 5 * 1024 * 1024);
        assert!(!settings.allow_private_hosts);
    }

    #[test]
    fn test_status_error_display() {
        let err = EngineError::Status {
            status: 404,
            url: "https://example.com/missing".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404 from https://example.com/missing");
    }

    #[test]
    fn test_provider_error_display() {
        let err = EngineError::Provider {
            status: 401,
            message: "Incorrect API key provided".into(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("Incorrect API key provided"));
    }
}
