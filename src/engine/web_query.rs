//! Retrieval-augmented question answering over a single web page.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::chunk::chunk_text;
use super::index::VectorIndex;
use super::openai::OpenAiClient;
use super::scrape::{is_private_host, PageFetcher};
use super::{EngineError, EngineFactory, EngineResult, EngineSettings, QueryEngine};

/// Reply to a question asked before any page was ingested.
pub const NO_DOCUMENT_REPLY: &str = "Please, add a document.";

const MAX_REDIRECTS: usize = 5;

const SYSTEM_PROMPT: &str = "You answer questions about a web page. \
Use only the provided page excerpts. If the excerpts do not contain the answer, \
say that you don't know instead of guessing. Keep answers concise.";

/// The currently ingested page.
struct Corpus {
    source: String,
    index: VectorIndex,
}

/// Query engine backed by the OpenAI API.
///
/// Each successful ingest replaces the previous corpus, so questions are
/// always answered against the most recently ingested page.
pub struct WebQuery {
    client: OpenAiClient,
    fetcher: PageFetcher,
    chunk_size: usize,
    chunk_overlap: usize,
    top_k: usize,
    corpus: RwLock<Option<Corpus>>,
}

impl WebQuery {
    /// Create an engine with no ingested content.
    pub fn new(client: OpenAiClient, fetcher: PageFetcher, settings: &EngineSettings) -> Self {
        Self {
            client,
            fetcher,
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            top_k: settings.top_k.max(1),
            corpus: RwLock::new(None),
        }
    }

    fn has_corpus(&self) -> EngineResult<bool> {
        self.corpus
            .read()
            .map(|c| c.is_some())
            .map_err(|_| EngineError::Internal("corpus lock poisoned".into()))
    }

    fn retrieve(&self, query: &[f32]) -> EngineResult<(String, Vec<String>)> {
        let corpus = self
            .corpus
            .read()
            .map_err(|_| EngineError::Internal("corpus lock poisoned".into()))?;
        let corpus = corpus
            .as_ref()
            .ok_or_else(|| EngineError::Internal("corpus disappeared during query".into()))?;

        let passages = corpus
            .index
            .search(query, self.top_k)
            .into_iter()
            .map(str::to_string)
            .collect();
        Ok((corpus.source.clone(), passages))
    }
}

#[async_trait]
impl QueryEngine for WebQuery {
    async fn ingest(&self, url: &str) -> EngineResult<String> {
        let page = self.fetcher.fetch(url).await?;

        let text = match &page.title {
            Some(title) => format!("{title}\n\n{}", page.text),
            None => page.text.clone(),
        };
        let passages: Vec<String> = chunk_text(&text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .map(|c| c.content)
            .collect();
        if passages.is_empty() {
            return Err(EngineError::EmptyPage(page.url));
        }

        let embeddings = self.client.embed(&passages).await?;

        let mut index = VectorIndex::new();
        for (passage, embedding) in passages.into_iter().zip(embeddings) {
            index.insert(passage, embedding);
        }
        let count = index.len();

        let mut corpus = self
            .corpus
            .write()
            .map_err(|_| EngineError::Internal("corpus lock poisoned".into()))?;
        *corpus = Some(Corpus {
            source: page.url.clone(),
            index,
        });

        info!(url = %page.url, passages = count, "page ingested");
        Ok(format!("Success: indexed {count} passages from {}", page.url))
    }

    async fn ask(&self, question: &str) -> EngineResult<String> {
        if !self.has_corpus()? {
            return Ok(NO_DOCUMENT_REPLY.to_string());
        }

        let query = self
            .client
            .embed(&[question.to_string()])
            .await?
            .pop()
            .ok_or_else(|| EngineError::MalformedResponse("empty embedding result".into()))?;

        let (source, passages) = self.retrieve(&query)?;
        debug!(%source, passages = passages.len(), "answering from retrieved passages");

        let prompt = build_prompt(&source, &passages, question);
        self.client.complete(SYSTEM_PROMPT, &prompt).await
    }
}

fn build_prompt(source: &str, passages: &[String], question: &str) -> String {
    let mut prompt = format!("Page: {source}\n\n");
    for (i, passage) in passages.iter().enumerate() {
        prompt.push_str(&format!("Excerpt {}:\n{}\n\n", i + 1, passage));
    }
    prompt.push_str(&format!("Question: {question}\nAnswer:"));
    prompt
}

/// Builds [`WebQuery`] engines that share one HTTP connection pool.
pub struct OpenAiEngineFactory {
    http: reqwest::Client,
    settings: EngineSettings,
}

impl OpenAiEngineFactory {
    /// Create a factory, building the shared HTTP client.
    pub fn new(settings: EngineSettings) -> EngineResult<Self> {
        let allow_private_hosts = settings.allow_private_hosts;
        let redirects = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if !allow_private_hosts
                && is_private_host(attempt.url().host_str().unwrap_or_default())
            {
                attempt.error("redirect to a non-public address")
            } else {
                attempt.follow()
            }
        });

        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("site-chat/", env!("CARGO_PKG_VERSION")))
            .redirect(redirects)
            .build()?;

        Ok(Self { http, settings })
    }
}

impl EngineFactory for OpenAiEngineFactory {
    fn create(&self, credential: &str) -> Arc<dyn QueryEngine> {
        let client = OpenAiClient::new(
            self.http.clone(),
            &self.settings.api_base,
            credential,
            &self.settings.chat_model,
            &self.settings.embedding_model,
            self.settings.temperature,
        );
        let fetcher = PageFetcher::new(self.http.clone(), &self.settings);
        Arc::new(WebQuery::new(client, fetcher, &self.settings))
    }
}
