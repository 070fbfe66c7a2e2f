//! Minimal OpenAI HTTP client: embeddings and chat completions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EngineError, EngineResult};

/// Inputs per embeddings request.
pub const EMBEDDING_BATCH_SIZE: usize = 64;

/// OpenAI API client bound to one credential.
///
/// Deliberately not `Debug`: it holds the API key.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiClient {
    /// Create a client for `api_key` on top of a shared HTTP client.
    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        api_key: &str,
        chat_model: &str,
        embedding_model: &str,
        temperature: f32,
    ) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            chat_model: chat_model.to_string(),
            embedding_model: embedding_model.to_string(),
            temperature,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// Embed `inputs`, batching requests. Output order matches input order.
    pub async fn embed(&self, inputs: &[String]) -> EngineResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(inputs.len());

        for batch in inputs.chunks(EMBEDDING_BATCH_SIZE) {
            let request = EmbeddingRequest {
                model: &self.embedding_model,
                input: batch,
            };
            let body = self.post_json("embeddings", &request).await?;
            let vectors = parse_embeddings(&body, batch.len())?;
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    /// Run a single-turn chat completion and return the reply text.
    pub async fn complete(&self, system: &str, user: &str) -> EngineResult<String> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        let body = self.post_json("chat/completions", &request).await?;
        parse_chat_reply(&body)
    }

    async fn post_json<T: Serialize>(&self, path: &str, payload: &T) -> EngineResult<String> {
        let url = self.endpoint(path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "provider response");

        if !status.is_success() {
            return Err(EngineError::Provider {
                status: status.as_u16(),
                message: provider_error_message(&body),
            });
        }
        Ok(body)
    }
}

/// Pull `error.message` out of an error body, falling back to the raw text.
fn provider_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn parse_embeddings(body: &str, expected: usize) -> EngineResult<Vec<Vec<f32>>> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| EngineError::MalformedResponse(format!("embeddings: {e}")))?;

    if parsed.data.len() != expected {
        return Err(EngineError::MalformedResponse(format!(
            "embeddings: expected {expected} vectors, got {}",
            parsed.data.len()
        )));
    }

    parsed.data.sort_by_key(|d| d.index);
    Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
}

fn parse_chat_reply(body: &str) -> EngineResult<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| EngineError::MalformedResponse(format!("chat completion: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| EngineError::MalformedResponse("chat completion had no content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> OpenAiClient {
        OpenAiClient::new(
            reqwest::Client::new(),
            base,
            "sk-test",
            "gpt-4o-mini",
            "text-embedding-3-small",
            0.0,
        )
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        assert_eq!(
            client("https://api.openai.com/v1/").endpoint("/embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(
            client("http://localhost:8080/v1").endpoint("chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_embeddings_orders_by_index() {
        let body = r#"{"data": [
            {"index": 1, "embedding": [0.0, 1.0]},
            {"index": 0, "embedding": [1.0, 0.0]}
        ]}"#;
        let vectors = parse_embeddings(body, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_parse_embeddings_count_mismatch() {
        let body = r#"{"data": [{"index": 0, "embedding": [1.0]}]}"#;
        let err = parse_embeddings(body, 2).unwrap_err();
        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_chat_reply() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "  It is about Rust.\n"}}]}"#;
        assert_eq!(parse_chat_reply(body).unwrap(), "It is about Rust.");
    }

    #[test]
    fn test_parse_chat_reply_without_content() {
        assert!(parse_chat_reply(r#"{"choices": []}"#).is_err());
        assert!(parse_chat_reply(r#"{"choices": [{"message": {"content": null}}]}"#).is_err());
        assert!(parse_chat_reply("not json").is_err());
    }

    #[test]
    fn test_provider_error_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(provider_error_message(body), "Incorrect API key provided");
        assert_eq!(provider_error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(provider_error_message(""), "empty response body");
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.0,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["temperature"], 0.0);
    }
}
