//! Recommendation client for a locally hosted Ollama endpoint.
//!
//! Thin HTTP client over the chat API: one attempt per request with a fixed
//! timeout, no retry or streaming. Any transport failure or non-success
//! response surfaces as [`OllamaError::Unavailable`] so the caller can show
//! the user what went wrong instead of inventing an answer.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SYSTEM_PROMPT: &str =
    "You are a helpful library assistant. Recommend books based on user preferences.";

/// Errors produced by the recommendation client.
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("LLM endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("LLM endpoint returned an unusable reply: {0}")]
    BadReply(String),

    #[error("failed to build HTTP client: {0}")]
    Configuration(String),
}

/// Prompt material for one recommendation request.
#[derive(Debug, Clone)]
pub struct RecommendationPrompt {
    /// The user's free-text request ("I like sci-fi...").
    pub query: String,
    /// Optional one-line summary of the current catalog.
    pub catalog_summary: Option<String>,
}

impl RecommendationPrompt {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            catalog_summary: None,
        }
    }

    pub fn with_catalog_summary(mut self, summary: impl Into<String>) -> Self {
        self.catalog_summary = Some(summary.into());
        self
    }

    fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        }];
        if let Some(summary) = &self.catalog_summary {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: summary.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: self.query.clone(),
        });
        messages
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

/// HTTP client for the Ollama chat endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    /// Build a client with a fixed request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OllamaError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| OllamaError::Configuration(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for a recommendation. Single attempt, bounded by the
    /// client timeout.
    pub async fn recommend(&self, prompt: &RecommendationPrompt) -> Result<String, OllamaError> {
        let url = format!("{}/api/chat", self.endpoint);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: prompt.messages(),
            stream: false,
        };

        tracing::debug!(model = %self.model, url = %url, "requesting recommendation");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|err| OllamaError::Unavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "LLM endpoint returned an error");
            return Err(OllamaError::Unavailable(format!(
                "endpoint returned {status}: {body}"
            )));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|err| OllamaError::BadReply(err.to_string()))?;

        let content = reply
            .message
            .map(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| OllamaError::BadReply("reply contained no message text".to_string()))?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_persona_summary_and_query() {
        let prompt = RecommendationPrompt::new("I like sci-fi")
            .with_catalog_summary("The catalog holds 2 books.");
        let messages = prompt.messages();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("library assistant"));
        assert_eq!(messages[1].content, "The catalog holds 2 books.");
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[2].content, "I like sci-fi");
    }

    #[test]
    fn endpoint_trailing_slash_is_normalized() {
        let client = OllamaClient::new(
            "http://127.0.0.1:11434/",
            "llama3.2",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.endpoint, "http://127.0.0.1:11434");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        // Nothing listens on port 9 (discard); the connection attempt fails.
        let client = OllamaClient::new("http://127.0.0.1:9", "llama3.2", Duration::from_secs(2))
            .unwrap();

        let result = client
            .recommend(&RecommendationPrompt::new("anything"))
            .await;

        assert!(matches!(result, Err(OllamaError::Unavailable(_))));
    }
}
