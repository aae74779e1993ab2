//! Remote completion service client.
//!
//! Thin client for an OpenAI-compatible chat-completions endpoint. The
//! generator treats every failure here identically to "no remote service
//! available", so this module only needs to surface errors, never handle
//! them.

use crate::error::{NlqError, NlqResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sampling temperature for query generation. Low on purpose: we want the
/// most likely SQL, not creative variations.
const COMPLETION_TEMPERATURE: f32 = 0.1;

/// Upper bound on generated tokens. A SELECT statement fits comfortably.
const COMPLETION_MAX_TOKENS: u32 = 500;

/// One request attempt, no retry; this bounds how long a generate_query
/// call can hang on a dead endpoint.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the remote completion service.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Full chat-completions URL, e.g. `https://api.openai.com/v1/chat/completions`.
    pub api_base: String,
    /// Bearer token. Treated as sensitive, never logged.
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the remote completion service.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl CompletionClient {
    /// Create a new client.
    pub fn new(config: CompletionConfig) -> NlqResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NlqError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a single prompt and return the raw completion text.
    ///
    /// One attempt, no retry. Any transport, auth or payload problem comes
    /// back as `NlqError::Completion`.
    pub async fn complete(&self, prompt: &str) -> NlqResult<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: COMPLETION_TEMPERATURE,
            max_tokens: COMPLETION_MAX_TOKENS,
        };

        let response = self
            .http
            .post(&self.config.api_base)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NlqError::completion(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NlqError::completion(format!(
                "Completion service returned HTTP {}",
                status
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| NlqError::completion(format!("Malformed response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| NlqError::completion("Completion service returned no content"))
    }
}
