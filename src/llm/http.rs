//! OpenAI-compatible chat-completion client over HTTPS.

use super::{CompletionRequest, LlmClient, LlmError};
use crate::sanitize::truncate_chars;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.aimlapi.com/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-5-chat-latest";

/// Maximum length of upstream error bodies carried into error messages
const MAX_ERROR_CONTENT_LEN: usize = 200;

/// Connection settings for [`HttpChatClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    /// Null when the provider refused or filtered the reply
    #[serde(default)]
    content: Option<String>,
}

/// Production client. One request per call, no retries; the request timeout
/// is enforced by the underlying `reqwest::Client`.
pub struct HttpChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpChatClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Unavailable(format!("failed to create HTTP client: {}", e)))?;
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key,
            model: config.model,
        })
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.params.temperature,
            top_p: request.params.top_p,
            frequency_penalty: request.params.frequency_penalty,
            presence_penalty: request.params.presence_penalty,
            max_tokens: request.params.max_tokens,
        }
    }
}

/// Pull the first choice's text out of a chat-completion response body.
fn extract_content(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::Upstream(format!("unreadable completion body: {}", e)))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::Upstream("completion contained no text".to_string()))
}

#[async_trait]
impl LlmClient for HttpChatClient {
    fn is_configured(&self) -> bool {
        true
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        debug!(call_site = %request.label, model = %self.model, "sending completion request");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Upstream(format!("request timed out: {}", e))
                } else {
                    LlmError::Upstream(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Upstream(e.to_string()))?;

        if !status.is_success() {
            return Err(LlmError::Upstream(format!(
                "API error {}: {}",
                status,
                truncate_chars(&text, MAX_ERROR_CONTENT_LEN)
            )));
        }

        extract_content(&text)
    }
}
