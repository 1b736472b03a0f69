//! Chat-completion client: the seam between the pipeline and the external model.
//!
//! Defines the client trait and request types. Three implementations:
//! - `HttpChatClient`: OpenAI-compatible HTTPS endpoint (production)
//! - `DisabledClient`: no credential configured; every call is `Unavailable`
//! - `MockClient`: returns preconfigured replies (testing)
//!
//! Running without a credential is a supported mode, not an error path:
//! callers check the outcome and substitute a fallback document.

mod http;

pub use http::{HttpChatClient, HttpClientConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

/// Fixed decoding configuration for JSON-producing calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecodingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
}

impl DecodingParams {
    /// Low-randomness settings with a per-call output budget.
    pub fn json_mode(max_tokens: u32) -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.3,
            frequency_penalty: 1.0,
            presence_penalty: 0.5,
            max_tokens,
        }
    }
}

/// A single system/user exchange sent to the model.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Call-site label, used for logging and by `MockClient` to pick a reply.
    pub label: String,
    pub system: String,
    pub user: String,
    pub params: DecodingParams,
}

/// Errors from model invocation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("integration unavailable: {0}")]
    Unavailable(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
}

/// Client trait for chat-completion calls.
///
/// Abstracts over transport (HTTPS, mock) so the pipeline does not depend
/// on how the model is reached.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Whether a credential is configured. Reported on `/api/config`.
    fn is_configured(&self) -> bool;

    /// Perform one completion and return the raw reply text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Client used when no credential is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledClient;

#[async_trait]
impl LlmClient for DisabledClient {
    fn is_configured(&self) -> bool {
        false
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        Err(LlmError::Unavailable("no API key configured".to_string()))
    }
}

/// Mock client for testing: returns preconfigured replies per call-site label.
pub struct MockClient {
    configured: bool,
    replies: HashMap<String, Result<String, LlmError>>,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl MockClient {
    /// A mock that reports a configured credential.
    pub fn available() -> Self {
        Self {
            configured: true,
            replies: HashMap::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// A mock that behaves like a missing credential.
    pub fn unavailable() -> Self {
        Self {
            configured: false,
            replies: HashMap::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Register the raw reply text for a call-site label.
    pub fn with_reply(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.replies.insert(label.into(), Ok(text.into()));
        self
    }

    /// Register an upstream failure for a call-site label.
    pub fn with_failure(mut self, label: impl Into<String>, reason: impl Into<String>) -> Self {
        self.replies
            .insert(label.into(), Err(LlmError::Upstream(reason.into())));
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockClient {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        if !self.configured {
            return Err(LlmError::Unavailable(
                "mock client configured as unavailable".to_string(),
            ));
        }
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }

        match self.replies.get(&request.label) {
            Some(reply) => reply.clone(),
            None => Err(LlmError::Upstream(format!(
                "no mock reply for call site '{}'",
                request.label
            ))),
        }
    }
}
