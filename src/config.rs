//! Resolved process configuration.
//!
//! The binary fills this from CLI flags and environment variables; the
//! library only sees the resolved values.

use crate::llm::{
    DisabledClient, HttpChatClient, HttpClientConfig, LlmClient, DEFAULT_BASE_URL, DEFAULT_MODEL,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default request timeout for model calls, in seconds.
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 20;

/// External model settings.
#[derive(Debug, Clone)]
pub struct AiSettings {
    /// `None` (or empty) runs the service with the integration disabled
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
        }
    }
}

impl AiSettings {
    fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Build the client for these settings. A missing credential, or a
    /// client that cannot be constructed, yields the disabled client.
    pub fn build_client(&self) -> Arc<dyn LlmClient> {
        let Some(api_key) = self.credential() else {
            info!("AI integration disabled (no API key), using fallbacks");
            return Arc::new(DisabledClient);
        };

        match HttpChatClient::new(HttpClientConfig {
            api_key: api_key.to_string(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            timeout: self.timeout,
        }) {
            Ok(client) => {
                info!(model = %self.model, base_url = %self.base_url, "AI integration configured");
                Arc::new(client)
            }
            Err(e) => {
                warn!(error = %e, "AI client unavailable, using fallbacks");
                Arc::new(DisabledClient)
            }
        }
    }
}

/// Everything needed to start the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub ai: AiSettings,
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            ai: AiSettings::default(),
            database_path: default_database_path(),
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Get the default database path (~/.local/share/carbontwin/carbontwin.db)
pub fn default_database_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("carbontwin").join("carbontwin.db")
}
