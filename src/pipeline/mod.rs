//! The AI request pipeline shared by every model-backed endpoint.
//!
//! `BUILDING_PROMPT → INVOKING → NORMALIZING → DONE`, or on any failure
//! `FAILED → FALLBACK → DONE`. The pipeline itself stops at a tagged
//! [`AiOutcome`]; each call site resolves failures into its own fallback
//! document with an explicit `match` (see `crate::fallback`).
//!
//! There is no retry at this level.

pub mod normalize;
pub mod prompt;

pub use normalize::{parse_reply, strip_code_fence, NormalizeError};
pub use prompt::{CallSite, Section};

use crate::llm::{LlmClient, LlmError};
use crate::sanitize::truncate_chars;
use serde_json::Value;
use tracing::{error, info, warn};

/// Characters of reply text echoed into logs on success.
const LOG_PREVIEW_CHARS: usize = 200;

/// What one pass through the pipeline produced.
#[derive(Debug, Clone)]
pub enum AiOutcome {
    /// The model replied with a parseable document.
    Generated(Value),
    /// No credential configured; the model was never called.
    Unavailable,
    /// Network error, non-success status or timeout.
    UpstreamFailed(String),
    /// The model replied, but not with JSON.
    Malformed(NormalizeError),
}

impl AiOutcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, AiOutcome::Generated(_))
    }

    /// Short tag for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AiOutcome::Generated(_) => "generated",
            AiOutcome::Unavailable => "unavailable",
            AiOutcome::UpstreamFailed(_) => "upstream_failed",
            AiOutcome::Malformed(_) => "malformed",
        }
    }
}

/// Build the prompt for `site`, call the model once and normalize the reply.
pub async fn run(client: &dyn LlmClient, site: CallSite, sections: &[Section<'_>]) -> AiOutcome {
    if !client.is_configured() {
        return AiOutcome::Unavailable;
    }

    let request = prompt::build(site, sections);
    info!(call_site = %site, "invoking model");

    let raw = match client.complete(&request).await {
        Ok(text) => text,
        Err(LlmError::Unavailable(_)) => return AiOutcome::Unavailable,
        Err(LlmError::Upstream(reason)) => {
            warn!(call_site = %site, %reason, "model call failed, using fallback");
            return AiOutcome::UpstreamFailed(reason);
        }
    };
    info!(
        call_site = %site,
        preview = truncate_chars(&raw, LOG_PREVIEW_CHARS),
        "model reply received"
    );

    match parse_reply(&raw) {
        Ok(doc) => AiOutcome::Generated(doc),
        Err(err) => {
            error!(call_site = %site, error = %err.error, "failed to parse model reply as JSON");
            error!(call_site = %site, raw = %err.raw, "raw model reply");
            error!(call_site = %site, cleaned = %err.cleaned, "cleaned model reply");
            AiOutcome::Malformed(err)
        }
    }
}
