//! CarbonTwin: AI-assisted carbon management backend
//!
//! Verifies emission reports, builds digital twins of facilities and
//! simulates reduction scenarios against them, and runs a demonstration
//! carbon-credit marketplace. Every model-backed operation degrades to a
//! deterministic fallback document when the model is absent or misbehaves.
//!
//! # Layout
//!
//! - [`pipeline`]: prompt building, model invocation, reply normalization
//! - [`fallback`]: substitute documents per call site
//! - [`storage`]: SQLite persistence with contention retry
//! - [`service`]: the operations, over a store and a model client
//! - [`server`]: the axum HTTP surface and realtime socket

pub mod config;
pub mod domain;
pub mod fallback;
pub mod llm;
pub mod marketplace;
pub mod pipeline;
pub mod sanitize;
pub mod server;
pub mod service;
pub mod storage;
pub mod telemetry;

pub use config::{AiSettings, ServiceConfig};
pub use llm::{DisabledClient, LlmClient, LlmError, MockClient};
pub use pipeline::AiOutcome;
pub use service::{CarbonTwinService, ServiceError, ServiceResult, SimulationOutcome};
pub use storage::{CarbonStore, OpenStore, RetryPolicy, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
