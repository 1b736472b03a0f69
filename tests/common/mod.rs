//! Common test utilities for CarbonTwin integration tests
//!
//! Builds the service over an in-memory store and a `MockClient`, drives
//! the router in-process, and provides a store that fails on demand.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use carbontwin::storage::{
    CarbonTransaction, DigitalTwin, EmissionReport, RecordCounts, SimulationResult,
};
use carbontwin::{
    CarbonStore, CarbonTwinService, LlmClient, OpenStore, RetryPolicy, SqliteStore, StorageError,
    StorageResult,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Retry policy with millisecond backoff so contention tests stay fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::default().with_base_backoff(Duration::from_millis(5))
}

pub fn service_over(store: Arc<dyn CarbonStore>, llm: impl LlmClient + 'static) -> Arc<CarbonTwinService> {
    Arc::new(CarbonTwinService::new(store, Arc::new(llm)).with_retry_policy(fast_retry()))
}

pub fn memory_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().expect("in-memory store"))
}

pub fn app(llm: impl LlmClient + 'static) -> Router {
    carbontwin::server::router(service_over(memory_store(), llm))
}

/// Send one request through the router and decode the JSON reply.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

fn busy() -> StorageError {
    StorageError::from(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        None,
    ))
}

/// A store that reports `SQLITE_BUSY` for its first `failures` calls, then
/// delegates to an in-memory `SqliteStore`.
pub struct FlakyStore {
    inner: SqliteStore,
    failures_left: AtomicU32,
    calls: AtomicU32,
}

impl FlakyStore {
    pub fn new(failures: u32) -> Self {
        Self {
            inner: SqliteStore::open_in_memory().expect("in-memory store"),
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    /// Calls received so far, failed ones included.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &SqliteStore {
        &self.inner
    }

    fn gate(&self) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(busy());
        }
        Ok(())
    }
}

impl CarbonStore for FlakyStore {
    fn insert_emission_report(&self, report: &EmissionReport) -> StorageResult<i64> {
        self.gate()?;
        self.inner.insert_emission_report(report)
    }

    fn insert_digital_twin(&self, twin: &DigitalTwin) -> StorageResult<i64> {
        self.gate()?;
        self.inner.insert_digital_twin(twin)
    }

    fn load_twin_document(&self, twin_id: &str) -> StorageResult<Option<Value>> {
        self.gate()?;
        self.inner.load_twin_document(twin_id)
    }

    fn insert_simulation_result(&self, result: &SimulationResult) -> StorageResult<i64> {
        self.gate()?;
        self.inner.insert_simulation_result(result)
    }

    fn insert_transaction(&self, transaction: &CarbonTransaction) -> StorageResult<i64> {
        self.gate()?;
        self.inner.insert_transaction(transaction)
    }

    fn counts(&self) -> StorageResult<RecordCounts> {
        self.gate()?;
        self.inner.counts()
    }

    fn ping(&self) -> StorageResult<()> {
        self.gate()?;
        self.inner.ping()
    }
}
