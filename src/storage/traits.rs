//! Storage trait definitions

use super::records::{CarbonTransaction, DigitalTwin, EmissionReport, RecordCounts, SimulationResult};
use rusqlite::ErrorCode;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Transient lock contention from another writer; safe to retry.
    pub fn is_contention(&self) -> bool {
        match self {
            StorageError::Database(e) => matches!(
                e.sqlite_error_code(),
                Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }

    /// A UNIQUE or other constraint rejected the write.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            StorageError::Database(e) => {
                matches!(e.sqlite_error_code(), Some(ErrorCode::ConstraintViolation))
            }
            _ => false,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for the service's append-only store
///
/// Implementations must be thread-safe (Send + Sync); handlers share one
/// store across requests.
pub trait CarbonStore: Send + Sync {
    /// Append a verified emission report, returning its row id
    fn insert_emission_report(&self, report: &EmissionReport) -> StorageResult<i64>;

    /// Append a digital twin row
    fn insert_digital_twin(&self, twin: &DigitalTwin) -> StorageResult<i64>;

    /// Load the stored twin document for `twin_id`, newest first
    fn load_twin_document(&self, twin_id: &str) -> StorageResult<Option<Value>>;

    /// Append one scenario outcome
    fn insert_simulation_result(&self, result: &SimulationResult) -> StorageResult<i64>;

    /// Append a marketplace transaction
    fn insert_transaction(&self, transaction: &CarbonTransaction) -> StorageResult<i64>;

    /// Count rows across the primary tables
    fn counts(&self) -> StorageResult<RecordCounts>;

    /// Cheap reachability probe used by `/health`
    fn ping(&self) -> StorageResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: CarbonStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
