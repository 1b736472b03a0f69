//! Storage backends for CarbonTwin
//!
//! The service writes through the `CarbonStore` trait. The primary
//! implementation is `SqliteStore`; every call from the service goes
//! through `retry::with_retry` so busy/locked conditions are retried.

mod records;
pub mod retry;
mod sqlite;
mod traits;

pub use records::{CarbonTransaction, DigitalTwin, EmissionReport, RecordCounts, SimulationResult};
pub use retry::{with_retry, RetryPolicy};
pub use sqlite::{SqliteStore, DEFAULT_BUSY_TIMEOUT};
pub use traits::{CarbonStore, OpenStore, StorageError, StorageResult};
