//! SQLite storage backend for CarbonTwin

use super::records::{CarbonTransaction, DigitalTwin, EmissionReport, RecordCounts, SimulationResult};
use super::traits::{CarbonStore, OpenStore, StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// How long SQLite itself waits on a lock before reporting busy.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// SQLite-backed store
///
/// Uses a single database file with one append-only table per entity.
/// Thread-safe via internal mutex on the connection; cross-process writers
/// are serialized by SQLite's own locking, surfacing as busy errors that
/// callers retry (see `storage::retry`).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    ///
    /// Idempotent: every statement is `IF NOT EXISTS`, so reopening an
    /// existing database is a no-op.
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS emission_reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id TEXT NOT NULL,
                facility_id TEXT NOT NULL,
                reported_emissions REAL NOT NULL,
                energy_sources TEXT NOT NULL,
                production_volume REAL NOT NULL,
                timestamp TEXT NOT NULL,
                verification_score REAL NOT NULL DEFAULT 0.0,
                verified INTEGER NOT NULL DEFAULT 0,
                ai_analysis TEXT
            );

            CREATE TABLE IF NOT EXISTS digital_twins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                twin_id TEXT UNIQUE NOT NULL,
                facility_type TEXT NOT NULL,
                size_sqft REAL NOT NULL,
                baseline_emissions REAL NOT NULL,
                current_metrics TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS simulation_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                twin_id TEXT NOT NULL,
                scenario_name TEXT NOT NULL,
                original_emissions REAL NOT NULL,
                projected_emissions REAL NOT NULL,
                cost_impact REAL NOT NULL,
                roi_months INTEGER NOT NULL,
                ai_recommendations TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_simulation_results_twin
                ON simulation_results(twin_id);

            CREATE TABLE IF NOT EXISTS carbon_transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                transaction_id TEXT UNIQUE NOT NULL,
                credit_id TEXT NOT NULL,
                buyer_address TEXT NOT NULL,
                amount REAL NOT NULL,
                blockchain_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- WAL lets the health probe and lookups read during writes
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Override how long SQLite blocks on a held lock before returning busy.
    pub fn set_busy_timeout(&self, timeout: Duration) -> StorageResult<()> {
        self.lock()?.busy_timeout(timeout)?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn count(conn: &Connection, sql: &str) -> StorageResult<u64> {
        let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl CarbonStore for SqliteStore {
    fn insert_emission_report(&self, report: &EmissionReport) -> StorageResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO emission_reports (company_id, facility_id, reported_emissions, energy_sources,
                                          production_volume, timestamp, verification_score, verified, ai_analysis)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                report.company_id,
                report.facility_id,
                report.reported_emissions,
                serde_json::to_string(&report.energy_sources)?,
                report.production_volume,
                report.submitted_at.to_rfc3339(),
                report.verification_score,
                report.verified,
                serde_json::to_string(&report.analysis)?,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_digital_twin(&self, twin: &DigitalTwin) -> StorageResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO digital_twins (twin_id, facility_type, size_sqft, baseline_emissions, current_metrics, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                twin.twin_id,
                twin.facility_type,
                twin.size_sqft,
                twin.baseline_emissions,
                serde_json::to_string(&twin.current_metrics)?,
                twin.created_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn load_twin_document(&self, twin_id: &str) -> StorageResult<Option<Value>> {
        let conn = self.lock()?;
        let row: Option<String> = conn
            .query_row(
                "SELECT current_metrics FROM digital_twins WHERE twin_id = ?1 ORDER BY id DESC LIMIT 1",
                params![twin_id],
                |row| row.get(0),
            )
            .optional()?;

        match row {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn insert_simulation_result(&self, result: &SimulationResult) -> StorageResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO simulation_results (twin_id, scenario_name, original_emissions, projected_emissions,
                                            cost_impact, roi_months, ai_recommendations, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                result.twin_id,
                result.scenario_name,
                result.original_emissions,
                result.projected_emissions,
                result.cost_impact,
                result.roi_months,
                serde_json::to_string(&result.scenario)?,
                result.created_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_transaction(&self, transaction: &CarbonTransaction) -> StorageResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO carbon_transactions (transaction_id, credit_id, buyer_address, amount, blockchain_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                transaction.transaction_id,
                transaction.credit_id,
                transaction.buyer_address,
                transaction.amount,
                transaction.blockchain_hash,
                transaction.created_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn counts(&self) -> StorageResult<RecordCounts> {
        let conn = self.lock()?;
        Ok(RecordCounts {
            emission_reports: Self::count(&conn, "SELECT COUNT(*) FROM emission_reports")?,
            verified_reports: Self::count(&conn, "SELECT COUNT(*) FROM emission_reports WHERE verified = 1")?,
            digital_twins: Self::count(&conn, "SELECT COUNT(*) FROM digital_twins")?,
            simulation_results: Self::count(&conn, "SELECT COUNT(*) FROM simulation_results")?,
            carbon_transactions: Self::count(&conn, "SELECT COUNT(*) FROM carbon_transactions")?,
        })
    }

    fn ping(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn create_test_twin(twin_id: &str, baseline: f64) -> DigitalTwin {
        DigitalTwin {
            twin_id: twin_id.to_string(),
            facility_type: "warehouse".to_string(),
            size_sqft: 12_000.0,
            baseline_emissions: baseline,
            current_metrics: json!({"twin_id": twin_id, "baseline_model": {"validated_emissions": baseline}}),
            created_at: Utc::now(),
        }
    }

    fn create_test_report(verified: bool) -> EmissionReport {
        EmissionReport {
            company_id: "acme".to_string(),
            facility_id: "plant-a".to_string(),
            reported_emissions: 1200.0,
            energy_sources: vec!["grid".to_string(), "solar".to_string()],
            production_volume: 300.0,
            submitted_at: Utc::now(),
            verification_score: 75.0,
            verified,
            analysis: json!({"verified": verified}),
        }
    }

    #[test]
    fn test_schema_init_is_idempotent() {
        let store = create_test_store();
        let conn = store.lock().unwrap();
        SqliteStore::init_schema(&conn).unwrap();
        SqliteStore::init_schema(&conn).unwrap();
    }

    #[test]
    fn test_reopening_file_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("carbontwin.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_digital_twin(&create_test_twin("twin_a", 10.0)).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.load_twin_document("twin_a").unwrap().is_some());
        assert_eq!(store.counts().unwrap().digital_twins, 1);
    }

    #[test]
    fn test_twin_round_trip() {
        let store = create_test_store();
        let twin = create_test_twin("twin_1", 950.5);
        store.insert_digital_twin(&twin).unwrap();

        let doc = store.load_twin_document("twin_1").unwrap().unwrap();
        assert_eq!(doc, twin.current_metrics);
        assert!(store.load_twin_document("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_twin_id_is_rejected() {
        let store = create_test_store();
        store.insert_digital_twin(&create_test_twin("dup", 1.0)).unwrap();
        let err = store.insert_digital_twin(&create_test_twin("dup", 2.0)).unwrap_err();
        assert!(!err.is_contention());
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_counts_track_verified_reports() {
        let store = create_test_store();
        store.insert_emission_report(&create_test_report(true)).unwrap();
        store.insert_emission_report(&create_test_report(false)).unwrap();
        store.insert_emission_report(&create_test_report(true)).unwrap();

        let counts = store.counts().unwrap();
        assert_eq!(counts.emission_reports, 3);
        assert_eq!(counts.verified_reports, 2);
        assert_eq!(counts.digital_twins, 0);
    }

    #[test]
    fn test_simulation_rows_do_not_require_twin() {
        let store = create_test_store();
        let row = SimulationResult {
            twin_id: "never-created".to_string(),
            scenario_name: "Solar".to_string(),
            original_emissions: 1000.0,
            projected_emissions: 800.0,
            cost_impact: 50_000.0,
            roi_months: 24,
            scenario: json!({}),
            created_at: Utc::now(),
        };
        store.insert_simulation_result(&row).unwrap();
        assert_eq!(store.counts().unwrap().simulation_results, 1);
    }

    #[test]
    fn test_transaction_insert_and_ping() {
        let store = create_test_store();
        store.ping().unwrap();
        let tx = CarbonTransaction {
            transaction_id: "tx_1".to_string(),
            credit_id: "credit_001".to_string(),
            buyer_address: "0xabc".to_string(),
            amount: 10.0,
            blockchain_hash: "0xdeadbeef".to_string(),
            created_at: Utc::now(),
        };
        store.insert_transaction(&tx).unwrap();
        assert_eq!(store.counts().unwrap().carbon_transactions, 1);
    }

    #[test]
    fn test_held_write_lock_surfaces_as_contention() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.db");
        let store = SqliteStore::open(&path).unwrap();
        store.set_busy_timeout(Duration::ZERO).unwrap();

        let other = Connection::open(&path).unwrap();
        other.execute_batch("BEGIN EXCLUSIVE;").unwrap();

        let err = store.insert_digital_twin(&create_test_twin("t", 1.0)).unwrap_err();
        assert!(err.is_contention(), "unexpected error: {err}");

        other.execute_batch("COMMIT;").unwrap();
        store.insert_digital_twin(&create_test_twin("t", 1.0)).unwrap();
    }
}
