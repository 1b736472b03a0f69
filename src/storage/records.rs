//! Append-only entities persisted by the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One verification call's input and verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionReport {
    pub company_id: String,
    pub facility_id: String,
    pub reported_emissions: f64,
    pub energy_sources: Vec<String>,
    pub production_volume: f64,
    pub submitted_at: DateTime<Utc>,
    /// 0–100
    pub verification_score: f64,
    pub verified: bool,
    /// Full generated or fallback verification document
    pub analysis: Value,
}

/// A facility model. A new row is written per creation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalTwin {
    pub twin_id: String,
    pub facility_type: String,
    pub size_sqft: f64,
    pub baseline_emissions: f64,
    /// The complete twin document, stored verbatim
    pub current_metrics: Value,
    pub created_at: DateTime<Utc>,
}

/// One scenario's outcome from one simulation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Not checked against `digital_twins`
    pub twin_id: String,
    pub scenario_name: String,
    pub original_emissions: f64,
    pub projected_emissions: f64,
    pub cost_impact: f64,
    pub roi_months: i64,
    pub scenario: Value,
    pub created_at: DateTime<Utc>,
}

/// A marketplace purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonTransaction {
    pub transaction_id: String,
    pub credit_id: String,
    pub buyer_address: String,
    pub amount: f64,
    /// Synthetic reference token; no chain is involved
    pub blockchain_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Row counts across the primary tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub emission_reports: u64,
    pub verified_reports: u64,
    pub digital_twins: u64,
    pub simulation_results: u64,
    pub carbon_transactions: u64,
}
