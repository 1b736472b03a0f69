//! Request payloads resolved into typed records at the HTTP boundary.
//!
//! Each record keeps the caller's original document (`raw`) because the
//! prompts forward it verbatim, and exposes the handful of fields the
//! service actually reads with their defaults already applied.

use crate::sanitize::{display_text, field_f64, is_truthy, string_list};
use serde_json::{Map, Value};

/// Turn an arbitrary JSON document into an object; anything else is empty.
pub fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn text_field(object: &Map<String, Value>, key: &str, default: &str) -> String {
    match object.get(key) {
        Some(Value::Null) | None => default.to_string(),
        Some(v) => display_text(v),
    }
}

/// An emission report submitted for verification.
#[derive(Debug, Clone)]
pub struct EmissionSubmission {
    pub company_id: String,
    pub facility_id: String,
    pub reported_emissions: f64,
    pub energy_sources: Vec<String>,
    pub production_volume: f64,
    raw: Map<String, Value>,
}

impl EmissionSubmission {
    pub fn from_payload(payload: Value) -> Self {
        let raw = as_object(payload);
        let doc = Value::Object(raw.clone());
        Self {
            company_id: text_field(&raw, "company_id", ""),
            facility_id: text_field(&raw, "facility_id", ""),
            reported_emissions: field_f64(&doc, "reported_emissions", 0.0),
            energy_sources: string_list(raw.get("energy_sources")),
            production_volume: field_f64(&doc, "production_volume", 0.0),
            raw,
        }
    }

    /// The caller's document with the sanitized fields written back.
    pub fn to_payload(&self) -> Value {
        let mut doc = self.raw.clone();
        doc.insert("reported_emissions".into(), Value::from(self.reported_emissions));
        doc.insert("production_volume".into(), Value::from(self.production_volume));
        doc.insert(
            "energy_sources".into(),
            Value::Array(self.energy_sources.iter().cloned().map(Value::String).collect()),
        );
        Value::Object(doc)
    }
}

/// Free-form facility description used to create a twin.
#[derive(Debug, Clone)]
pub struct FacilityDescription {
    pub facility_type: String,
    pub size_sqft: f64,
    pub current_emissions: f64,
    raw: Map<String, Value>,
}

impl FacilityDescription {
    pub fn from_payload(payload: Value) -> Self {
        let raw = as_object(payload);
        let doc = Value::Object(raw.clone());
        Self {
            facility_type: text_field(&raw, "type", "Unknown"),
            size_sqft: field_f64(&doc, "size_sqft", 0.0),
            current_emissions: field_f64(&doc, "current_emissions", 0.0),
            raw,
        }
    }

    pub fn to_payload(&self) -> Value {
        Value::Object(self.raw.clone())
    }
}

/// One what-if scenario to run against a twin.
#[derive(Debug, Clone)]
pub struct ScenarioSpec {
    pub name: Option<String>,
    /// `changes.implementation_cost`, when the caller priced the scenario.
    pub implementation_cost: Option<f64>,
    raw: Value,
}

impl ScenarioSpec {
    pub fn from_value(value: Value) -> Self {
        let name = match value.get("name") {
            Some(Value::Null) | None => None,
            Some(v) => Some(display_text(v)),
        };
        let implementation_cost = value
            .get("changes")
            .and_then(|c| c.get("implementation_cost"))
            .map(|c| crate::sanitize::finite_f64(Some(c), 0.0));
        Self {
            name,
            implementation_cost,
            raw: value,
        }
    }

    /// Scenarios carried in a `{scenarios: [...]}` body. Non-list values yield none.
    pub fn list_from_body(body: &Value) -> Vec<Self> {
        match body.get("scenarios") {
            Some(Value::Array(items)) => items.iter().cloned().map(Self::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// Name to key results under; unnamed scenarios are numbered from 1.
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Scenario {}", index + 1))
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// A carbon-offset project submitted for marketplace verification.
#[derive(Debug, Clone)]
pub struct ProjectSubmission {
    pub expected_reduction: f64,
    raw: Map<String, Value>,
}

impl ProjectSubmission {
    pub fn from_payload(payload: Value) -> Self {
        let raw = as_object(payload);
        let expected_reduction = field_f64(&Value::Object(raw.clone()), "expectedReduction", 0.0);
        Self {
            expected_reduction,
            raw,
        }
    }

    pub fn to_payload(&self) -> Value {
        Value::Object(self.raw.clone())
    }
}

/// A validated marketplace purchase.
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub credit_id: String,
    /// The caller's amount, echoed back as-is in the certificate.
    pub amount: Value,
    pub buyer_address: String,
}

impl PurchaseRequest {
    /// Resolve a purchase body, or `None` when any required field is falsy.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let credit = payload.get("creditId");
        let amount = payload.get("amount");
        let buyer = payload.get("buyerAddress");
        if !(is_truthy(credit) && is_truthy(amount) && is_truthy(buyer)) {
            return None;
        }
        Some(Self {
            credit_id: credit.map(display_text)?,
            amount: amount.cloned()?,
            buyer_address: buyer.map(display_text)?,
        })
    }

    /// Numeric amount for the ledger row.
    pub fn amount_f64(&self) -> f64 {
        crate::sanitize::finite_f64(Some(&self.amount), 0.0)
    }
}
