//! Deterministic substitute documents for when the model is absent or fails.
//!
//! Every substitute carries the same fields as the corresponding generated
//! document, so persistence and API consumers never branch on its origin.
//! Two degraded states are kept apart: "integration absent" (never tried, or
//! the call itself failed) and "reply unparsable" (tried, got garbage).

use crate::domain::{FacilityDescription, ProjectSubmission, ScenarioSpec};
use crate::pipeline::{AiOutcome, NormalizeError};
use crate::sanitize::truncate_chars;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

/// Characters of cleaned reply text quoted back in parse-failure documents.
const QUOTE_CHARS: usize = 500;

// ============================================================================
// Emission verification
// ============================================================================

pub fn emission_absent() -> Value {
    json!({
        "verification_score": 75,
        "confidence_level": "MEDIUM",
        "authenticity_rating": "AUTHENTIC",
        "risk_level": "LOW",
        "red_flags": [],
        "accuracy_issues": [],
        "recommendations": ["AI integration not available - using mock verification"],
        "verified": true,
        "detailed_analysis": "Mock verification result - AI integration not configured",
        "next_steps": ["Configure the AI integration for real verification"],
    })
}

pub fn emission_unparsed(err: &NormalizeError) -> Value {
    json!({
        "verification_score": 50,
        "confidence_level": "LOW",
        "authenticity_rating": "UNCERTAIN",
        "risk_level": "MEDIUM",
        "red_flags": ["AI response parsing error"],
        "accuracy_issues": ["JSON format issue"],
        "recommendations": ["Manual review required", "AI response format error"],
        "verified": false,
        "detailed_analysis": format!(
            "AI provided response but format was invalid: {}",
            truncate_chars(&err.cleaned, QUOTE_CHARS)
        ),
        "next_steps": ["Review AI response manually", "Check API configuration"],
        "raw_ai_response": err.raw,
    })
}

pub fn resolve_emission(outcome: AiOutcome) -> Value {
    match outcome {
        AiOutcome::Generated(doc) => doc,
        AiOutcome::Malformed(err) => emission_unparsed(&err),
        AiOutcome::Unavailable | AiOutcome::UpstreamFailed(_) => emission_absent(),
    }
}

// ============================================================================
// Twin creation
// ============================================================================

/// Timestamp-derived twin identifier with a random suffix, so two twins
/// created within the same second stay distinct.
pub fn generate_twin_id(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("twin_{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..8])
}

/// Low-fidelity baseline model derived from the caller's own figures.
pub fn twin_baseline(facility: &FacilityDescription, twin_id: String) -> Value {
    json!({
        "twin_id": twin_id,
        "baseline_model": {
            "validated_emissions": facility.current_emissions,
            "emission_sources": {"electricity": 60, "heating": 30, "other": 10},
            "energy_efficiency": 50,
            "carbon_intensity": 0.4,
        },
        "monitoring_setup": {
            "key_metrics": ["energy_use", "emissions"],
            "alert_thresholds": {},
            "update_frequency": "HOURLY",
        },
        "simulation_parameters": {
            "adjustable_variables": [],
            "scenario_templates": [],
            "prediction_accuracy": "50%",
        },
        "recommendations": ["Enable AI analysis for better insights"],
        "estimated_setup_time": "1 day",
        "confidence_score": 25,
    })
}

/// Twin creation uses one fallback for every failure kind.
pub fn resolve_twin(outcome: AiOutcome, facility: &FacilityDescription, now: DateTime<Utc>) -> Value {
    match outcome {
        AiOutcome::Generated(doc) if doc.is_object() => doc,
        AiOutcome::Generated(_)
        | AiOutcome::Malformed(_)
        | AiOutcome::Unavailable
        | AiOutcome::UpstreamFailed(_) => twin_baseline(facility, generate_twin_id(now)),
    }
}

// ============================================================================
// Scenario simulation
// ============================================================================

/// Which set of per-index constants to synthesize scenarios from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioTable {
    /// Integration absent or call failed.
    Estimate,
    /// The model replied with something unparsable.
    Recovery,
}

fn estimate_scenario(spec: &ScenarioSpec, i: i64) -> Value {
    let annual = 10_000 - i * 1_500;
    let cost = match spec.implementation_cost {
        Some(c) => json!(c),
        None => json!(50_000 + i * 25_000),
    };
    json!({
        "carbon_impact": {
            "annual_reduction_kg_co2": annual,
            "percentage_reduction": 10 + i * 5,
            "cumulative_5year_reduction": annual * 5,
            "carbon_intensity_improvement": 5 + i * 3,
        },
        "financial_analysis": {
            "implementation_cost": cost,
            "annual_savings": 20_000 + i * 10_000,
            "carbon_credit_revenue": 5_000 + i * 2_500,
            "net_roi_percentage": 25 + i * 10,
            "payback_months": (24 - i * 6).max(6),
        },
        "operational_impact": {
            "efficiency_change": 5 + i * 3,
            "production_impact": "NEUTRAL",
            "maintenance_change": 2 + i,
            "staff_impact": "LOW",
        },
        "risk_assessment": {
            "overall_risk": if i == 0 { "LOW" } else { "MEDIUM" },
            "technical_risk": "LOW",
            "financial_risk": "MEDIUM",
            "operational_risk": "LOW",
            "mitigation_strategies": ["Vendor support", "Phased rollout"],
        },
        "implementation_roadmap": {
            "total_duration_months": 12 + i * 3,
            "phases": [
                {"phase": "Phase 1", "duration_months": 3, "activities": ["Assessment", "Design"], "cost": 10_000, "expected_reduction": 5},
                {"phase": "Phase 2", "duration_months": 6, "activities": ["Procurement", "Installation"], "cost": 30_000, "expected_reduction": 10},
            ],
            "critical_milestones": ["Procurement complete", "Commissioning"],
        },
        "recommendation": if i < 2 { "RECOMMENDED" } else { "CONSIDER" },
        "confidence_score": 70 + i * 10,
    })
}

fn recovery_scenario(i: i64) -> Value {
    let annual = 8_000 + i * 2_000;
    json!({
        "carbon_impact": {
            "annual_reduction_kg_co2": annual,
            "percentage_reduction": 15 + i * 5,
            "cumulative_5year_reduction": annual * 5,
            "carbon_intensity_improvement": 8 + i * 2,
        },
        "financial_analysis": {
            "implementation_cost": 40_000 + i * 15_000,
            "annual_savings": 18_000 + i * 8_000,
            "carbon_credit_revenue": 4_000 + i * 2_000,
            "net_roi_percentage": 20 + i * 8,
            "payback_months": (20 - i * 4).max(8),
        },
        "operational_impact": {
            "efficiency_change": 6 + i * 2,
            "production_impact": "POSITIVE",
            "maintenance_change": 1 + i,
            "staff_impact": "LOW",
        },
        "risk_assessment": {
            "overall_risk": if i == 0 { "LOW" } else { "MEDIUM" },
            "technical_risk": "LOW",
            "financial_risk": "MEDIUM",
            "operational_risk": "LOW",
            "mitigation_strategies": ["Phased implementation", "Training program"],
        },
        "recommendation": if i < 2 { "RECOMMENDED" } else { "CONSIDER" },
        "confidence_score": 65 + i * 10,
    })
}

/// Default rankings: the first scenario wins everything except ROI, which
/// goes to the second when there is one.
pub fn comparative_analysis(specs: &[ScenarioSpec]) -> Value {
    let first = specs
        .first()
        .map(|s| s.display_name(0))
        .unwrap_or_else(|| "N/A".to_string());
    let roi = specs
        .get(1)
        .map(|s| s.display_name(1))
        .unwrap_or_else(|| first.clone());
    json!({
        "best_scenario": first,
        "highest_roi": roi,
        "fastest_payback": first,
        "lowest_risk": first,
    })
}

/// Synthesize a simulation document for `specs`.
pub fn simulation(specs: &[ScenarioSpec], table: ScenarioTable) -> Value {
    let mut results = Map::new();
    for (index, spec) in specs.iter().enumerate() {
        let i = index as i64;
        let doc = match table {
            ScenarioTable::Estimate => estimate_scenario(spec, i),
            ScenarioTable::Recovery => recovery_scenario(i),
        };
        results.insert(spec.display_name(index), doc);
    }

    let recommendations = match table {
        ScenarioTable::Estimate => json!([
            "Prioritize quick-win efficiency upgrades",
            "Plan phased renewable integration",
            "Monitor KPIs monthly",
        ]),
        ScenarioTable::Recovery => json!([
            "AI response parsing failed - using calculated estimates",
            "Consider manual review of scenarios",
            "Verify implementation costs with vendors",
        ]),
    };

    json!({
        "simulation_results": results,
        "comparative_analysis": comparative_analysis(specs),
        "integrated_recommendations": recommendations,
    })
}

pub fn resolve_simulation(outcome: AiOutcome, specs: &[ScenarioSpec]) -> Value {
    match outcome {
        AiOutcome::Generated(doc) => doc,
        AiOutcome::Malformed(err) => {
            let mut doc = simulation(specs, ScenarioTable::Recovery);
            doc["ai_response_error"] = json!(true);
            doc["raw_ai_response"] = json!(truncate_chars(&err.cleaned, QUOTE_CHARS));
            doc
        }
        AiOutcome::Unavailable | AiOutcome::UpstreamFailed(_) => {
            simulation(specs, ScenarioTable::Estimate)
        }
    }
}

// ============================================================================
// Project verification
// ============================================================================

fn project_document(
    project: &ProjectSubmission,
    score: i64,
    status: &str,
    certification: &str,
    confidence: &str,
) -> Value {
    json!({
        "projectVerification": {
            "overallScore": score,
            "verificationStatus": status,
            "certificationRecommendation": certification,
            "confidence": confidence,
        },
        "methodologyAssessment": {
            "appropriate": true,
            "standard": "VCS",
            "baselineAccuracy": 80,
            "issues": [],
        },
        "additionalityScore": 85,
        "permanenceRisk": "MEDIUM",
        "monitoringQuality": {
            "adequacy": "GOOD",
            "frequency": "Annual",
            "methods": ["Remote sensing", "Field surveys"],
        },
        "sustainableDevelopment": {
            "coBenefits": ["Biodiversity protection", "Local employment"],
            "risks": ["Weather dependency"],
            "sdgContribution": ["SDG 13", "SDG 15"],
        },
        "recommendations": ["Improve monitoring frequency", "Add buffer reserves"],
        "requiredImprovements": ["Enhanced documentation"],
        "estimatedCredits": project.expected_reduction,
        "validationTimeline": "6-8 months",
    })
}

/// Conditional, medium-confidence verdict.
pub fn project_absent(project: &ProjectSubmission) -> Value {
    project_document(project, 75, "CONDITIONAL", "VCS", "MEDIUM")
}

pub fn project_unparsed(project: &ProjectSubmission, err: &NormalizeError) -> Value {
    let mut doc = project_document(project, 50, "PENDING", "MANUAL_REVIEW", "LOW");
    doc["error"] = json!("AI response parsing failed");
    doc["raw_response"] = json!(err.raw);
    doc
}

pub fn resolve_project(outcome: AiOutcome, project: &ProjectSubmission) -> Value {
    match outcome {
        AiOutcome::Generated(doc) => doc,
        AiOutcome::Malformed(err) => project_unparsed(project, &err),
        AiOutcome::Unavailable | AiOutcome::UpstreamFailed(_) => project_absent(project),
    }
}
