//! Prompt templates for the four AI-backed call sites.
//!
//! The required output schema is communicated as instruction text only;
//! nothing here validates the payload or the reply.

use crate::llm::{CompletionRequest, DecodingParams};
use serde_json::Value;

/// System instruction shared by every call site.
pub const SYSTEM_INSTRUCTION: &str = "You must respond with ONLY a valid JSON object. \
No explanations, no text, no markdown, no greetings. Start your response with { and end with }. \
Any response that is not pure JSON will cause system failure.";

/// The places in the service that ask the model for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallSite {
    EmissionVerification,
    TwinCreation,
    ScenarioSimulation,
    ProjectVerification,
}

impl CallSite {
    pub const ALL: [CallSite; 4] = [
        CallSite::EmissionVerification,
        CallSite::TwinCreation,
        CallSite::ScenarioSimulation,
        CallSite::ProjectVerification,
    ];

    /// Stable label used in logs and by mock clients.
    pub fn label(self) -> &'static str {
        match self {
            CallSite::EmissionVerification => "emission_verification",
            CallSite::TwinCreation => "twin_creation",
            CallSite::ScenarioSimulation => "scenario_simulation",
            CallSite::ProjectVerification => "project_verification",
        }
    }

    /// Output budget for the call.
    pub fn max_tokens(self) -> u32 {
        match self {
            CallSite::EmissionVerification => 1000,
            CallSite::TwinCreation => 1200,
            CallSite::ScenarioSimulation => 2000,
            CallSite::ProjectVerification => 1500,
        }
    }

    fn preamble(self) -> &'static str {
        match self {
            CallSite::ScenarioSimulation => {
                "CRITICAL: Your response must be ONLY a JSON object. Start with { and end with }. \
No other text allowed.\n\nAnalyze these scenarios and return this exact JSON structure:"
            }
            _ => "Return ONLY this JSON structure:",
        }
    }

    /// JSON skeleton with typed placeholders.
    pub fn schema(self) -> &'static str {
        match self {
            CallSite::EmissionVerification => EMISSION_SCHEMA,
            CallSite::TwinCreation => TWIN_SCHEMA,
            CallSite::ScenarioSimulation => SIMULATION_SCHEMA,
            CallSite::ProjectVerification => PROJECT_SCHEMA,
        }
    }
}

impl std::fmt::Display for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A labelled document embedded after the schema (`Report: {...}`).
pub struct Section<'a> {
    pub heading: &'a str,
    pub body: &'a Value,
}

/// Build the system/user pair for a call site.
pub fn build(site: CallSite, sections: &[Section<'_>]) -> CompletionRequest {
    let mut user = format!("{}\n\n{}\n", site.preamble(), site.schema());
    for section in sections {
        user.push('\n');
        user.push_str(section.heading);
        user.push_str(": ");
        // Value serialization cannot fail
        user.push_str(&section.body.to_string());
    }

    CompletionRequest {
        label: site.label().to_string(),
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
        params: DecodingParams::json_mode(site.max_tokens()),
    }
}

const EMISSION_SCHEMA: &str = r#"{
    "verification_score": number_0_to_100,
    "confidence_level": "HIGH",
    "authenticity_rating": "AUTHENTIC",
    "risk_level": "LOW",
    "red_flags": ["issue1", "issue2"],
    "accuracy_issues": ["problem1", "problem2"],
    "recommendations": ["rec1", "rec2"],
    "verified": true,
    "detailed_analysis": "analysis text",
    "next_steps": ["step1", "step2"]
}"#;

const TWIN_SCHEMA: &str = r#"{
    "twin_id": "unique_twin_id",
    "baseline_model": {
        "validated_emissions": number,
        "emission_sources": {"electricity": 60, "heating": 30, "other": 10},
        "energy_efficiency": number_0_to_100,
        "carbon_intensity": number
    },
    "monitoring_setup": {
        "key_metrics": ["energy_use", "emissions"],
        "alert_thresholds": {},
        "update_frequency": "HOURLY"
    },
    "simulation_parameters": {
        "adjustable_variables": ["variable1", "variable2"],
        "scenario_templates": ["template1", "template2"],
        "prediction_accuracy": "percentage"
    },
    "recommendations": ["rec1", "rec2"],
    "estimated_setup_time": "time_estimate",
    "confidence_score": number_0_to_100
}"#;

const SIMULATION_SCHEMA: &str = r#"{
    "simulation_results": {
        "scenario_name": {
            "carbon_impact": {
                "annual_reduction_kg_co2": number,
                "percentage_reduction": number,
                "cumulative_5year_reduction": number,
                "carbon_intensity_improvement": number
            },
            "financial_analysis": {
                "implementation_cost": number,
                "annual_savings": number,
                "carbon_credit_revenue": number,
                "net_roi_percentage": number,
                "payback_months": number
            },
            "operational_impact": {
                "efficiency_change": number,
                "production_impact": "POSITIVE",
                "maintenance_change": number,
                "staff_impact": "LOW"
            },
            "risk_assessment": {
                "overall_risk": "LOW",
                "technical_risk": "LOW",
                "financial_risk": "MEDIUM",
                "operational_risk": "LOW",
                "mitigation_strategies": ["strategy1", "strategy2"]
            },
            "recommendation": "RECOMMENDED",
            "confidence_score": number
        }
    },
    "comparative_analysis": {
        "best_scenario": "scenario_name",
        "highest_roi": "scenario_name",
        "fastest_payback": "scenario_name",
        "lowest_risk": "scenario_name"
    },
    "integrated_recommendations": ["recommendation1", "recommendation2"]
}"#;

const PROJECT_SCHEMA: &str = r#"{
  "projectVerification": {
    "overallScore": number_0_to_100,
    "verificationStatus": "VERIFIED",
    "certificationRecommendation": "VCS",
    "confidence": "HIGH"
  },
  "methodologyAssessment": {
    "appropriate": true,
    "standard": "VCS",
    "baselineAccuracy": number_0_to_100,
    "issues": ["issue1", "issue2"]
  },
  "additionalityScore": number_0_to_100,
  "permanenceRisk": "LOW",
  "monitoringQuality": {
    "adequacy": "GOOD",
    "frequency": "Annual",
    "indicators": ["indicator1", "indicator2"]
  },
  "riskFactors": ["risk1", "risk2"],
  "recommendations": ["rec1", "rec2"]
}"#;
