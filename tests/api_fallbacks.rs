//! Degraded-mode behaviour of the model-backed endpoints.
//!
//! Run with: `cargo test --test api_fallbacks`

mod common;

use axum::http::StatusCode;
use carbontwin::MockClient;
use common::{app, post};
use serde_json::json;

// ============================================================================
// Integration absent
// ============================================================================

#[tokio::test]
async fn unconfigured_integration_returns_absent_shapes() {
    let app = app(MockClient::unavailable());

    let (status, verdict) = post(&app, "/api/verify-emission", r#"{"company_id": "acme"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["verification_score"], 75);
    assert_eq!(verdict["verified"], true);
    assert!(verdict.get("raw_ai_response").is_none());

    let (status, twin) = post(&app, "/api/create-twin", r#"{"current_emissions": 4200}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(twin["confidence_score"], 25);
    assert_eq!(twin["baseline_model"]["validated_emissions"], 4200.0);

    let twin_id = twin["twin_id"].as_str().unwrap();
    let (status, sim) = post(
        &app,
        &format!("/api/simulate/{twin_id}"),
        r#"{"scenarios": [{"name": "LED"}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sim["simulation_results"]["LED"]["confidence_score"], 70);
    assert!(sim.get("ai_response_error").is_none());

    let (status, project) = post(
        &app,
        "/api/marketplace/verify-project",
        r#"{"expectedReduction": 1500}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["projectVerification"]["overallScore"], 75);
    assert_eq!(project["projectVerification"]["verificationStatus"], "CONDITIONAL");
    assert_eq!(project["estimatedCredits"], 1500.0);
}

#[tokio::test]
async fn upstream_failure_uses_absent_shape() {
    let app = app(
        MockClient::available().with_failure("emission_verification", "HTTP 503 Service Unavailable"),
    );
    let (status, verdict) = post(&app, "/api/verify-emission", "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["verification_score"], 75);
}

#[tokio::test]
async fn upstream_failure_in_simulation_uses_estimates() {
    let app = app(
        MockClient::available()
            .with_failure("scenario_simulation", "request timed out")
            .with_failure("twin_creation", "request timed out"),
    );
    let (_, twin) = post(&app, "/api/create-twin", "{}").await;
    let twin_id = twin["twin_id"].as_str().unwrap();

    let (status, sim) = post(
        &app,
        &format!("/api/simulate/{twin_id}"),
        r#"{"scenarios": [{"name": "Heat pumps"}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sim["simulation_results"]["Heat pumps"]["confidence_score"], 70);
    assert!(sim.get("ai_response_error").is_none());
    assert!(sim.get("raw_ai_response").is_none());
}

#[tokio::test]
async fn upstream_failure_in_project_verification_is_conditional() {
    let app = app(
        MockClient::available().with_failure("project_verification", "HTTP 502 Bad Gateway"),
    );
    let (status, project) = post(
        &app,
        "/api/marketplace/verify-project",
        r#"{"expectedReduction": 800}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["projectVerification"]["overallScore"], 75);
    assert_eq!(project["projectVerification"]["verificationStatus"], "CONDITIONAL");
    assert!(project.get("raw_response").is_none());
}

// ============================================================================
// Reply unparsable
// ============================================================================

#[tokio::test]
async fn prose_reply_returns_parse_failed_shapes() {
    let prose = "Sure! Here is my analysis of your facility.";
    let app = app(
        MockClient::available()
            .with_reply("emission_verification", prose)
            .with_reply("twin_creation", prose)
            .with_reply("scenario_simulation", prose)
            .with_reply("project_verification", prose),
    );

    let (status, verdict) = post(&app, "/api/verify-emission", "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["verification_score"], 50);
    assert_eq!(verdict["verified"], false);
    assert_eq!(verdict["raw_ai_response"], prose);

    let (status, twin) = post(&app, "/api/create-twin", r#"{"type": "Warehouse"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(twin["confidence_score"], 25);

    let twin_id = twin["twin_id"].as_str().unwrap();
    let (status, sim) = post(
        &app,
        &format!("/api/simulate/{twin_id}"),
        r#"{"scenarios": [{"name": "Solar"}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sim["ai_response_error"], true);
    assert_eq!(sim["raw_ai_response"], prose);
    assert_eq!(sim["simulation_results"]["Solar"]["confidence_score"], 65);

    let (status, project) = post(&app, "/api/marketplace/verify-project", "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["projectVerification"]["overallScore"], 50);
    assert_eq!(project["projectVerification"]["verificationStatus"], "PENDING");
    assert_eq!(project["raw_response"], prose);
}

#[tokio::test]
async fn fenced_reply_is_used_verbatim() {
    let reply = "```json\n{\"verification_score\": 91, \"verified\": true}\n```";
    let app = app(MockClient::available().with_reply("emission_verification", reply));
    let (_, verdict) = post(&app, "/api/verify-emission", "{}").await;
    assert_eq!(verdict, json!({"verification_score": 91, "verified": true}));
}

// ============================================================================
// Scenario ranking and twin ids
// ============================================================================

#[tokio::test]
async fn two_scenario_fallback_ranks_by_position() {
    let app = app(MockClient::unavailable());
    let (_, twin) = post(&app, "/api/create-twin", "{}").await;
    let twin_id = twin["twin_id"].as_str().unwrap();

    let (_, sim) = post(
        &app,
        &format!("/api/simulate/{twin_id}"),
        r#"{"scenarios": [{"name": "A"}, {"name": "B"}]}"#,
    )
    .await;

    let keys: Vec<&String> = sim["simulation_results"].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().any(|k| *k == "A"));
    assert!(keys.iter().any(|k| *k == "B"));
    assert_eq!(sim["comparative_analysis"]["best_scenario"], "A");
    assert_eq!(sim["comparative_analysis"]["highest_roi"], "B");
}

#[tokio::test]
async fn created_twins_get_distinct_ids() {
    let app = app(MockClient::unavailable());
    let (_, first) = post(&app, "/api/create-twin", "{}").await;
    let (_, second) = post(&app, "/api/create-twin", "{}").await;

    let first = first["twin_id"].as_str().unwrap();
    let second = second["twin_id"].as_str().unwrap();
    assert!(first.starts_with("twin_"));
    assert_ne!(first, second);
}

#[tokio::test]
async fn unparsable_body_is_treated_as_empty() {
    let app = app(MockClient::unavailable());
    let (status, twin) = post(&app, "/api/create-twin", "{not json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(twin["baseline_model"]["validated_emissions"], 0.0);
}
