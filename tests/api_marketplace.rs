//! Carbon-credit marketplace endpoints.

mod common;

use axum::http::StatusCode;
use carbontwin::MockClient;
use common::{app, get, post};

#[tokio::test]
async fn purchase_with_missing_fields_is_rejected() {
    let app = app(MockClient::unavailable());
    for body in [
        r#"{"amount": 5, "buyerAddress": "0xabc"}"#,
        r#"{"creditId": "credit_001", "amount": null, "buyerAddress": "0xabc"}"#,
        r#"{"creditId": "", "amount": 5, "buyerAddress": "0xabc"}"#,
        r#"{"creditId": "credit_001", "amount": 0, "buyerAddress": "0xabc"}"#,
        r#"{"creditId": "credit_001", "amount": 5, "buyerAddress": false}"#,
        "",
    ] {
        let (status, reply) = post(&app, "/api/marketplace/purchase", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(reply["error"], "Missing required fields");
    }
}

#[tokio::test]
async fn purchase_issues_certificate_for_amount() {
    let app = app(MockClient::unavailable());
    let (status, reply) = post(
        &app,
        "/api/marketplace/purchase",
        r#"{"creditId": "credit_001", "amount": 42, "buyerAddress": "0xbuyer"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], true);
    let tx = &reply["transaction"];
    assert_eq!(tx["status"], "completed");
    assert_eq!(tx["carbonCertificate"]["co2Offset"], tx["amount"]);
    assert_eq!(tx["carbonCertificate"]["co2Offset"], 42);
    assert_eq!(tx["carbonCertificate"]["issuedTo"], "0xbuyer");
    assert!(tx["transactionId"].as_str().unwrap().starts_with("tx_"));
    assert_eq!(reply["message"], "Successfully purchased 42 tons of carbon credits");
}

#[tokio::test]
async fn static_marketplace_views() {
    let app = app(MockClient::unavailable());

    let (status, credits) = get(&app, "/api/marketplace/credits").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(credits["total"], 2);
    assert_eq!(credits["credits"][1]["projectName"], "Solar Farm Initiative");

    let (_, stats) = get(&app, "/api/marketplace/stats").await;
    assert_eq!(stats["totalCredits"], 2550);
    assert_eq!(stats["averagePrice"], 26.5);

    let (_, mine) = get(&app, "/api/marketplace/my-credits/0xholder").await;
    assert_eq!(mine["address"], "0xholder");
    assert_eq!(mine["totalCO2Offset"], 75);
}

#[tokio::test]
async fn generated_project_verdict_passes_through() {
    let app = app(MockClient::available().with_reply(
        "project_verification",
        r#"{"projectVerification": {"overallScore": 88, "verificationStatus": "APPROVED"}}"#,
    ));
    let (status, project) = post(&app, "/api/marketplace/verify-project", r#"{"name": "Mangroves"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["projectVerification"]["overallScore"], 88);
}
