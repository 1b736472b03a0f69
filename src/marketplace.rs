//! Carbon-credit marketplace: demonstration listings and purchase receipts.
//!
//! Listings, stats and holdings are fixed demo data. Purchases are real
//! rows in `carbon_transactions`, but the chain reference is synthetic.

use crate::domain::PurchaseRequest;
use crate::storage::CarbonTransaction;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

pub fn credit_listings() -> Value {
    let credits = json!([
        {
            "id": "credit_001",
            "seller": "0x742d35Cc6634C0532925a3b8D4C9db3C18e5AA3",
            "amount": 1000,
            "pricePerTon": 25,
            "totalPrice": 25000,
            "projectName": "Amazon Rainforest Conservation",
            "projectType": "Forest Conservation",
            "location": "Brazil",
            "vintage": 2024,
            "certification": "VCS (Verified Carbon Standard)",
            "verificationStatus": "verified",
            "description": "Large-scale rainforest conservation project protecting 50,000 hectares of Amazon rainforest from deforestation.",
            "co2Reduced": 1000,
            "projectStart": "2023-01-01",
            "projectEnd": "2030-12-31",
        },
        {
            "id": "credit_002",
            "seller": "0x8ba1f109551bd432803012645hac136c4c78962",
            "amount": 500,
            "pricePerTon": 30,
            "totalPrice": 15000,
            "projectName": "Solar Farm Initiative",
            "projectType": "Renewable Energy",
            "location": "India",
            "vintage": 2024,
            "certification": "Gold Standard",
            "verificationStatus": "verified",
            "description": "Solar energy project replacing coal-powered electricity generation in rural communities.",
            "co2Reduced": 500,
            "projectStart": "2023-06-01",
            "projectEnd": "2028-06-01",
        },
    ]);
    let total = credits.as_array().map(Vec::len).unwrap_or(0);
    json!({ "credits": credits, "total": total })
}

pub fn market_stats() -> Value {
    json!({
        "totalCredits": 2550,
        "totalVolume": 125000,
        "averagePrice": 26.5,
        "totalCO2Offset": 2550,
        "activeListings": 12,
        "completedTrades": 38,
        "topProjects": [
            {"name": "Amazon Conservation", "volume": 45},
            {"name": "Solar Energy", "volume": 32},
            {"name": "Wind Farms", "volume": 23},
        ],
        "priceHistory": [
            {"date": "2024-01", "price": 24.5},
            {"date": "2024-02", "price": 25.2},
            {"date": "2024-03", "price": 26.1},
            {"date": "2024-04", "price": 26.8},
        ],
    })
}

pub fn holdings(address: &str) -> Value {
    let credits = [
        ("cert_20240823_001", "Amazon Conservation", 50, "2024-08-01"),
        ("cert_20240823_002", "Solar Farm Initiative", 25, "2024-07-15"),
    ];
    let total_offset: i64 = credits.iter().map(|c| c.2).sum();
    let items: Vec<Value> = credits
        .iter()
        .map(|(id, project, amount, date)| {
            json!({
                "certificateId": id,
                "projectName": project,
                "amount": amount,
                "purchaseDate": date,
                "retirementStatus": "active",
                "co2Offset": amount,
            })
        })
        .collect();
    json!({
        "credits": items,
        "totalCredits": credits.len(),
        "totalCO2Offset": total_offset,
        "address": address,
    })
}

/// A completed purchase: the ledger row plus the caller-facing receipt.
pub struct Purchase {
    pub transaction: CarbonTransaction,
    pub receipt: Value,
}

/// Build the ledger row and receipt for a validated purchase.
pub fn settle(request: &PurchaseRequest, now: DateTime<Utc>) -> Purchase {
    let stamp = now.format("%Y%m%d_%H%M%S");
    let token = uuid::Uuid::new_v4().simple().to_string();
    let transaction_id = format!("tx_{}_{}", stamp, &token[..8]);
    let blockchain_hash = format!("0x{}", token);

    let receipt = json!({
        "transactionId": transaction_id,
        "creditId": request.credit_id,
        "amount": request.amount,
        "buyerAddress": request.buyer_address,
        "status": "completed",
        "blockchainHash": blockchain_hash,
        "timestamp": now.to_rfc3339(),
        "carbonCertificate": {
            "certificateId": format!("cert_{}_{}", stamp, &token[8..16]),
            "co2Offset": request.amount,
            "issuedTo": request.buyer_address,
            "projectId": request.credit_id,
            "retirementStatus": "active",
        },
    });

    Purchase {
        transaction: CarbonTransaction {
            transaction_id,
            credit_id: request.credit_id.clone(),
            buyer_address: request.buyer_address.clone(),
            amount: request.amount_f64(),
            blockchain_hash,
            created_at: now,
        },
        receipt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_report_their_count() {
        let doc = credit_listings();
        assert_eq!(doc["total"], 2);
        assert_eq!(doc["credits"][0]["id"], "credit_001");
    }

    #[test]
    fn holdings_echo_address_and_sum_offsets() {
        let doc = holdings("0xbuyer");
        assert_eq!(doc["address"], "0xbuyer");
        assert_eq!(doc["totalCredits"], 2);
        assert_eq!(doc["totalCO2Offset"], 75);
    }

    #[test]
    fn settle_echoes_amount_into_certificate() {
        let request = PurchaseRequest::from_payload(
            &json!({"creditId": "credit_002", "amount": 12.5, "buyerAddress": "0xbuyer"}),
        )
        .unwrap();
        let now = Utc::now();
        let purchase = settle(&request, now);

        assert_eq!(purchase.receipt["carbonCertificate"]["co2Offset"], 12.5);
        assert_eq!(purchase.receipt["status"], "completed");
        assert_eq!(purchase.transaction.amount, 12.5);
        assert_eq!(
            purchase.receipt["transactionId"],
            purchase.transaction.transaction_id.as_str()
        );
        assert!(purchase.transaction.blockchain_hash.starts_with("0x"));

        let again = settle(&request, now);
        assert_ne!(again.transaction.transaction_id, purchase.transaction.transaction_id);
    }
}
