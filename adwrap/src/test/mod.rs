//! End-to-end integration tests: full marketplace journeys through the HTTP API.

use crate::config::{Config, DummyProcessorConfig, PaymentConfig};
use crate::payment_processors::create_processor;
use crate::test_utils::setup_test_db;
use crate::{AppState, router};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tempfile::TempDir;
use uuid::Uuid;

const USER_HEADER: &str = "x-adwrap-user";

async fn test_server() -> (TestServer, sqlx::SqlitePool, TempDir) {
    test_server_with(Config::default()).await
}

async fn test_server_with(config: Config) -> (TestServer, sqlx::SqlitePool, TempDir) {
    let (pool, dir) = setup_test_db().await;
    let processor = create_processor(&config.payment);
    let state = AppState::builder()
        .db(pool.clone())
        .config(config)
        .processor(processor)
        .build();
    let server = TestServer::new(router(state)).expect("build test server");
    (server, pool, dir)
}

async fn provision_advertiser(server: &TestServer) -> String {
    let response = server
        .post("/api/v1/users")
        .json(&json!({
            "email": format!("ads-{}@example.com", Uuid::new_v4().simple()),
            "type": "advertiser",
            "company_name": "Acme Outdoor",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn provision_driver(server: &TestServer, zips: &[&str]) -> String {
    let response = server
        .post("/api/v1/users")
        .json(&json!({
            "email": format!("driver-{}@example.com", Uuid::new_v4().simple()),
            "type": "driver",
            "full_name": "Sam Doe",
            "zip_codes": zips,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn create_campaign(server: &TestServer, advertiser_id: &str, zips: &[&str]) -> String {
    let response = server
        .post("/api/v1/campaigns")
        .add_header(USER_HEADER, advertiser_id)
        .json(&json!({
            "title": "Coffee wrap",
            "description": "Drive around with our beans",
            "sticker_design": "designs/coffee.svg",
            "sticker_size": "medium",
            "target_zip_codes": zips,
            "monthly_payment": "35.00",
            "max_stickers": 10,
            "is_location_based": !zips.is_empty(),
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

fn bank_account_json() -> Value {
    json!({
        "account_number": "000123456789",
        "routing_number": "021000021",
        "account_holder_name": "Sam Doe",
        "bank_name": "First Example Bank",
    })
}

#[test_log::test(tokio::test)]
async fn full_marketplace_journey() {
    let (server, _pool, _guard) = test_server().await;

    let advertiser = provision_advertiser(&server).await;
    let driver = provision_driver(&server, &["10001"]).await;
    let campaign = create_campaign(&server, &advertiser, &["10001", "10002"]).await;

    // Driver discovers the campaign
    let available = server
        .get("/api/v1/campaigns/available")
        .add_header(USER_HEADER, driver.as_str())
        .await
        .json::<Value>();
    assert_eq!(available.as_array().unwrap().len(), 1);
    assert_eq!(available[0]["id"].as_str().unwrap(), campaign);
    assert_eq!(available[0]["remaining_capacity"], 10);

    // Driver applies
    let application = server
        .post(&format!("/api/v1/campaigns/{campaign}/applications"))
        .add_header(USER_HEADER, driver.as_str())
        .json(&json!({
            "delivery_address": "1 Main St, Springfield",
            "bank_account": bank_account_json(),
        }))
        .await;
    application.assert_status(axum::http::StatusCode::CREATED);
    let application = application.json::<Value>();
    assert_eq!(application["status"], "pending");
    // Bank details never come back in full
    assert_eq!(application["account_last_four"], "6789");
    let application_id = application["id"].as_str().unwrap().to_string();

    // Advertiser reviews and approves
    let listed = server
        .get("/api/v1/applications")
        .add_query_param("campaign_id", &campaign)
        .add_header(USER_HEADER, advertiser.as_str())
        .await
        .json::<Value>();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let approved = server
        .post(&format!("/api/v1/applications/{application_id}/approve"))
        .add_header(USER_HEADER, advertiser.as_str())
        .await
        .json::<Value>();
    assert_eq!(approved["status"], "approved");

    // Driver proves the sticker is mounted
    let verification = server
        .post(&format!("/api/v1/campaigns/{campaign}/verifications"))
        .add_header(USER_HEADER, driver.as_str())
        .json(&json!({"photo_url": "https://photos.example/mounted.jpg"}))
        .await;
    verification.assert_status(axum::http::StatusCode::CREATED);
    let verification_id = verification.json::<Value>()["id"].as_str().unwrap().to_string();

    let reviewed = server
        .post(&format!("/api/v1/verifications/{verification_id}/review"))
        .add_header(USER_HEADER, advertiser.as_str())
        .json(&json!({"approve": true}))
        .await
        .json::<Value>();
    assert_eq!(reviewed["status"], "approved");

    // Run billing as of 40 days out: one verified cycle has come due
    let run = server
        .post("/api/v1/billing/run")
        .json(&json!({"as_of": Utc::now() + Duration::days(40)}))
        .await
        .json::<Value>();
    assert_eq!(run["cycles_processed"], 1);
    assert_eq!(run["charges_created"], 3);
    assert_eq!(run["submitted"], 3);
    assert_eq!(run["settled"], 3);
    assert_eq!(run["overdue"].as_array().unwrap().len(), 0);

    // Driver got the monthly payment
    let driver_payments = server
        .get("/api/v1/payments")
        .add_header(USER_HEADER, driver.as_str())
        .await
        .json::<Value>();
    let driver_payments = driver_payments.as_array().unwrap();
    assert_eq!(driver_payments.len(), 1);
    assert_eq!(driver_payments[0]["payment_type"], "driver_payment");
    assert_eq!(driver_payments[0]["amount"], "35.00");
    assert_eq!(driver_payments[0]["status"], "completed");

    // Advertiser was charged the platform and manufacturing fees
    let advertiser_payments = server
        .get("/api/v1/payments")
        .add_header(USER_HEADER, advertiser.as_str())
        .await
        .json::<Value>();
    let mut amounts: Vec<String> = advertiser_payments
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["amount"].as_str().unwrap().to_string())
        .collect();
    amounts.sort();
    assert_eq!(amounts, vec!["1.50", "10.00"]);

    // Running billing again changes nothing
    let rerun = server
        .post("/api/v1/billing/run")
        .json(&json!({"as_of": Utc::now() + Duration::days(40)}))
        .await
        .json::<Value>();
    assert_eq!(rerun["charges_created"], 0);
    assert_eq!(rerun["submitted"], 0);
}

#[test_log::test(tokio::test)]
async fn missed_verification_withholds_driver_payment() {
    let (server, _pool, _guard) = test_server().await;

    let advertiser = provision_advertiser(&server).await;
    let driver = provision_driver(&server, &["10001"]).await;
    let campaign = create_campaign(&server, &advertiser, &[]).await;

    let application = server
        .post(&format!("/api/v1/campaigns/{campaign}/applications"))
        .add_header(USER_HEADER, driver.as_str())
        .json(&json!({
            "delivery_address": "1 Main St",
            "bank_account": bank_account_json(),
        }))
        .await
        .json::<Value>();
    let application_id = application["id"].as_str().unwrap();
    server
        .post(&format!("/api/v1/applications/{application_id}/approve"))
        .add_header(USER_HEADER, advertiser.as_str())
        .await
        .assert_status_ok();

    // No photo submitted; the cycle comes due overdue
    let run = server
        .post("/api/v1/billing/run")
        .json(&json!({"as_of": Utc::now() + Duration::days(40)}))
        .await
        .json::<Value>();
    assert_eq!(run["charges_created"], 2);
    assert_eq!(run["overdue"].as_array().unwrap().len(), 1);

    let driver_payments = server
        .get("/api/v1/payments")
        .add_header(USER_HEADER, driver.as_str())
        .await
        .json::<Value>();
    assert_eq!(driver_payments.as_array().unwrap().len(), 0);
}

#[test_log::test(tokio::test)]
async fn role_and_identity_are_enforced() {
    let (server, _pool, _guard) = test_server().await;

    let advertiser = provision_advertiser(&server).await;
    let driver = provision_driver(&server, &["10001"]).await;

    // No identity header
    server
        .get("/api/v1/campaigns/available")
        .await
        .assert_status(axum::http::StatusCode::UNAUTHORIZED);

    // Unknown user id
    server
        .get("/api/v1/campaigns/available")
        .add_header(USER_HEADER, Uuid::new_v4().to_string())
        .await
        .assert_status(axum::http::StatusCode::UNAUTHORIZED);

    // Advertisers cannot browse as drivers, drivers cannot create campaigns
    server
        .get("/api/v1/campaigns/available")
        .add_header(USER_HEADER, advertiser.as_str())
        .await
        .assert_status(axum::http::StatusCode::FORBIDDEN);
    server
        .post("/api/v1/campaigns")
        .add_header(USER_HEADER, driver.as_str())
        .json(&json!({
            "title": "Nope",
            "description": "",
            "sticker_design": "d.svg",
            "sticker_size": "small",
            "monthly_payment": "10.00",
            "max_stickers": 1,
        }))
        .await
        .assert_status(axum::http::StatusCode::FORBIDDEN);

    // An advertiser cannot touch another advertiser's campaign
    let campaign = create_campaign(&server, &advertiser, &[]).await;
    let other_advertiser = provision_advertiser(&server).await;
    server
        .patch(&format!("/api/v1/campaigns/{campaign}"))
        .add_header(USER_HEADER, other_advertiser.as_str())
        .json(&json!({"is_active": false}))
        .await
        .assert_status(axum::http::StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn duplicate_application_returns_structured_conflict() {
    let (server, _pool, _guard) = test_server().await;

    let advertiser = provision_advertiser(&server).await;
    let driver = provision_driver(&server, &["10001"]).await;
    let campaign = create_campaign(&server, &advertiser, &[]).await;

    let body = json!({
        "delivery_address": "1 Main St",
        "bank_account": bank_account_json(),
    });
    server
        .post(&format!("/api/v1/campaigns/{campaign}/applications"))
        .add_header(USER_HEADER, driver.as_str())
        .json(&body)
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let conflict = server
        .post(&format!("/api/v1/campaigns/{campaign}/applications"))
        .add_header(USER_HEADER, driver.as_str())
        .json(&body)
        .await;
    conflict.assert_status(axum::http::StatusCode::CONFLICT);
    assert_eq!(conflict.json::<Value>()["kind"], "duplicate_application");
}

#[test_log::test(tokio::test)]
async fn failed_payments_can_be_retried_until_the_budget_runs_out() {
    let mut config = Config::default();
    config.payment = PaymentConfig::Dummy(DummyProcessorConfig { always_fail: true });
    let (server, _pool, _guard) = test_server_with(config).await;

    let advertiser = provision_advertiser(&server).await;
    let driver = provision_driver(&server, &["10001"]).await;
    let campaign = create_campaign(&server, &advertiser, &[]).await;

    let application = server
        .post(&format!("/api/v1/campaigns/{campaign}/applications"))
        .add_header(USER_HEADER, driver.as_str())
        .json(&json!({
            "delivery_address": "1 Main St",
            "bank_account": bank_account_json(),
        }))
        .await
        .json::<Value>();
    let application_id = application["id"].as_str().unwrap();
    server
        .post(&format!("/api/v1/applications/{application_id}/approve"))
        .add_header(USER_HEADER, advertiser.as_str())
        .await
        .assert_status_ok();

    let as_of = Utc::now() + Duration::days(40);
    server.post("/api/v1/billing/run").json(&json!({"as_of": as_of})).await.assert_status_ok();

    let failed = server
        .get("/api/v1/payments")
        .add_query_param("status", "failed")
        .add_header(USER_HEADER, advertiser.as_str())
        .await
        .json::<Value>();
    let payment_id = failed[0]["id"].as_str().unwrap().to_string();
    assert_eq!(failed[0]["attempts"], 1);

    // Two more attempts fit in the default budget of three
    for expected_attempts in [2, 3] {
        let retried = server
            .post(&format!("/api/v1/payments/{payment_id}/retry"))
            .add_header(USER_HEADER, advertiser.as_str())
            .await;
        retried.assert_status_ok();
        assert_eq!(retried.json::<Value>()["status"], "pending");

        server.post("/api/v1/billing/run").json(&json!({"as_of": as_of})).await.assert_status_ok();
        let payments = server
            .get("/api/v1/payments")
            .add_query_param("status", "failed")
            .add_header(USER_HEADER, advertiser.as_str())
            .await
            .json::<Value>();
        let payment = payments
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["id"] == payment_id.as_str())
            .unwrap();
        assert_eq!(payment["attempts"], expected_attempts);
    }

    let exhausted = server
        .post(&format!("/api/v1/payments/{payment_id}/retry"))
        .add_header(USER_HEADER, advertiser.as_str())
        .await;
    exhausted.assert_status(axum::http::StatusCode::CONFLICT);
    assert_eq!(exhausted.json::<Value>()["kind"], "retries_exhausted");
}

#[test_log::test(tokio::test)]
async fn settlement_webhook_is_idempotent() {
    let (server, pool, _guard) = test_server().await;

    let advertiser = provision_advertiser(&server).await;
    let driver = provision_driver(&server, &["10001"]).await;
    let campaign = create_campaign(&server, &advertiser, &[]).await;

    let application = server
        .post(&format!("/api/v1/campaigns/{campaign}/applications"))
        .add_header(USER_HEADER, driver.as_str())
        .json(&json!({
            "delivery_address": "1 Main St",
            "bank_account": bank_account_json(),
        }))
        .await
        .json::<Value>();
    let application_id = application["id"].as_str().unwrap();
    server
        .post(&format!("/api/v1/applications/{application_id}/approve"))
        .add_header(USER_HEADER, advertiser.as_str())
        .await
        .assert_status_ok();

    server
        .post("/api/v1/billing/run")
        .json(&json!({"as_of": Utc::now() + Duration::days(40)}))
        .await
        .assert_status_ok();

    // All payments settled in the run; redeliver a callback for one of them
    let payments = server
        .get("/api/v1/payments")
        .add_header(USER_HEADER, advertiser.as_str())
        .await
        .json::<Value>();
    assert_eq!(payments[0]["status"], "completed");

    let payment_id = payments[0]["id"].as_str().unwrap();
    let processor_ref: String =
        sqlx::query_scalar("SELECT processor_ref FROM payments WHERE id = ?")
            .bind(uuid::Uuid::parse_str(payment_id).unwrap())
            .fetch_one(&pool)
            .await
            .unwrap();

    let redelivered = server
        .post("/api/v1/webhooks/payments")
        .json(&json!({"processor_ref": processor_ref, "status": "succeeded"}))
        .await;
    redelivered.assert_status_ok();
    assert_eq!(redelivered.json::<Value>()["status"], "completed");

    // Unknown reference is rejected
    server
        .post("/api/v1/webhooks/payments")
        .json(&json!({"processor_ref": "dummy_pi_unknown", "status": "succeeded"}))
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn zip_targeted_campaign_must_be_location_based() {
    let (server, _pool, _guard) = test_server().await;
    let advertiser = provision_advertiser(&server).await;

    let response = server
        .post("/api/v1/campaigns")
        .add_header(USER_HEADER, advertiser.as_str())
        .json(&json!({
            "title": "Coffee wrap",
            "description": "Drive around with our beans",
            "sticker_design": "designs/coffee.svg",
            "sticker_size": "medium",
            "target_zip_codes": ["10001"],
            "monthly_payment": "35.00",
            "max_stickers": 10,
            "is_location_based": false,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}
