//! Integration tests for the AgriChain API
//!
//! Runs the full router against the in-memory store, end to end through
//! HTTP: auth, role gating, the ledger operations and traceability.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use agrichain_api::{create_router, AppState, JwtConfig};
use agrichain_store::{ChainStore, MemStore};

fn create_test_server() -> TestServer {
    let store: Arc<dyn ChainStore> = Arc::new(MemStore::new());
    let state = AppState::new(store, JwtConfig::for_testing(), None);
    let router = create_router(state);
    TestServer::new(router).unwrap()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Register an account and log in, returning the bearer token
async fn register_and_login(server: &TestServer, username: &str, role: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "password": "password123",
            "role": role,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "username": username,
            "password": "password123",
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Farmer creates a product and a 100 kg batch at 10/kg; returns
/// (batch id, batch code)
async fn seed_harvest(server: &TestServer, farmer_token: &str) -> (String, String) {
    let response = server
        .post("/api/farmer/products")
        .add_header(AUTHORIZATION, bearer(farmer_token))
        .json(&json!({ "title": "Basmati Rice" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let product: Value = response.json();
    let product_id = product["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .post("/api/farmer/batches")
        .add_header(AUTHORIZATION, bearer(farmer_token))
        .json(&json!({
            "product_id": product_id,
            "initial_quantity": 100,
            "quantity_unit": "kg",
            "price_per_unit": 10,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let batch: Value = response.json();
    (
        batch["data"]["id"].as_str().unwrap().to_string(),
        batch["data"]["batch_code"].as_str().unwrap().to_string(),
    )
}

// ============ Health ============

#[tokio::test]
async fn test_health_endpoints() {
    let server = create_test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");

    server.get("/health/live").await.assert_status_ok();
    server.get("/health/ready").await.assert_status_ok();
}

// ============ Auth ============

#[tokio::test]
async fn test_register_rejects_bad_role_and_duplicates() {
    let server = create_test_server();

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "auditor_amy",
            "password": "password123",
            "role": "AUDITOR",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    register_and_login(&server, "farmer_joe", "FARMER").await;
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "farmer_joe",
            "password": "password123",
            "role": "FARMER",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let server = create_test_server();
    register_and_login(&server, "farmer_joe", "FARMER").await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "username": "farmer_joe",
            "password": "wrong-password",
        }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_registration_grants_role_starting_balance() {
    let server = create_test_server();
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "distributor_dave",
            "password": "password123",
            "role": "distributor",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["role"], "DISTRIBUTOR");
    assert_eq!(body["data"]["wallet_balance"], "50000");
}

// ============ Role gating ============

#[tokio::test]
async fn test_role_gates() {
    let server = create_test_server();
    let farmer = register_and_login(&server, "farmer_joe", "FARMER").await;

    // No token
    let response = server.get("/api/distributor/marketplace").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    // Wrong role
    let response = server
        .get("/api/distributor/marketplace")
        .add_header(AUTHORIZATION, bearer(&farmer))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // Garbage token
    let response = server
        .get("/api/farmer/batches")
        .add_header(AUTHORIZATION, bearer("not-a-token"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

// ============ Batch ledger ============

#[tokio::test]
async fn test_create_batch_requires_owned_product() {
    let server = create_test_server();
    let farmer = register_and_login(&server, "farmer_joe", "FARMER").await;
    let other = register_and_login(&server, "farmer_fred", "FARMER").await;
    let (_, _) = seed_harvest(&server, &farmer).await;

    // farmer_fred cannot harvest against farmer_joe's product
    let response = server
        .get("/api/farmer/products")
        .add_header(AUTHORIZATION, bearer(&farmer))
        .await;
    let products: Value = response.json();
    let product_id = products["data"][0]["id"].as_str().unwrap();

    let response = server
        .post("/api/farmer/batches")
        .add_header(AUTHORIZATION, bearer(&other))
        .json(&json!({
            "product_id": product_id,
            "initial_quantity": 10,
            "quantity_unit": "kg",
        }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // Zero quantity is a validation error
    let response = server
        .post("/api/farmer/batches")
        .add_header(AUTHORIZATION, bearer(&farmer))
        .json(&json!({
            "product_id": product_id,
            "initial_quantity": 0,
            "quantity_unit": "kg",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_marketplace_buy_and_split_flow() {
    let server = create_test_server();
    let farmer = register_and_login(&server, "farmer_joe", "FARMER").await;
    let distributor = register_and_login(&server, "distributor_dave", "DISTRIBUTOR").await;
    let (batch_id, _) = seed_harvest(&server, &farmer).await;

    // Listed on the marketplace
    let response = server
        .get("/api/distributor/marketplace")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["farmer_name"], "farmer_joe");
    assert_eq!(body["data"][0]["product_title"], "Basmati Rice");

    // Whole-batch purchase: 100 kg x 10 = 1000
    let response = server
        .post("/api/distributor/buy")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({ "batch_id": batch_id }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["cost"], "1000");
    assert_eq!(body["data"]["batch"]["status"], "In Warehouse");

    // Marketplace is empty now
    let response = server
        .get("/api/distributor/marketplace")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .await;
    let body: Value = response.json();
    assert_eq!(body["count"], 0);

    // Buying again fails on status
    let response = server
        .post("/api/distributor/buy")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({ "batch_id": batch_id }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Split 100 into {40, 60}
    let response = server
        .post("/api/distributor/split-batch")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({
            "batch_id": batch_id,
            "splits": [ { "quantity": 40 }, { "quantity": 60 } ],
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["parent"]["remaining_quantity"], "0");
    assert_eq!(body["data"]["children"].as_array().unwrap().len(), 2);

    // Over-splitting the drained parent reports available vs requested
    let response = server
        .post("/api/distributor/split-batch")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({
            "batch_id": batch_id,
            "splits": [ { "quantity": 1 } ],
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Available: 0"), "got: {message}");
    assert!(message.contains("Requested: 1"), "got: {message}");
}

// ============ Commerce ============

#[tokio::test]
async fn test_order_flow_and_empty_items() {
    let server = create_test_server();
    let farmer = register_and_login(&server, "farmer_joe", "FARMER").await;
    let shopkeeper = register_and_login(&server, "shop_sarah", "SHOPKEEPER").await;
    let (batch_id, _) = seed_harvest(&server, &farmer).await;

    let response = server
        .post("/api/commerce/orders")
        .add_header(AUTHORIZATION, bearer(&shopkeeper))
        .json(&json!({ "items": [] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Over-request rolls back entirely
    let response = server
        .post("/api/commerce/orders")
        .add_header(AUTHORIZATION, bearer(&shopkeeper))
        .json(&json!({
            "items": [
                { "batch_id": batch_id, "quantity": 150, "unit_price": 5 },
            ],
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("Available: 100"));

    // Partial order succeeds and leaves the rest
    let response = server
        .post("/api/commerce/orders")
        .add_header(AUTHORIZATION, bearer(&shopkeeper))
        .json(&json!({
            "items": [
                { "batch_id": batch_id, "quantity": 30, "unit_price": 5 },
            ],
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["is_completed"], true);
    assert_eq!(body["data"]["total_amount"], "150");
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    // Both participants can read it, outsiders cannot
    let response = server
        .get(&format!("/api/commerce/orders/{order_id}"))
        .add_header(AUTHORIZATION, bearer(&farmer))
        .await;
    response.assert_status_ok();

    let outsider = register_and_login(&server, "consumer_carl", "CONSUMER").await;
    let response = server
        .get(&format!("/api/commerce/orders/{order_id}"))
        .add_header(AUTHORIZATION, bearer(&outsider))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // Seller sees the order in their list too
    let response = server
        .get("/api/commerce/orders")
        .add_header(AUTHORIZATION, bearer(&farmer))
        .await;
    let body: Value = response.json();
    assert_eq!(body["count"], 1);
}

// ============ Logistics ============

#[tokio::test]
async fn test_logistics_chain_to_retail_sale() {
    let server = create_test_server();
    let farmer = register_and_login(&server, "farmer_joe", "FARMER").await;
    let distributor = register_and_login(&server, "distributor_dave", "DISTRIBUTOR").await;
    let transporter = register_and_login(&server, "transporter_tom", "TRANSPORTER").await;
    let shopkeeper = register_and_login(&server, "shop_sarah", "SHOPKEEPER").await;
    let (batch_id, _) = seed_harvest(&server, &farmer).await;

    // Shipping before owning/holding fails with the precondition
    let response = server
        .post("/api/distributor/ship")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({ "batch_id": batch_id }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    server
        .post("/api/distributor/buy")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({ "batch_id": batch_id }))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/distributor/ship")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({ "batch_id": batch_id }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "In Transit");

    // Transporter sees the job and delivers
    let response = server
        .get("/api/transporter/jobs")
        .add_header(AUTHORIZATION, bearer(&transporter))
        .await;
    let body: Value = response.json();
    assert_eq!(body["count"], 1);

    let response = server
        .post("/api/transporter/deliver")
        .add_header(AUTHORIZATION, bearer(&transporter))
        .json(&json!({ "batch_id": batch_id }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "In Shop");

    // Shopkeeper sells at a final price
    let response = server
        .get("/api/shop/inventory")
        .add_header(AUTHORIZATION, bearer(&shopkeeper))
        .await;
    let body: Value = response.json();
    assert_eq!(body["count"], 1);

    let response = server
        .post("/api/shop/sell")
        .add_header(AUTHORIZATION, bearer(&shopkeeper))
        .json(&json!({ "batch_id": batch_id, "final_price": 1500 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "Sold");
    assert_eq!(body["data"]["final_price"], "1500");

    // Delivering a sold batch names the violated precondition
    let response = server
        .post("/api/transporter/deliver")
        .add_header(AUTHORIZATION, bearer(&transporter))
        .json(&json!({ "batch_id": batch_id }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("In Transit"));
}

// ============ Transporter events ============

#[tokio::test]
async fn test_transport_events_with_attachments_and_iot() {
    let server = create_test_server();
    let farmer = register_and_login(&server, "farmer_joe", "FARMER").await;
    let distributor = register_and_login(&server, "distributor_dave", "DISTRIBUTOR").await;
    let transporter = register_and_login(&server, "transporter_tom", "TRANSPORTER").await;
    let (batch_id, batch_code) = seed_harvest(&server, &farmer).await;

    // Farmer logs a field event while still holding the batch
    let response = server
        .post("/api/farmer/events")
        .add_header(AUTHORIZATION, bearer(&farmer))
        .json(&json!({
            "batch_id": batch_id,
            "event_type": "Irrigation",
            "location": { "lat": 26.85, "lon": 80.94 },
        }))
        .await;
    response.assert_status_ok();

    // Ledger-generated kinds cannot be logged directly
    let response = server
        .post("/api/farmer/events")
        .add_header(AUTHORIZATION, bearer(&farmer))
        .json(&json!({
            "batch_id": batch_id,
            "event_type": "Sold",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/api/distributor/buy")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({ "batch_id": batch_id }))
        .await
        .assert_status_ok();

    // Ownership moved, so farmer field events are rejected now
    let response = server
        .post("/api/farmer/events")
        .add_header(AUTHORIZATION, bearer(&farmer))
        .json(&json!({
            "batch_id": batch_id,
            "event_type": "Irrigation",
        }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // Waypoints only attach to batches on the road
    let response = server
        .post("/api/transporter/events")
        .add_header(AUTHORIZATION, bearer(&transporter))
        .json(&json!({
            "batch_id": batch_id,
            "event_type": "Transport Start",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/api/distributor/ship")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({ "batch_id": batch_id }))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/transporter/events")
        .add_header(AUTHORIZATION, bearer(&transporter))
        .json(&json!({
            "batch_id": batch_id,
            "event_type": "Transport Start",
            "location": { "lat": 27.1, "lon": 81.2 },
            "note": "cold chain holding at 4C",
        }))
        .await;
    response.assert_status_ok();
    let event: Value = response.json();
    let event_id = event["data"]["id"].as_str().unwrap().to_string();

    // Proof of condition + IoT reading on the waypoint
    let response = server
        .post(&format!("/api/transporter/events/{event_id}/attachments"))
        .add_header(AUTHORIZATION, bearer(&transporter))
        .json(&json!({
            "file_name": "truck.jpg",
            "content_type": "image/jpeg",
        }))
        .await;
    response.assert_status_ok();

    let response = server
        .post(&format!("/api/transporter/events/{event_id}/device-data"))
        .add_header(AUTHORIZATION, bearer(&transporter))
        .json(&json!({
            "device_id": "thermo-1",
            "payload": { "temp_c": 4.2 },
        }))
        .await;
    response.assert_status_ok();

    // The public timeline carries the enrichment
    let response = server
        .get(&format!("/api/traceability/batch/{batch_code}/events"))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let waypoint = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"] == event_id.as_str())
        .unwrap();
    assert_eq!(waypoint["attachments"].as_array().unwrap().len(), 1);
    assert_eq!(waypoint["device_readings"].as_array().unwrap().len(), 1);
    assert_eq!(waypoint["location"]["lat"], 27.1);
}

// ============ Traceability ============

#[tokio::test]
async fn test_trace_unknown_code_is_not_found() {
    let server = create_test_server();
    let response = server.get("/api/traceability/batch/AGB-NOPE").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_story_after_split_and_sale() {
    let server = create_test_server();
    let farmer = register_and_login(&server, "farmer_joe", "FARMER").await;
    let distributor = register_and_login(&server, "distributor_dave", "DISTRIBUTOR").await;
    let shopkeeper = register_and_login(&server, "shop_sarah", "SHOPKEEPER").await;
    let (batch_id, _) = seed_harvest(&server, &farmer).await;

    // Distributor buys the whole batch and splits it {40, 60}
    server
        .post("/api/distributor/buy")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({ "batch_id": batch_id }))
        .await
        .assert_status_ok();
    let response = server
        .post("/api/distributor/split-batch")
        .add_header(AUTHORIZATION, bearer(&distributor))
        .json(&json!({
            "batch_id": batch_id,
            "splits": [ { "quantity": 40 }, { "quantity": 60 } ],
        }))
        .await;
    let split: Value = response.json();
    let forty_id = split["data"]["children"][0]["id"].as_str().unwrap();
    let forty_code = split["data"]["children"][0]["batch_code"]
        .as_str()
        .unwrap()
        .to_string();

    // Shopkeeper buys the 40 kg child through the order path
    let response = server
        .post("/api/commerce/orders")
        .add_header(AUTHORIZATION, bearer(&shopkeeper))
        .json(&json!({
            "items": [ { "batch_id": forty_id, "quantity": 40, "unit_price": 12 } ],
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    // Consumer traces the 40 kg child without a token
    let response = server
        .get(&format!("/api/traceability/batch/{forty_code}"))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let story = &body["data"];

    assert_eq!(story["batch"]["batch_code"], forty_code.as_str());
    assert_eq!(story["batch"]["current_status"], "Sold");
    assert_eq!(story["batch"]["remaining_quantity"], "0");
    assert_eq!(story["genealogy"]["is_root"], false);

    // Genealogy: root with both children, the scanned one marked
    let tree = &story["genealogy"]["tree"];
    assert_eq!(tree["children"].as_array().unwrap().len(), 2);
    assert!(tree["children"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["batch_code"] == forty_code.as_str() && c["is_scanned"] == true));

    // Timeline: Harvest first, then the whole-batch Sold, splits, and the
    // order's Sold last
    let kinds: Vec<&str> = story["timeline"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds.first().copied(), Some("Harvest"));
    assert_eq!(kinds.last().copied(), Some("Sold"));
    assert!(kinds.contains(&"Split"));
    let harvest_pos = kinds.iter().position(|k| *k == "Harvest").unwrap();
    let split_pos = kinds.iter().position(|k| *k == "Split").unwrap();
    assert!(harvest_pos < split_pos);

    // Journey summary in checklist order
    let journey: Vec<&str> = story["summary"]["journey"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert_eq!(
        journey,
        vec!["Harvested from farm", "Split into smaller batches", "Sold"]
    );

    // Stage grouping: farmer bucket holds the Harvest, distributor bucket
    // the Split events
    assert!(!story["stages"]["farmer"].as_array().unwrap().is_empty());
    assert!(!story["stages"]["distributor"].as_array().unwrap().is_empty());

    // No mirror configured: empty ledger transaction list
    assert_eq!(story["ledger_transactions"].as_array().unwrap().len(), 0);

    // Genealogy-only endpoint agrees
    let response = server
        .get(&format!("/api/traceability/batch/{forty_code}/genealogy"))
        .await;
    response.assert_status_ok();
}
