//! HTTP contract of the Target client against a local mock POS.

use httpmock::prelude::*;

use evsync_target::{
    HttpTargetClient, OrderItem, OrderSpec, Payment, TargetClient, TargetError,
};

fn client_for(server: &MockServer) -> HttpTargetClient {
    HttpTargetClient::new(reqwest::Client::new(), server.base_url(), "key", "secret")
}

fn spec() -> OrderSpec {
    OrderSpec {
        establishment: "4".to_string(),
        external_ref: "ts_E1".to_string(),
        dining_option_id: 1,
        order_status: "CLOSED".to_string(),
        notes: "Source event #E1".to_string(),
        items: vec![OrderItem {
            product_id: 101,
            quantity: 2,
        }],
        payments: vec![Payment {
            payment_type_id: 3,
            amount_cents: 100_00,
        }],
        discounts: vec![],
    }
}

#[tokio::test]
async fn find_filters_by_establishment_and_external_ref() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/orders/")
                .query_param("establishment", "4")
                .query_param("external_order_id", "ts_E1");
            then.status(200)
                .json_body(serde_json::json!({ "objects": [{ "id": 555 }] }));
        })
        .await;

    let exists = client_for(&server)
        .find_by_external_ref("4", "ts_E1")
        .await
        .unwrap();
    mock.assert_async().await;
    assert!(exists);
}

#[tokio::test]
async fn empty_result_means_not_processed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/orders/");
            then.status(200).json_body(serde_json::json!({ "objects": [] }));
        })
        .await;

    let exists = client_for(&server)
        .find_by_external_ref("4", "ts_E1")
        .await
        .unwrap();
    assert!(!exists);
}

#[tokio::test]
async fn create_posts_spec_and_returns_order_ref() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/orders/")
                .json_body_partial(r#"{ "external_ref": "ts_E1", "order_status": "CLOSED" }"#);
            then.status(201).json_body(serde_json::json!({ "id": 9001 }));
        })
        .await;

    let order_ref = client_for(&server).create_order(&spec()).await.unwrap();
    mock.assert_async().await;
    assert_eq!(order_ref, "9001");
}

#[tokio::test]
async fn http_409_classifies_as_duplicate_ref() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/orders/");
            then.status(409).body("external_order_id already exists");
        })
        .await;

    let err = client_for(&server).create_order(&spec()).await.unwrap_err();
    assert!(err.is_duplicate_ref(), "409 must classify as duplicate: {err}");
}

#[tokio::test]
async fn http_5xx_is_a_plain_api_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/orders/");
            then.status(503).body("maintenance");
        })
        .await;

    let err = client_for(&server).create_order(&spec()).await.unwrap_err();
    assert!(matches!(err, TargetError::Api { status: 503, .. }));
    assert!(!err.is_duplicate_ref());
}
