//! Integration tests for the remote relational backend against a mock
//! HTTP server. The load-bearing scenario is the partial failure: a sale
//! that dies midway must leave the committed steps in place and say so.

use easypos_core::{PaymentMethod, PaymentStatus, Role, Transaction, TransactionItem, User};
use easypos_store::{Backend, RemoteDbBackend, RemoteDbConfig, StoreError};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> RemoteDbBackend {
    RemoteDbBackend::connect(RemoteDbConfig {
        base_url: server.uri(),
        api_key: "anon-key".into(),
    })
    .unwrap()
}

fn cash_transaction(id: &str) -> Transaction {
    Transaction {
        id: id.into(),
        user_id: "u1".into(),
        subtotal: 45_000.0,
        discount_id: None,
        discount_amount: None,
        total_amount: 45_000.0,
        payment_amount: 50_000.0,
        change_amount: 5_000.0,
        payment_method: PaymentMethod::Cash,
        payment_status: PaymentStatus::Completed,
        gateway_external_id: None,
        gateway_invoice_url: None,
        created_at: "2026-03-10T12:00:00Z".parse().unwrap(),
    }
}

fn item(id: &str, product_id: &str, quantity: i64) -> TransactionItem {
    TransactionItem {
        id: id.into(),
        transaction_id: "t1".into(),
        product_id: product_id.into(),
        quantity,
        price: 10_000.0,
    }
}

// -- Auth and reads -----------------------------------------------------

#[tokio::test]
async fn every_request_carries_api_key_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let products = backend(&server).list_products().await.unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn single_reads_filter_by_id_and_empty_means_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .and(query_param("id", "eq.ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let found = backend(&server).get_transaction("ghost").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn list_transactions_orders_desc_and_limits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "25"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([cash_transaction("t1")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let recent = backend(&server).list_transactions(25, Some("u1")).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, "t1");
}

// -- Conflicts and not-found --------------------------------------------

#[tokio::test]
async fn duplicate_username_maps_409_to_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"users_username_key\""
        })))
        .mount(&server)
        .await;

    let duplicate = User {
        id: "u2".into(),
        username: "budi".into(),
        password_hash: "pw".into(),
        role: Role::Cashier,
        is_active: true,
    };
    let err = backend(&server).insert_user(&duplicate).await.unwrap_err();
    match err {
        StoreError::Conflict { field, value } => {
            assert_eq!(field, "username");
            assert_eq!(value, "budi");
        }
        other => panic!("expected Conflict, got {other}"),
    }
}

#[tokio::test]
async fn patch_matching_no_rows_is_not_found() {
    let server = MockServer::start().await;
    // PostgREST reports success with an empty representation when the
    // filter matched nothing.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/transactions"))
        .and(query_param("id", "eq.ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = backend(&server)
        .update_payment_status("ghost", PaymentStatus::Completed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

// -- record_sale --------------------------------------------------------

#[tokio::test]
async fn record_sale_happy_path_runs_all_steps_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/transaction_items"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "stock": 10 }])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "p1" }])))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server)
        .record_sale(&cash_transaction("t1"), &[item("i1", "p1", 2)])
        .await
        .unwrap();

    // The stock PATCH wrote the decremented read-back value.
    let requests = server.received_requests().await.unwrap();
    let stock_patch = requests
        .iter()
        .find(|r| r.method.as_str() == "PATCH")
        .unwrap();
    let body: Value = stock_patch.body_json().unwrap();
    assert_eq!(body, json!({ "stock": 8 }));
}

#[tokio::test]
async fn item_insert_failure_after_header_is_a_partial_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/transaction_items"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = backend(&server)
        .record_sale(&cash_transaction("t1"), &[item("i1", "p1", 2)])
        .await
        .unwrap_err();

    match err {
        StoreError::PartialFailure {
            transaction_id,
            committed,
            failed_step,
            source,
        } => {
            assert_eq!(transaction_id, "t1");
            assert_eq!(committed, "transaction header");
            assert_eq!(failed_step, "line items");
            assert!(matches!(*source, StoreError::Unavailable(_)));
        }
        other => panic!("expected PartialFailure, got {other}"),
    }
}

#[tokio::test]
async fn stock_failure_midway_reports_what_already_committed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/transaction_items"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    // First product read+write succeed; the second read blows up.
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "stock": 10 }])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "p1" }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let items = vec![item("i1", "p1", 2), item("i2", "p2", 1)];
    let err = backend(&server)
        .record_sale(&cash_transaction("t1"), &items)
        .await
        .unwrap_err();

    match err {
        StoreError::PartialFailure {
            transaction_id,
            committed,
            failed_step,
            ..
        } => {
            assert_eq!(transaction_id, "t1");
            assert_eq!(committed, "transaction header, 2 items, 1 of 2 stock decrements");
            assert_eq!(failed_step, "stock decrement for product p2");
        }
        other => panic!("expected PartialFailure, got {other}"),
    }

    // No compensation: nothing was deleted after the failure.
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() != "DELETE"));
}

#[tokio::test]
async fn missing_product_during_stock_decrement_is_partial_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/transaction_items"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = backend(&server)
        .record_sale(&cash_transaction("t1"), &[item("i1", "ghost", 1)])
        .await
        .unwrap_err();

    match err {
        StoreError::PartialFailure { source, .. } => {
            assert!(matches!(*source, StoreError::NotFound { .. }));
        }
        other => panic!("expected PartialFailure, got {other}"),
    }
}
