//! Integration tests for the embedded SQLite backend, run against an
//! isolated in-memory database per test.

use chrono::{Duration, TimeZone, Utc};
use easypos_core::{
    Category, Discount, DiscountKind, PaymentMethod, PaymentStatus, Product, Role, Transaction,
    TransactionItem, User,
};
use easypos_store::{Backend, DbConfig, SqliteBackend, StoreError};

async fn backend() -> SqliteBackend {
    SqliteBackend::connect(DbConfig::in_memory()).await.unwrap()
}

fn product(id: &str, price: f64, stock: i64) -> Product {
    Product {
        id: id.into(),
        name: format!("Product {id}"),
        price,
        stock,
        category_id: "c1".into(),
        sku: None,
        image_uri: None,
    }
}

fn user(id: &str, username: &str) -> User {
    User {
        id: id.into(),
        username: username.into(),
        password_hash: "pw".into(),
        role: Role::Cashier,
        is_active: true,
    }
}

fn cash_transaction(id: &str, user_id: &str, total: f64, minutes_ago: i64) -> Transaction {
    Transaction {
        id: id.into(),
        user_id: user_id.into(),
        subtotal: total,
        discount_id: None,
        discount_amount: None,
        total_amount: total,
        payment_amount: total,
        change_amount: 0.0,
        payment_method: PaymentMethod::Cash,
        payment_status: PaymentStatus::Completed,
        gateway_external_id: None,
        gateway_invoice_url: None,
        created_at: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
            - Duration::minutes(minutes_ago),
    }
}

fn item(id: &str, transaction_id: &str, product_id: &str, quantity: i64, price: f64) -> TransactionItem {
    TransactionItem {
        id: id.into(),
        transaction_id: transaction_id.into(),
        product_id: product_id.into(),
        quantity,
        price,
    }
}

// -- Catalog ------------------------------------------------------------

#[tokio::test]
async fn product_crud_round_trip() {
    let db = backend().await;
    db.insert_category(&Category {
        id: "c1".into(),
        name: "Drinks".into(),
    })
    .await
    .unwrap();

    let mut p = product("p1", 18_000.0, 10);
    db.insert_product(&p).await.unwrap();
    assert_eq!(db.get_product("p1").await.unwrap(), Some(p.clone()));

    p.price = 20_000.0;
    p.sku = Some("KS-01".into());
    db.update_product(&p).await.unwrap();
    assert_eq!(db.get_product("p1").await.unwrap(), Some(p));

    db.delete_product("p1").await.unwrap();
    assert_eq!(db.get_product("p1").await.unwrap(), None);
}

#[tokio::test]
async fn unknown_ids_are_none_on_read_and_not_found_on_write() {
    let db = backend().await;

    assert!(db.get_product("ghost").await.unwrap().is_none());
    assert!(db.get_transaction("ghost").await.unwrap().is_none());

    let err = db.update_product(&product("ghost", 1.0, 1)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = db.delete_category("ghost").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn category_delete_leaves_products_dangling() {
    let db = backend().await;
    db.insert_category(&Category {
        id: "c1".into(),
        name: "Snacks".into(),
    })
    .await
    .unwrap();
    db.insert_product(&product("p1", 5_000.0, 3)).await.unwrap();

    db.delete_category("c1").await.unwrap();

    // The product survives with its old category_id.
    let survivor = db.get_product("p1").await.unwrap().unwrap();
    assert_eq!(survivor.category_id, "c1");
}

// -- Users --------------------------------------------------------------

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let db = backend().await;
    db.insert_user(&user("u1", "budi")).await.unwrap();

    let err = db.insert_user(&user("u2", "budi")).await.unwrap_err();
    match err {
        StoreError::Conflict { value, .. } => assert_eq!(value, "budi"),
        other => panic!("expected Conflict, got {other}"),
    }

    // The first user is untouched and findable by name.
    let found = db.get_user_by_username("budi").await.unwrap().unwrap();
    assert_eq!(found.id, "u1");
}

#[tokio::test]
async fn user_update_and_deactivate() {
    let db = backend().await;
    let mut u = user("u1", "siti");
    db.insert_user(&u).await.unwrap();

    u.is_active = false;
    u.role = Role::Admin;
    db.update_user(&u).await.unwrap();

    let back = db.get_user("u1").await.unwrap().unwrap();
    assert!(!back.is_active);
    assert_eq!(back.role, Role::Admin);
}

// -- Discounts ----------------------------------------------------------

#[tokio::test]
async fn discount_crud_round_trip() {
    let db = backend().await;
    let mut d = Discount {
        id: "d1".into(),
        name: "Opening week".into(),
        kind: DiscountKind::Percentage,
        value: 10.0,
        is_active: true,
    };
    db.insert_discount(&d).await.unwrap();

    d.is_active = false;
    db.update_discount(&d).await.unwrap();
    assert_eq!(db.list_discounts().await.unwrap(), vec![d]);

    db.delete_discount("d1").await.unwrap();
    assert!(db.list_discounts().await.unwrap().is_empty());
}

// -- record_sale --------------------------------------------------------

#[tokio::test]
async fn record_sale_persists_everything_and_decrements_stock() {
    let db = backend().await;
    db.insert_product(&product("p1", 10_000.0, 10)).await.unwrap();
    db.insert_product(&product("p2", 25_000.0, 5)).await.unwrap();

    // 2 × 10 000 + 1 × 25 000 paid with 50 000 cash.
    let mut tx = cash_transaction("t1", "u1", 45_000.0, 0);
    tx.payment_amount = 50_000.0;
    tx.change_amount = 5_000.0;
    let items = vec![
        item("i1", "t1", "p1", 2, 10_000.0),
        item("i2", "t1", "p2", 1, 25_000.0),
    ];

    db.record_sale(&tx, &items).await.unwrap();

    assert_eq!(db.get_transaction("t1").await.unwrap(), Some(tx));
    assert_eq!(db.transaction_items("t1").await.unwrap().len(), 2);
    assert_eq!(db.get_product("p1").await.unwrap().unwrap().stock, 8);
    assert_eq!(db.get_product("p2").await.unwrap().unwrap().stock, 4);
}

#[tokio::test]
async fn record_sale_rolls_back_completely_on_mid_failure() {
    let db = backend().await;
    db.insert_product(&product("p1", 10_000.0, 10)).await.unwrap();

    // The second line item reuses the first one's primary key, so the
    // insert fails after the header and the first item already ran.
    let tx = cash_transaction("t1", "u1", 30_000.0, 0);
    let items = vec![
        item("i1", "t1", "p1", 1, 10_000.0),
        item("i1", "t1", "p1", 2, 10_000.0),
    ];

    db.record_sale(&tx, &items).await.unwrap_err();

    // Nothing is visible: no header, no items, stock untouched.
    assert!(db.get_transaction("t1").await.unwrap().is_none());
    assert!(db.transaction_items("t1").await.unwrap().is_empty());
    assert_eq!(db.get_product("p1").await.unwrap().unwrap().stock, 10);
}

#[tokio::test]
async fn stock_may_go_negative() {
    let db = backend().await;
    db.insert_product(&product("p1", 10_000.0, 1)).await.unwrap();

    let tx = cash_transaction("t1", "u1", 30_000.0, 0);
    db.record_sale(&tx, &[item("i1", "t1", "p1", 3, 10_000.0)])
        .await
        .unwrap();

    assert_eq!(db.get_product("p1").await.unwrap().unwrap().stock, -2);
}

// -- Transaction queries ------------------------------------------------

#[tokio::test]
async fn list_transactions_orders_desc_and_limits() {
    let db = backend().await;
    for i in 0..5 {
        let tx = cash_transaction(&format!("t{i}"), "u1", 10_000.0, i * 10);
        db.record_sale(&tx, &[]).await.unwrap();
    }

    let recent = db.list_transactions(3, None).await.unwrap();
    let ids: Vec<_> = recent.iter().map(|t| t.id.as_str()).collect();
    // t0 is the newest (0 minutes ago), t4 the oldest.
    assert_eq!(ids, vec!["t0", "t1", "t2"]);
}

#[tokio::test]
async fn list_transactions_can_filter_by_user() {
    let db = backend().await;
    db.record_sale(&cash_transaction("t1", "cashier-a", 10_000.0, 1), &[])
        .await
        .unwrap();
    db.record_sale(&cash_transaction("t2", "cashier-b", 10_000.0, 2), &[])
        .await
        .unwrap();
    db.record_sale(&cash_transaction("t3", "cashier-a", 10_000.0, 3), &[])
        .await
        .unwrap();

    let own = db.list_transactions(50, Some("cashier-a")).await.unwrap();
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|t| t.user_id == "cashier-a"));
}

// -- Payment status -----------------------------------------------------

#[tokio::test]
async fn payment_status_update_is_narrow_and_idempotent() {
    let db = backend().await;
    let mut tx = cash_transaction("t1", "u1", 10_000.0, 0);
    tx.payment_method = PaymentMethod::Gateway;
    tx.payment_status = PaymentStatus::Pending;
    db.record_sale(&tx, &[]).await.unwrap();

    db.update_payment_status("t1", PaymentStatus::Completed, Some("inv-123"))
        .await
        .unwrap();
    // Repeating the same terminal status is a no-op, not an error.
    db.update_payment_status("t1", PaymentStatus::Completed, Some("inv-123"))
        .await
        .unwrap();

    let back = db.get_transaction("t1").await.unwrap().unwrap();
    assert_eq!(back.payment_status, PaymentStatus::Completed);
    assert_eq!(back.gateway_external_id.as_deref(), Some("inv-123"));
    // Everything else is untouched.
    assert_eq!(back.total_amount, 10_000.0);
    assert_eq!(back.user_id, "u1");
}

#[tokio::test]
async fn payment_status_update_keeps_existing_correlation_id() {
    let db = backend().await;
    let mut tx = cash_transaction("t1", "u1", 10_000.0, 0);
    tx.payment_method = PaymentMethod::Gateway;
    tx.payment_status = PaymentStatus::Pending;
    tx.gateway_external_id = Some("inv-123".into());
    db.record_sale(&tx, &[]).await.unwrap();

    // No correlation id supplied: the stored one must survive.
    db.update_payment_status("t1", PaymentStatus::Failed, None)
        .await
        .unwrap();

    let back = db.get_transaction("t1").await.unwrap().unwrap();
    assert_eq!(back.payment_status, PaymentStatus::Failed);
    assert_eq!(back.gateway_external_id.as_deref(), Some("inv-123"));
}

#[tokio::test]
async fn payment_status_update_for_unknown_transaction_is_not_found() {
    let db = backend().await;
    let err = db
        .update_payment_status("ghost", PaymentStatus::Completed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}
