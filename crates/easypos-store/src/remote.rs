//! # Remote Relational Backend
//!
//! Adapter for a cloud relational database exposed through a
//! PostgREST-style HTTPS API (tables addressed by URL, filters as query
//! parameters, `Prefer` headers steering the response shape).
//!
//! ## record_sale: weaker guarantee, on purpose
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  1. POST /transactions          (header)                        │
//! │  2. POST /transaction_items     (all line items, one call)      │
//! │  3. per item:                                                   │
//! │       GET  /products?id=eq.X&select=stock                       │
//! │       PATCH /products?id=eq.X   { stock: current − qty }        │
//! │                                                                 │
//! │  No client-visible multi-statement transaction exists in this   │
//! │  integration. A failure at step 2 or 3 leaves the earlier steps │
//! │  committed and surfaces as StoreError::PartialFailure naming    │
//! │  exactly what is already durable. Do not "fix" this by          │
//! │  inventing a rollback the engine never offered.                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock update is read-modify-write, so concurrent sales can lose
//! decrements. Same accepted oversell risk as everywhere else, plus the
//! lost-update window this engine adds.

use async_trait::async_trait;
use easypos_core::{
    Category, Discount, PaymentStatus, Product, Transaction, TransactionItem, User,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::config::RemoteDbConfig;
use crate::error::{StoreError, StoreResult};
use crate::http::expect_ok;

/// Adapter over the relational store's REST API.
#[derive(Debug, Clone)]
pub struct RemoteDbBackend {
    client: reqwest::Client,
    /// `{base}/rest/v1`
    rest_root: String,
}

impl RemoteDbBackend {
    pub fn connect(config: RemoteDbConfig) -> StoreResult<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| StoreError::NotConfigured("remote_db api_key is not valid".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| StoreError::NotConfigured("remote_db api_key is not valid".into()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Unknown(e.to_string()))?;

        Ok(RemoteDbBackend {
            client,
            rest_root: format!("{}/rest/v1", config.base_url.trim_end_matches('/')),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_root, table)
    }

    // -- Generic row plumbing -------------------------------------------

    async fn list_rows<T: DeserializeOwned>(&self, table: &str) -> StoreResult<Vec<T>> {
        let resp = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .send()
            .await?;
        Ok(expect_ok(resp, table).await?.json().await?)
    }

    async fn get_row<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> StoreResult<Option<T>> {
        let filter = format!("eq.{value}");
        let resp = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*"), (column, filter.as_str())])
            .send()
            .await?;
        let mut rows: Vec<T> = expect_ok(resp, table).await?.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Insert-or-merge on the primary key, the way the setup and catalog
    /// screens have always written. Unique-index violations (username)
    /// still come back as 409.
    async fn upsert_row<T: Serialize>(&self, table: &str, entity: &T) -> StoreResult<()> {
        let resp = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(entity)
            .send()
            .await?;
        expect_ok(resp, table).await?;
        Ok(())
    }

    async fn insert_rows<T: Serialize>(&self, table: &str, rows: &[T]) -> StoreResult<()> {
        let resp = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;
        expect_ok(resp, table).await?;
        Ok(())
    }

    /// PATCH by id; `return=representation` lets us distinguish "no row
    /// matched" (empty array) from success.
    async fn patch_by_id(
        &self,
        table: &str,
        entity_name: &str,
        id: &str,
        body: &serde_json::Value,
    ) -> StoreResult<()> {
        let resp = self
            .client
            .patch(self.table_url(table))
            .query(&[(("id"), &format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = expect_ok(resp, table).await?.json().await?;
        if rows.is_empty() {
            return Err(StoreError::not_found(entity_name, id));
        }
        Ok(())
    }

    async fn delete_by_id(&self, table: &str, entity_name: &str, id: &str) -> StoreResult<()> {
        let resp = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", &format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = expect_ok(resp, table).await?.json().await?;
        if rows.is_empty() {
            return Err(StoreError::not_found(entity_name, id));
        }
        Ok(())
    }

    /// Read-modify-write stock decrement for one item.
    async fn decrement_stock(&self, item: &TransactionItem) -> StoreResult<()> {
        #[derive(Deserialize)]
        struct StockRow {
            stock: i64,
        }

        let filter = format!("eq.{}", item.product_id);
        let resp = self
            .client
            .get(self.table_url("products"))
            .query(&[("select", "stock"), ("id", filter.as_str())])
            .send()
            .await?;
        let mut rows: Vec<StockRow> = expect_ok(resp, "products").await?.json().await?;
        let current = rows
            .pop()
            .ok_or_else(|| StoreError::not_found("product", &item.product_id))?
            .stock;

        self.patch_by_id(
            "products",
            "product",
            &item.product_id,
            &json!({ "stock": current - item.quantity }),
        )
        .await
    }
}

#[async_trait]
impl Backend for RemoteDbBackend {
    // -- Products -------------------------------------------------------

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.list_rows("products").await
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        self.get_row("products", "id", id).await
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        self.upsert_row("products", product).await
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        self.patch_by_id(
            "products",
            "product",
            &product.id,
            &serde_json::to_value(product)?,
        )
        .await
    }

    async fn delete_product(&self, id: &str) -> StoreResult<()> {
        self.delete_by_id("products", "product", id).await
    }

    // -- Categories -----------------------------------------------------

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.list_rows("categories").await
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        self.upsert_row("categories", category).await
    }

    async fn delete_category(&self, id: &str) -> StoreResult<()> {
        self.delete_by_id("categories", "category", id).await
    }

    // -- Users ----------------------------------------------------------

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.list_rows("users").await
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.get_row("users", "id", id).await
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.get_row("users", "username", username).await
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.upsert_row("users", user).await.map_err(|e| match e {
            StoreError::Conflict { .. } => StoreError::conflict("username", &user.username),
            other => other,
        })
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.patch_by_id("users", "user", &user.id, &serde_json::to_value(user)?)
            .await
            .map_err(|e| match e {
                StoreError::Conflict { .. } => StoreError::conflict("username", &user.username),
                other => other,
            })
    }

    async fn delete_user(&self, id: &str) -> StoreResult<()> {
        self.delete_by_id("users", "user", id).await
    }

    // -- Discounts ------------------------------------------------------

    async fn list_discounts(&self) -> StoreResult<Vec<Discount>> {
        self.list_rows("discounts").await
    }

    async fn insert_discount(&self, discount: &Discount) -> StoreResult<()> {
        self.upsert_row("discounts", discount).await
    }

    async fn update_discount(&self, discount: &Discount) -> StoreResult<()> {
        self.patch_by_id(
            "discounts",
            "discount",
            &discount.id,
            &serde_json::to_value(discount)?,
        )
        .await
    }

    async fn delete_discount(&self, id: &str) -> StoreResult<()> {
        self.delete_by_id("discounts", "discount", id).await
    }

    // -- Sales ----------------------------------------------------------

    async fn record_sale(
        &self,
        transaction: &Transaction,
        items: &[TransactionItem],
    ) -> StoreResult<()> {
        debug!(id = %transaction.id, items = items.len(), "recording sale (sequential)");

        // Step 1: header. Nothing committed yet, so a failure here is a
        // plain error, not a partial one.
        self.insert_rows("transactions", std::slice::from_ref(transaction))
            .await?;

        // Step 2: all line items in one call.
        if let Err(source) = self.insert_rows("transaction_items", items).await {
            warn!(id = %transaction.id, "sale items failed after header committed");
            return Err(StoreError::PartialFailure {
                transaction_id: transaction.id.clone(),
                committed: "transaction header".into(),
                failed_step: "line items".into(),
                source: Box::new(source),
            });
        }

        // Step 3: stock decrements, one product at a time.
        for (idx, item) in items.iter().enumerate() {
            if let Err(source) = self.decrement_stock(item).await {
                warn!(
                    id = %transaction.id,
                    product = %item.product_id,
                    "stock decrement failed mid-sale"
                );
                return Err(StoreError::PartialFailure {
                    transaction_id: transaction.id.clone(),
                    committed: format!(
                        "transaction header, {} items, {} of {} stock decrements",
                        items.len(),
                        idx,
                        items.len()
                    ),
                    failed_step: format!("stock decrement for product {}", item.product_id),
                    source: Box::new(source),
                });
            }
        }

        Ok(())
    }

    async fn list_transactions(
        &self,
        limit: u32,
        user_id: Option<&str>,
    ) -> StoreResult<Vec<Transaction>> {
        let limit = limit.to_string();
        let mut request = self
            .client
            .get(self.table_url("transactions"))
            .query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ]);
        if let Some(user) = user_id {
            request = request.query(&[("user_id", &format!("eq.{user}"))]);
        }
        let resp = request.send().await?;
        Ok(expect_ok(resp, "transactions").await?.json().await?)
    }

    async fn get_transaction(&self, id: &str) -> StoreResult<Option<Transaction>> {
        self.get_row("transactions", "id", id).await
    }

    async fn transaction_items(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Vec<TransactionItem>> {
        let filter = format!("eq.{transaction_id}");
        let resp = self
            .client
            .get(self.table_url("transaction_items"))
            .query(&[("select", "*"), ("transaction_id", filter.as_str())])
            .send()
            .await?;
        Ok(expect_ok(resp, "transaction_items").await?.json().await?)
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        gateway_external_id: Option<&str>,
    ) -> StoreResult<()> {
        let mut body = json!({ "payment_status": status });
        if let Some(external_id) = gateway_external_id {
            body["gateway_external_id"] = json!(external_id);
        }
        self.patch_by_id("transactions", "transaction", id, &body).await
    }
}
