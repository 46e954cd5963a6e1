//! # Remote Document-Store Backend
//!
//! Adapter for a cloud document database speaking a Firestore-style REST
//! protocol: typed field values, `runQuery` for filtered reads, and an
//! atomic `:commit` batch.
//!
//! ## record_sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  POST {root}:commit                                             │
//! │  writes: [                                                      │
//! │    update  transactions/{id}          (header)                  │
//! │    update  transaction_items/{id} ×N  (line items)              │
//! │    transform products/{pid} ×N        (stock increment −qty)    │
//! │  ]                                                              │
//! │  One batch: the engine commits all writes or none of them.      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The document store has no unique indexes, so username uniqueness is
//! enforced here with a lookup before insert.

use async_trait::async_trait;
use easypos_core::{
    Category, Discount, PaymentStatus, Product, Transaction, TransactionItem, User,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::backend::Backend;
use crate::config::DocStoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::http::expect_ok;

/// Adapter over the document database's REST API.
#[derive(Debug, Clone)]
pub struct DocStoreBackend {
    client: reqwest::Client,
    /// `{base}/projects/{p}/databases/(default)/documents`
    root: String,
    /// Resource-name prefix used inside batch writes.
    name_prefix: String,
    api_key: String,
}

impl DocStoreBackend {
    pub fn connect(config: DocStoreConfig) -> Self {
        let name_prefix = format!(
            "projects/{}/databases/(default)/documents",
            config.project_id
        );
        DocStoreBackend {
            client: reqwest::Client::new(),
            root: format!("{}/{}", config.base_url.trim_end_matches('/'), name_prefix),
            name_prefix,
            api_key: config.api_key,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}?key={}", self.root, collection, self.api_key)
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}?key={}", self.root, collection, id, self.api_key)
    }

    fn query_url(&self) -> String {
        format!("{}:runQuery?key={}", self.root, self.api_key)
    }

    fn commit_url(&self) -> String {
        format!("{}:commit?key={}", self.root, self.api_key)
    }

    fn doc_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.name_prefix, collection, id)
    }

    // -- Generic document plumbing --------------------------------------

    async fn list_collection<T: DeserializeOwned>(&self, collection: &str) -> StoreResult<Vec<T>> {
        let resp = self.client.get(self.collection_url(collection)).send().await?;
        let body: Value = expect_ok(resp, collection).await?.json().await?;
        body.get("documents")
            .and_then(Value::as_array)
            .map(|docs| docs.iter().map(decode_document).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<T>> {
        let resp = self.client.get(self.doc_url(collection, id)).send().await?;
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        let doc: Value = expect_ok(resp, collection).await?.json().await?;
        Ok(Some(decode_document(&doc)?))
    }

    /// Set semantics: creates the document or overwrites it entirely.
    async fn set_document<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        entity: &T,
    ) -> StoreResult<()> {
        let body = json!({ "fields": encode_fields(entity)? });
        let resp = self
            .client
            .patch(self.doc_url(collection, id))
            .json(&body)
            .send()
            .await?;
        expect_ok(resp, collection).await?;
        Ok(())
    }

    /// Update semantics: fails with `NotFound` when the document is absent.
    async fn update_document<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        entity: &T,
    ) -> StoreResult<()> {
        let url = format!(
            "{}&currentDocument.exists=true",
            self.doc_url(collection, id)
        );
        let body = json!({ "fields": encode_fields(entity)? });
        let resp = self.client.patch(url).json(&body).send().await?;
        expect_ok(resp, collection)
            .await
            .map_err(|e| contextualize_not_found(e, collection, id))?;
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        let url = format!(
            "{}&currentDocument.exists=true",
            self.doc_url(collection, id)
        );
        let resp = self.client.delete(url).send().await?;
        expect_ok(resp, collection)
            .await
            .map_err(|e| contextualize_not_found(e, collection, id))?;
        Ok(())
    }

    /// Runs a structured query and decodes the matched documents.
    async fn run_query<T: DeserializeOwned>(&self, query: Value) -> StoreResult<Vec<T>> {
        let body = json!({ "structuredQuery": query });
        let resp = self.client.post(self.query_url()).json(&body).send().await?;
        let results: Value = expect_ok(resp, "query").await?.json().await?;

        // Responses are a stream of result entries; only some carry a
        // document (the rest hold read times / end-of-results markers).
        results
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("document"))
                    .map(decode_document)
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn contextualize_not_found(err: StoreError, entity: &str, id: &str) -> StoreError {
    match err {
        StoreError::NotFound { .. } => StoreError::not_found(entity, id),
        other => other,
    }
}

#[async_trait]
impl Backend for DocStoreBackend {
    // -- Products -------------------------------------------------------

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.list_collection("products").await
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        self.get_document("products", id).await
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        self.set_document("products", &product.id, product).await
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        self.update_document("products", &product.id, product).await
    }

    async fn delete_product(&self, id: &str) -> StoreResult<()> {
        self.delete_document("products", id).await
    }

    // -- Categories -----------------------------------------------------

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.list_collection("categories").await
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        self.set_document("categories", &category.id, category).await
    }

    async fn delete_category(&self, id: &str) -> StoreResult<()> {
        self.delete_document("categories", id).await
    }

    // -- Users ----------------------------------------------------------

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.list_collection("users").await
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.get_document("users", id).await
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let mut users: Vec<User> = self
            .run_query(json!({
                "from": [{ "collectionId": "users" }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "username" },
                        "op": "EQUAL",
                        "value": { "stringValue": username }
                    }
                },
                "limit": 1
            }))
            .await?;
        Ok(users.pop())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        // No unique index in the document store: enforce at the boundary.
        if self.get_user_by_username(&user.username).await?.is_some() {
            return Err(StoreError::conflict("username", &user.username));
        }
        self.set_document("users", &user.id, user).await
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.update_document("users", &user.id, user).await
    }

    async fn delete_user(&self, id: &str) -> StoreResult<()> {
        self.delete_document("users", id).await
    }

    // -- Discounts ------------------------------------------------------

    async fn list_discounts(&self) -> StoreResult<Vec<Discount>> {
        self.list_collection("discounts").await
    }

    async fn insert_discount(&self, discount: &Discount) -> StoreResult<()> {
        self.set_document("discounts", &discount.id, discount).await
    }

    async fn update_discount(&self, discount: &Discount) -> StoreResult<()> {
        self.update_document("discounts", &discount.id, discount).await
    }

    async fn delete_discount(&self, id: &str) -> StoreResult<()> {
        self.delete_document("discounts", id).await
    }

    // -- Sales ----------------------------------------------------------

    async fn record_sale(
        &self,
        transaction: &Transaction,
        items: &[TransactionItem],
    ) -> StoreResult<()> {
        debug!(id = %transaction.id, items = items.len(), "committing sale batch");

        let mut writes = Vec::with_capacity(1 + items.len() * 2);
        writes.push(json!({
            "update": {
                "name": self.doc_name("transactions", &transaction.id),
                "fields": encode_fields(transaction)?
            }
        }));
        for item in items {
            writes.push(json!({
                "update": {
                    "name": self.doc_name("transaction_items", &item.id),
                    "fields": encode_fields(item)?
                }
            }));
            // Server-side increment with a negative delta; enqueued in the
            // same batch so stock moves with the sale or not at all.
            writes.push(json!({
                "transform": {
                    "document": self.doc_name("products", &item.product_id),
                    "fieldTransforms": [{
                        "fieldPath": "stock",
                        "increment": { "integerValue": (-item.quantity).to_string() }
                    }]
                }
            }));
        }

        let resp = self
            .client
            .post(self.commit_url())
            .json(&json!({ "writes": writes }))
            .send()
            .await?;
        expect_ok(resp, "record_sale").await?;
        Ok(())
    }

    async fn list_transactions(
        &self,
        limit: u32,
        user_id: Option<&str>,
    ) -> StoreResult<Vec<Transaction>> {
        let mut query = json!({
            "from": [{ "collectionId": "transactions" }],
            "orderBy": [{
                "field": { "fieldPath": "created_at" },
                "direction": "DESCENDING"
            }],
            "limit": limit
        });
        if let Some(user) = user_id {
            query["where"] = json!({
                "fieldFilter": {
                    "field": { "fieldPath": "user_id" },
                    "op": "EQUAL",
                    "value": { "stringValue": user }
                }
            });
        }
        self.run_query(query).await
    }

    async fn get_transaction(&self, id: &str) -> StoreResult<Option<Transaction>> {
        self.get_document("transactions", id).await
    }

    async fn transaction_items(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Vec<TransactionItem>> {
        self.run_query(json!({
            "from": [{ "collectionId": "transaction_items" }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "transaction_id" },
                    "op": "EQUAL",
                    "value": { "stringValue": transaction_id }
                }
            }
        }))
        .await
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        gateway_external_id: Option<&str>,
    ) -> StoreResult<()> {
        // Field mask keeps this a narrow write: everything outside the mask
        // is untouched, so repeating a terminal status is a no-op.
        let mut url = format!(
            "{}&currentDocument.exists=true&updateMask.fieldPaths=payment_status",
            self.doc_url("transactions", id)
        );
        let mut fields = Map::new();
        fields.insert(
            "payment_status".into(),
            json!({ "stringValue": serde_json::to_value(status)? }),
        );
        if let Some(external_id) = gateway_external_id {
            url.push_str("&updateMask.fieldPaths=gateway_external_id");
            fields.insert(
                "gateway_external_id".into(),
                json!({ "stringValue": external_id }),
            );
        }

        let resp = self
            .client
            .patch(url)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        expect_ok(resp, "transactions")
            .await
            .map_err(|e| contextualize_not_found(e, "transaction", id))?;
        Ok(())
    }
}

// =============================================================================
// Typed Value Encoding
// =============================================================================
// The wire format types every field: strings as {"stringValue": ..},
// integers as decimal strings, doubles and booleans as JSON scalars.

fn encode_fields<T: Serialize>(entity: &T) -> StoreResult<Map<String, Value>> {
    let value = serde_json::to_value(entity)?;
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::Unknown("entity did not serialize to an object".into()))?;
    Ok(object
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect())
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({
            "mapValue": {
                "fields": map
                    .iter()
                    .map(|(k, v)| (k.clone(), encode_value(v)))
                    .collect::<Map<_, _>>()
            }
        }),
    }
}

fn decode_document<T: DeserializeOwned>(doc: &Value) -> StoreResult<T> {
    let fields = doc
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::Unknown("document without fields".into()))?;
    let plain: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect();
    Ok(serde_json::from_value(Value::Object(plain))?)
}

fn decode_value(value: &Value) -> Value {
    if let Some(s) = value.get("stringValue") {
        return s.clone();
    }
    if let Some(b) = value.get("booleanValue") {
        return b.clone();
    }
    if let Some(i) = value.get("integerValue") {
        // Integers travel as decimal strings.
        let parsed = i
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| i.as_i64());
        return parsed.map_or(Value::Null, Into::into);
    }
    if let Some(d) = value.get("doubleValue") {
        return d.clone();
    }
    if let Some(a) = value.get("arrayValue") {
        let values = a
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(m) = value.get("mapValue") {
        let fields = m
            .get("fields")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), decode_value(v)))
                    .collect()
            })
            .unwrap_or_default();
        return Value::Object(fields);
    }
    Value::Null
}
