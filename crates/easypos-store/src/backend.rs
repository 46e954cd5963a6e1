//! # Backend Adapter Interface
//!
//! The polymorphism boundary of EasyPOS: one capability contract, three
//! interchangeable storage engines.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Backend (trait)                            │
//! │   catalog CRUD · user lookup · record_sale · reports reads      │
//! │        ▲                  ▲                   ▲                 │
//! │        │                  │                   │                 │
//! │  SqliteBackend     DocStoreBackend     RemoteDbBackend          │
//! │  (embedded file,   (document batch     (sequential REST,       │
//! │   BEGIN/COMMIT)     + increments)       compensations: none)    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every implementation must produce identical externally observable
//! results for these operations, except where the record_sale contract
//! below grants the remote relational engine a weaker guarantee.
//!
//! ## record_sale contract
//!
//! Given a fully-populated transaction header and its line items,
//! `record_sale` persists the header, persists every item, and decrements
//! each referenced product's stock by the item quantity, in that order.
//!
//! - `SqliteBackend` wraps all three steps in one native transaction:
//!   everything commits or nothing does.
//! - `DocStoreBackend` enqueues header, items, and stock increments
//!   (negative delta) into one atomic batched commit.
//! - `RemoteDbBackend` issues the steps as independent sequential calls
//!   and does NOT roll back on a late failure; it reports
//!   [`StoreError::PartialFailure`](crate::error::StoreError::PartialFailure)
//!   instead. Documented, deliberate, and asserted by its tests.
//!
//! Stock is decremented without a pre-check and may go negative under
//! concurrent sales. That is an accepted risk, not a bug.

use async_trait::async_trait;
use easypos_core::{
    Category, Discount, PaymentStatus, Product, Transaction, TransactionItem, User,
};

use crate::error::StoreResult;

/// Capability contract every storage engine implements.
///
/// Reads of a single entity return `Ok(None)` when the id is unknown;
/// updates and deletes of an unknown id return `StoreError::NotFound`.
#[async_trait]
pub trait Backend: Send + Sync {
    // -- Products -------------------------------------------------------

    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>>;
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    async fn update_product(&self, product: &Product) -> StoreResult<()>;
    async fn delete_product(&self, id: &str) -> StoreResult<()>;

    // -- Categories -----------------------------------------------------

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn insert_category(&self, category: &Category) -> StoreResult<()>;
    /// Deleting a category with products is allowed; its products keep a
    /// dangling `category_id` (no referential integrity across backends).
    async fn delete_category(&self, id: &str) -> StoreResult<()>;

    // -- Users ----------------------------------------------------------

    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// Fails with `Conflict` when the username is already taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn update_user(&self, user: &User) -> StoreResult<()>;
    async fn delete_user(&self, id: &str) -> StoreResult<()>;

    // -- Discounts ------------------------------------------------------

    async fn list_discounts(&self) -> StoreResult<Vec<Discount>>;
    async fn insert_discount(&self, discount: &Discount) -> StoreResult<()>;
    async fn update_discount(&self, discount: &Discount) -> StoreResult<()>;
    async fn delete_discount(&self, id: &str) -> StoreResult<()>;

    // -- Sales ----------------------------------------------------------

    /// The one multi-entity write. See the module docs for the per-engine
    /// atomicity policy.
    async fn record_sale(
        &self,
        transaction: &Transaction,
        items: &[TransactionItem],
    ) -> StoreResult<()>;

    /// At most `limit` transactions, `created_at` descending, optionally
    /// restricted to one user (cashiers only ever see their own sales).
    async fn list_transactions(
        &self,
        limit: u32,
        user_id: Option<&str>,
    ) -> StoreResult<Vec<Transaction>>;

    async fn get_transaction(&self, id: &str) -> StoreResult<Option<Transaction>>;

    async fn transaction_items(&self, transaction_id: &str)
        -> StoreResult<Vec<TransactionItem>>;

    /// Narrow write used by gateway confirmation: updates `payment_status`
    /// and optionally the gateway correlation id, nothing else. Idempotent:
    /// safe to call repeatedly with the same terminal status.
    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        gateway_external_id: Option<&str>,
    ) -> StoreResult<()>;
}
