//! # Backend Dispatcher
//!
//! The single entry point the rest of the application talks to. Resolves
//! the configured adapter once at startup and then delegates every
//! operation verbatim.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  AppConfig ──► Store::connect ──► Box<dyn Backend>              │
//! │                     │                                           │
//! │                     ├── backend: None → NotConfigured (fail     │
//! │                     │   fast, before any I/O is attempted)      │
//! │                     └── sub-config missing → NotConfigured      │
//! │                                                                 │
//! │  Store adds nothing: no retries, no caching, no error           │
//! │  translation. Per-engine semantics (including PartialFailure)   │
//! │  pass through unchanged.                                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use easypos_core::{
    Category, Discount, PaymentStatus, Product, Transaction, TransactionItem, User,
};
use tracing::info;

use crate::backend::Backend;
use crate::config::{AppConfig, BackendKind};
use crate::docstore::DocStoreBackend;
use crate::error::{StoreError, StoreResult};
use crate::remote::RemoteDbBackend;
use crate::sqlite::{DbConfig, SqliteBackend};

/// Configured store facade. Construct via [`Store::connect`].
pub struct Store {
    backend: Box<dyn Backend>,
    kind: BackendKind,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("kind", &self.kind).finish_non_exhaustive()
    }
}

impl Store {
    /// Resolves the adapter named by `config.backend`.
    ///
    /// Fails with [`StoreError::NotConfigured`] when no backend is selected
    /// or the selected backend's connection parameters are absent. Callers
    /// should route that error to the setup flow, not retry.
    pub async fn connect(config: &AppConfig) -> StoreResult<Self> {
        let kind = config.backend.ok_or_else(|| {
            StoreError::NotConfigured("no backend selected; run setup first".into())
        })?;

        let backend: Box<dyn Backend> = match kind {
            BackendKind::Sqlite => {
                let sqlite = config.sqlite.as_ref().ok_or_else(|| {
                    StoreError::NotConfigured("sqlite backend selected but not configured".into())
                })?;
                // A shared-nothing `:memory:` database needs a single
                // connection or every pool member sees a different store.
                let db_config = if sqlite.database_path == ":memory:" {
                    DbConfig::in_memory()
                } else {
                    DbConfig::new(&sqlite.database_path)
                };
                Box::new(SqliteBackend::connect(db_config).await?)
            }
            BackendKind::DocStore => {
                let docstore = config.docstore.as_ref().ok_or_else(|| {
                    StoreError::NotConfigured(
                        "docstore backend selected but not configured".into(),
                    )
                })?;
                Box::new(DocStoreBackend::connect(docstore.clone()))
            }
            BackendKind::RemoteDb => {
                let remote = config.remote_db.as_ref().ok_or_else(|| {
                    StoreError::NotConfigured(
                        "remote_db backend selected but not configured".into(),
                    )
                })?;
                Box::new(RemoteDbBackend::connect(remote.clone())?)
            }
        };

        info!(backend = %kind, "store connected");
        Ok(Store { backend, kind })
    }

    /// Wraps an already-constructed adapter. Used by tests and by callers
    /// that build their adapter by hand.
    pub fn with_backend(backend: Box<dyn Backend>, kind: BackendKind) -> Self {
        Store { backend, kind }
    }

    /// Which engine this store is backed by.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    // -- Products -------------------------------------------------------

    pub async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.backend.list_products().await
    }

    pub async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        self.backend.get_product(id).await
    }

    pub async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        self.backend.insert_product(product).await
    }

    pub async fn update_product(&self, product: &Product) -> StoreResult<()> {
        self.backend.update_product(product).await
    }

    pub async fn delete_product(&self, id: &str) -> StoreResult<()> {
        self.backend.delete_product(id).await
    }

    // -- Categories -----------------------------------------------------

    pub async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.backend.list_categories().await
    }

    pub async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        self.backend.insert_category(category).await
    }

    pub async fn delete_category(&self, id: &str) -> StoreResult<()> {
        self.backend.delete_category(id).await
    }

    // -- Users ----------------------------------------------------------

    pub async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.backend.list_users().await
    }

    pub async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.backend.get_user(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.backend.get_user_by_username(username).await
    }

    pub async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.backend.insert_user(user).await
    }

    pub async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.backend.update_user(user).await
    }

    pub async fn delete_user(&self, id: &str) -> StoreResult<()> {
        self.backend.delete_user(id).await
    }

    // -- Discounts ------------------------------------------------------

    pub async fn list_discounts(&self) -> StoreResult<Vec<Discount>> {
        self.backend.list_discounts().await
    }

    pub async fn insert_discount(&self, discount: &Discount) -> StoreResult<()> {
        self.backend.insert_discount(discount).await
    }

    pub async fn update_discount(&self, discount: &Discount) -> StoreResult<()> {
        self.backend.update_discount(discount).await
    }

    pub async fn delete_discount(&self, id: &str) -> StoreResult<()> {
        self.backend.delete_discount(id).await
    }

    // -- Sales ----------------------------------------------------------

    pub async fn record_sale(
        &self,
        transaction: &Transaction,
        items: &[TransactionItem],
    ) -> StoreResult<()> {
        self.backend.record_sale(transaction, items).await
    }

    pub async fn list_transactions(
        &self,
        limit: u32,
        user_id: Option<&str>,
    ) -> StoreResult<Vec<Transaction>> {
        self.backend.list_transactions(limit, user_id).await
    }

    pub async fn get_transaction(&self, id: &str) -> StoreResult<Option<Transaction>> {
        self.backend.get_transaction(id).await
    }

    pub async fn transaction_items(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Vec<TransactionItem>> {
        self.backend.transaction_items(transaction_id).await
    }

    pub async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        gateway_external_id: Option<&str>,
    ) -> StoreResult<()> {
        self.backend
            .update_payment_status(id, status, gateway_external_id)
            .await
    }
}
