//! # Embedded SQLite Backend
//!
//! The local, file-backed adapter. This is the only engine with true
//! multi-statement atomicity: `record_sale` wraps header, items, and stock
//! decrements in a single native transaction (`BEGIN` … `COMMIT`,
//! `ROLLBACK` on any failure).

use async_trait::async_trait;
use easypos_core::{
    Category, Discount, PaymentStatus, Product, Transaction, TransactionItem, User,
};
use sqlx::SqlitePool;
use tracing::debug;

use crate::backend::Backend;
use crate::error::{StoreError, StoreResult};

mod pool;

pub use pool::DbConfig;

/// Adapter over an owned SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Opens (creating if missing) the database file, configures the pool,
    /// and applies embedded migrations.
    pub async fn connect(config: DbConfig) -> StoreResult<Self> {
        let pool = pool::connect(&config).await?;
        Ok(SqliteBackend { pool })
    }

    /// Pool access for diagnostics; prefer the trait methods.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    // -- Products -------------------------------------------------------

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        debug!(id = %product.id, name = %product.name, "inserting product");
        sqlx::query(
            "INSERT INTO products (id, name, price, stock, category_id, sku, image_uri) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category_id)
        .bind(&product.sku)
        .bind(&product.image_uri)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE products SET name = ?1, price = ?2, stock = ?3, category_id = ?4, \
             sku = ?5, image_uri = ?6 WHERE id = ?7",
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category_id)
        .bind(&product.sku)
        .bind(&product.image_uri)
        .bind(&product.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", &product.id));
        }
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id));
        }
        Ok(())
    }

    // -- Categories -----------------------------------------------------

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, name) VALUES (?1, ?2)")
            .bind(&category.id)
            .bind(&category.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_category(&self, id: &str) -> StoreResult<()> {
        // No FK enforcement: products keep a dangling category_id.
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("category", id));
        }
        Ok(())
    }

    // -- Users ----------------------------------------------------------

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        debug!(id = %user.id, username = %user.username, "inserting user");
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, role, is_active) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict { field, .. } => StoreError::conflict(field, &user.username),
            other => other,
        })?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET username = ?1, password_hash = ?2, role = ?3, is_active = ?4 \
             WHERE id = ?5",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(&user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict { field, .. } => StoreError::conflict(field, &user.username),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", &user.id));
        }
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        Ok(())
    }

    // -- Discounts ------------------------------------------------------

    async fn list_discounts(&self) -> StoreResult<Vec<Discount>> {
        let discounts = sqlx::query_as::<_, Discount>("SELECT * FROM discounts")
            .fetch_all(&self.pool)
            .await?;
        Ok(discounts)
    }

    async fn insert_discount(&self, discount: &Discount) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO discounts (id, name, type, value, is_active) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&discount.id)
        .bind(&discount.name)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_discount(&self, discount: &Discount) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE discounts SET name = ?1, type = ?2, value = ?3, is_active = ?4 \
             WHERE id = ?5",
        )
        .bind(&discount.name)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.is_active)
        .bind(&discount.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("discount", &discount.id));
        }
        Ok(())
    }

    async fn delete_discount(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("discount", id));
        }
        Ok(())
    }

    // -- Sales ----------------------------------------------------------

    async fn record_sale(
        &self,
        transaction: &Transaction,
        items: &[TransactionItem],
    ) -> StoreResult<()> {
        debug!(
            id = %transaction.id,
            items = items.len(),
            total = transaction.total_amount,
            "recording sale"
        );

        // One native transaction around all three steps. An early return
        // drops `db_tx`, which rolls back everything written so far.
        let mut db_tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO transactions ( \
                id, user_id, subtotal, discount_id, discount_amount, total_amount, \
                payment_amount, change_amount, payment_method, payment_status, \
                gateway_external_id, gateway_invoice_url, created_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&transaction.id)
        .bind(&transaction.user_id)
        .bind(transaction.subtotal)
        .bind(&transaction.discount_id)
        .bind(transaction.discount_amount)
        .bind(transaction.total_amount)
        .bind(transaction.payment_amount)
        .bind(transaction.change_amount)
        .bind(transaction.payment_method)
        .bind(transaction.payment_status)
        .bind(&transaction.gateway_external_id)
        .bind(&transaction.gateway_invoice_url)
        .bind(transaction.created_at)
        .execute(&mut *db_tx)
        .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO transaction_items (id, transaction_id, product_id, quantity, price) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&item.id)
            .bind(&item.transaction_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *db_tx)
            .await?;

            // No stock pre-check and no row lock: negative stock is allowed.
            sqlx::query("UPDATE products SET stock = stock - ?1 WHERE id = ?2")
                .bind(item.quantity)
                .bind(&item.product_id)
                .execute(&mut *db_tx)
                .await?;
        }

        db_tx.commit().await?;
        Ok(())
    }

    async fn list_transactions(
        &self,
        limit: u32,
        user_id: Option<&str>,
    ) -> StoreResult<Vec<Transaction>> {
        let transactions = match user_id {
            Some(user) => {
                sqlx::query_as::<_, Transaction>(
                    "SELECT * FROM transactions WHERE user_id = ?1 \
                     ORDER BY created_at DESC LIMIT ?2",
                )
                .bind(user)
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Transaction>(
                    "SELECT * FROM transactions ORDER BY created_at DESC LIMIT ?1",
                )
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(transactions)
    }

    async fn get_transaction(&self, id: &str) -> StoreResult<Option<Transaction>> {
        let transaction =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(transaction)
    }

    async fn transaction_items(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Vec<TransactionItem>> {
        let items = sqlx::query_as::<_, TransactionItem>(
            "SELECT * FROM transaction_items WHERE transaction_id = ?1",
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        gateway_external_id: Option<&str>,
    ) -> StoreResult<()> {
        debug!(id = %id, status = ?status, "updating payment status");
        let result = sqlx::query(
            "UPDATE transactions SET payment_status = ?1, \
             gateway_external_id = COALESCE(?2, gateway_external_id) WHERE id = ?3",
        )
        .bind(status)
        .bind(gateway_external_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("transaction", id));
        }
        Ok(())
    }
}
