//! # Domain Types
//!
//! Core entity types shared by every storage backend.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Category ──< Product                                           │
//! │                  ▲                                              │
//! │                  │ product_id (snapshot price at sale time)     │
//! │  Transaction ──< TransactionItem                                │
//! │       │                                                         │
//! │       ├── user_id ──► User (admin | cashier)                    │
//! │       └── discount_id ──► Discount (percentage | fixed)         │
//! │  Config carries which backend owns all of the above.            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary amounts are `f64` to stay wire-compatible with the existing
//! stores (REAL columns / JSON numbers). Every backend reads and writes the
//! exact same shapes, so these types are the polymorphism contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Category
// =============================================================================

/// A product category.
///
/// Deleting a category does not cascade to its products; referential
/// integrity is not guaranteed across backends (known gap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4), stable across backends.
    pub id: String,

    /// Display name shown to the cashier and on receipts.
    pub name: String,

    /// Unit price. Non-negative.
    pub price: f64,

    /// Remaining sellable units. May go negative under concurrent sales
    /// against the same product; overselling is an accepted risk.
    pub stock: i64,

    /// Owning category.
    pub category_id: String,

    /// Optional business identifier (SKU / barcode).
    pub sku: Option<String>,

    /// Optional image reference (URI handled by the UI layer).
    pub image_uri: Option<String>,
}

// =============================================================================
// User
// =============================================================================

/// Role of a user. Cashiers only ever see their own sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Cashier,
}

/// A POS user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,

    /// Unique login name, enforced at the adapter boundary.
    pub username: String,

    /// Opaque credential comparison value. The existing stores hold this as
    /// plain text, not a real hash; carried as-is (known weakness).
    pub password_hash: String,

    pub role: Role,

    /// Inactive users cannot log in but keep their sale history.
    pub is_active: bool,
}

impl User {
    /// Compares a raw credential against the stored value.
    pub fn credential_matches(&self, raw: &str) -> bool {
        self.password_hash == raw
    }
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount is applied to the pre-discount subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Multiplies the subtotal: `subtotal * value / 100`.
    Percentage,
    /// Subtracts a flat amount.
    Fixed,
}

/// A checkout discount. Only applied while `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Discount {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub kind: DiscountKind,
    pub value: f64,
    pub is_active: bool,
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash; change computed at checkout.
    Cash,
    /// External payment gateway; confirmed asynchronously.
    Gateway,
}

/// Lifecycle state of a transaction's payment.
///
/// Cash sales are born `Completed`. Gateway sales are born `Pending` and
/// move to `Completed` or `Failed` via the status-update path, which is the
/// only mutation a committed transaction allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

// =============================================================================
// Transaction
// =============================================================================

/// A recorded sale header.
///
/// Immutable once created, except `payment_status` and the gateway
/// correlation id (updated asynchronously by gateway confirmation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: String,

    /// Who rang the sale.
    pub user_id: String,

    /// Pre-discount sum of `quantity * price` over the line items.
    pub subtotal: f64,

    /// Applied discount, if any.
    pub discount_id: Option<String>,

    /// Discount amount snapshot computed at checkout time.
    pub discount_amount: Option<f64>,

    /// Post-discount total, floored at zero.
    pub total_amount: f64,

    /// Amount tendered (cash) or charged (gateway).
    pub payment_amount: f64,

    /// Change returned to the customer (cash only).
    pub change_amount: f64,

    pub payment_method: PaymentMethod,

    pub payment_status: PaymentStatus,

    /// Correlation id assigned by the external gateway.
    pub gateway_external_id: Option<String>,

    /// Hosted payment page / QR reference from the gateway.
    pub gateway_invoice_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Transaction Item
// =============================================================================

/// A line item of a sale.
///
/// `price` is the unit price captured at sale time, independent of any later
/// catalog price change. Items are never written independently of their
/// parent transaction's creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub price: f64,
}

impl TransactionItem {
    /// Line total before discount.
    #[inline]
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_kind_serializes_as_type_field() {
        let discount = Discount {
            id: "d1".into(),
            name: "Grand opening".into(),
            kind: DiscountKind::Percentage,
            value: 10.0,
            is_active: true,
        };
        let json = serde_json::to_value(&discount).unwrap();
        assert_eq!(json["type"], "percentage");
    }

    #[test]
    fn payment_enums_use_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_value(PaymentMethod::Gateway).unwrap(),
            "gateway"
        );
        assert_eq!(
            serde_json::to_value(PaymentStatus::Pending).unwrap(),
            "pending"
        );
        assert_eq!(serde_json::to_value(Role::Cashier).unwrap(), "cashier");
    }

    #[test]
    fn credential_comparison_is_exact() {
        let user = User {
            id: "u1".into(),
            username: "admin".into(),
            password_hash: "s3cret".into(),
            role: Role::Admin,
            is_active: true,
        };
        assert!(user.credential_matches("s3cret"));
        assert!(!user.credential_matches("S3cret"));
    }

    #[test]
    fn line_total_multiplies_snapshot_price() {
        let item = TransactionItem {
            id: "i1".into(),
            transaction_id: "t1".into(),
            product_id: "p1".into(),
            quantity: 3,
            price: 10_000.0,
        };
        assert_eq!(item.line_total(), 30_000.0);
    }
}
