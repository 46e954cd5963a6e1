//! # Error Types
//!
//! Domain errors for easypos-core. Storage errors live in easypos-store;
//! these cover checkout math only and are raised before anything touches a
//! backend.

use thiserror::Error;

/// Checkout-time business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale needs at least one line item.
    #[error("cart is empty")]
    EmptyCart,

    /// Line quantities must be positive integers.
    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// Cash tendered does not cover the post-discount total.
    #[error("insufficient payment: total {total}, tendered {tendered}")]
    InsufficientPayment { total: f64, tendered: f64 },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
