//! # Checkout Math
//!
//! Pure cart arithmetic and sale assembly.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  CartLine[]                                                     │
//! │      │  subtotal = Σ price × quantity                           │
//! │      ▼                                                          │
//! │  Discount (optional, active only)                               │
//! │      │  percentage: subtotal × value / 100                      │
//! │      │  fixed:      value                                       │
//! │      ▼                                                          │
//! │  total = max(0, subtotal − discount)                            │
//! │      │                                                          │
//! │      ├── cash:    change = tendered − total, status completed   │
//! │      └── gateway: charge = total, change = 0, status pending    │
//! │      ▼                                                          │
//! │  Transaction + TransactionItem[] (snapshot unit prices)         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here performs I/O; persistence of the assembled sale is the
//! store layer's `record_sale`. A retried checkout must go through
//! [`build_sale`] again so every attempt gets a fresh transaction id
//! (recorded sales are not idempotent by id).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{
    Discount, DiscountKind, PaymentMethod, PaymentStatus, Product, Transaction, TransactionItem,
};

// =============================================================================
// Cart
// =============================================================================

/// One cart entry: a product and how many units of it.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product: Product, quantity: i64) -> Self {
        CartLine { product, quantity }
    }

    /// Line total at the product's current price.
    #[inline]
    pub fn line_total(&self) -> f64 {
        self.product.price * self.quantity as f64
    }
}

/// Pre-discount sum over the cart.
pub fn subtotal(lines: &[CartLine]) -> f64 {
    lines.iter().map(CartLine::line_total).sum()
}

// =============================================================================
// Discounts
// =============================================================================

/// Discount amount for a subtotal. Inactive discounts contribute nothing,
/// matching the checkout screen which only offers active ones.
pub fn discount_amount(subtotal: f64, discount: Option<&Discount>) -> f64 {
    match discount {
        Some(d) if d.is_active => match d.kind {
            DiscountKind::Percentage => subtotal * d.value / 100.0,
            DiscountKind::Fixed => d.value,
        },
        _ => 0.0,
    }
}

/// Post-discount total, floored at zero.
#[inline]
pub fn total_after_discount(subtotal: f64, discount: f64) -> f64 {
    (subtotal - discount).max(0.0)
}

// =============================================================================
// Sale Assembly
// =============================================================================

/// How the customer is paying.
#[derive(Debug, Clone, Copy)]
pub enum Tender {
    /// Cash with the amount handed over.
    Cash { tendered: f64 },
    /// External gateway charge for the exact total.
    Gateway,
}

/// A fully-populated sale ready for `record_sale`.
#[derive(Debug, Clone)]
pub struct Sale {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

/// Assembles a transaction header and its line items from a cart.
///
/// Unit prices are snapshotted from the cart's products so later catalog
/// edits never rewrite history. Cash sales require `tendered >= total` and
/// are created `completed`; gateway sales are created `pending` with the
/// charge equal to the total and no change.
pub fn build_sale(
    user_id: &str,
    lines: &[CartLine],
    discount: Option<&Discount>,
    tender: Tender,
    now: DateTime<Utc>,
) -> CoreResult<Sale> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    for line in lines {
        if line.quantity <= 0 {
            return Err(CoreError::InvalidQuantity {
                product_id: line.product.id.clone(),
                quantity: line.quantity,
            });
        }
    }

    let subtotal = subtotal(lines);
    let applied = discount.filter(|d| d.is_active);
    let discount_value = discount_amount(subtotal, applied);
    let total = total_after_discount(subtotal, discount_value);

    let (method, status, payment_amount, change_amount) = match tender {
        Tender::Cash { tendered } => {
            if tendered < total {
                return Err(CoreError::InsufficientPayment {
                    total,
                    tendered,
                });
            }
            (
                PaymentMethod::Cash,
                PaymentStatus::Completed,
                tendered,
                tendered - total,
            )
        }
        Tender::Gateway => (PaymentMethod::Gateway, PaymentStatus::Pending, total, 0.0),
    };

    let transaction_id = Uuid::new_v4().to_string();
    let items = lines
        .iter()
        .map(|line| TransactionItem {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction_id.clone(),
            product_id: line.product.id.clone(),
            quantity: line.quantity,
            price: line.product.price,
        })
        .collect();

    let transaction = Transaction {
        id: transaction_id,
        user_id: user_id.to_string(),
        subtotal,
        discount_id: applied.map(|d| d.id.clone()),
        discount_amount: applied.map(|_| discount_value),
        total_amount: total,
        payment_amount,
        change_amount,
        payment_method: method,
        payment_status: status,
        gateway_external_id: None,
        gateway_invoice_url: None,
        created_at: now,
    };

    Ok(Sale { transaction, items })
}

// =============================================================================
// Unit Tests
// =============================================================================
