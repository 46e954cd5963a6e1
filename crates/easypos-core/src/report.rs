//! # Reporting Aggregator
//!
//! Read-side aggregation over already-loaded transaction history. The store
//! layer returns plain `Vec`s; everything here folds them into summaries
//! with no storage access and no hidden wall clock; callers inject `now`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::types::{Product, Transaction, TransactionItem};

/// Trailing window for [`revenue_by_day`].
pub const REVENUE_WINDOW_DAYS: u32 = 7;

/// Only the most recent transactions are scanned for top products.
/// Bounded-cost tradeoff, not a correctness requirement.
pub const TOP_PRODUCT_SCAN: usize = 100;

/// How many top sellers to report.
pub const TOP_PRODUCT_LIMIT: usize = 5;

// =============================================================================
// Revenue By Day
// =============================================================================

/// Revenue bucket for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
}

/// Buckets transactions by the date portion of `created_at` over the last
/// `days` days ending at `now`, oldest bucket first. Days with no
/// transactions report zero.
///
/// Buckets are UTC calendar days. Callers that want store-local days must
/// inject a `now` shifted by the store's UTC offset (timestamps are stored
/// in UTC everywhere).
pub fn revenue_by_day(
    transactions: &[Transaction],
    now: DateTime<Utc>,
    days: u32,
) -> Vec<DailyRevenue> {
    let today = now.date_naive();
    (0..days as i64)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let revenue = transactions
                .iter()
                .filter(|tx| tx.created_at.date_naive() == date)
                .map(|tx| tx.total_amount)
                .sum();
            DailyRevenue { date, revenue }
        })
        .collect()
}

// =============================================================================
// Top Products
// =============================================================================

/// A top-selling product and its total quantity sold.
#[derive(Debug, Clone, PartialEq)]
pub struct TopProduct {
    pub product: Product,
    pub quantity: i64,
}

/// Sums quantities per product across the items of the most recent
/// [`TOP_PRODUCT_SCAN`] transactions and returns the top `limit`, sorted
/// descending by quantity. Items whose product id no longer resolves to a
/// known product are silently dropped.
pub fn top_products(
    transactions: &[Transaction],
    items: &[TransactionItem],
    products: &[Product],
    limit: usize,
) -> Vec<TopProduct> {
    let mut recent: Vec<&Transaction> = transactions.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(TOP_PRODUCT_SCAN);
    let scanned: HashSet<&str> = recent.iter().map(|tx| tx.id.as_str()).collect();

    let mut quantities: HashMap<&str, i64> = HashMap::new();
    for item in items {
        if scanned.contains(item.transaction_id.as_str()) {
            *quantities.entry(item.product_id.as_str()).or_default() += item.quantity;
        }
    }

    let mut ranked: Vec<TopProduct> = quantities
        .into_iter()
        .filter_map(|(product_id, quantity)| {
            products
                .iter()
                .find(|p| p.id == product_id)
                .map(|product| TopProduct {
                    product: product.clone(),
                    quantity,
                })
        })
        .collect();

    // Quantity descending, product id as a deterministic tiebreak.
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.product.id.cmp(&b.product.id))
    });
    ranked.truncate(limit);
    ranked
}

// =============================================================================
// Sales Summary
// =============================================================================

/// Today/total aggregates shown on the stats screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    /// Running revenue across all loaded transactions.
    pub total_revenue: f64,
    /// Revenue of transactions created on `now`'s calendar day.
    pub today_revenue: f64,
    /// Count of transactions created on `now`'s calendar day.
    pub today_count: usize,
    /// `total_revenue / count`, 0 when there are no transactions.
    pub average_order: f64,
}

/// "Today" is `now`'s UTC calendar day; see [`revenue_by_day`] for how to
/// get store-local days instead.
pub fn sales_summary(transactions: &[Transaction], now: DateTime<Utc>) -> SalesSummary {
    let today = now.date_naive();
    let total_revenue: f64 = transactions.iter().map(|tx| tx.total_amount).sum();
    let todays: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.created_at.date_naive() == today)
        .collect();

    SalesSummary {
        total_revenue,
        today_revenue: todays.iter().map(|tx| tx.total_amount).sum(),
        today_count: todays.len(),
        average_order: if transactions.is_empty() {
            0.0
        } else {
            total_revenue / transactions.len() as f64
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
