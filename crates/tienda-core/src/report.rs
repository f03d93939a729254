//! # Sales Report
//!
//! Aggregates recorded transactions into a sales summary.
//!
//! ## Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  [Transaction, Transaction, ...]                                        │
//! │        │                                                                │
//! │        ├──► transaction_count, total_revenue, average_ticket            │
//! │        ├──► by_payment_method  { CARD: {count, revenue}, ... }          │
//! │        ├──► by_status          { PAID: {count, revenue}, ... }          │
//! │        └──► products           [{product, units_sold, revenue}, ...]    │
//! │                                                                         │
//! │  Derived, never stored. Recomputed on every request.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transaction counts regardless of status; the `by_status` breakdown
//! lets readers separate cancelled revenue themselves. Sums saturate at the
//! `i64` bounds instead of wrapping.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::money::Money;
use crate::types::{PaymentMethod, Transaction, TransactionStatus};

/// Count and revenue of one breakdown bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub count: u64,
    pub revenue_cents: i64,
}

impl Bucket {
    fn record(&mut self, revenue: Money) {
        self.count += 1;
        self.revenue_cents = self.revenue_cents.saturating_add(revenue.cents());
    }
}

/// Per-product totals across all transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product: String,
    /// Name from the most recent line item seen for this product.
    pub name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
    /// Number of distinct transactions containing this product.
    pub transaction_count: u64,
}

/// The sales report served as JSON or rendered to PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesReport {
    pub generated_at: DateTime<Utc>,
    pub transaction_count: u64,
    pub total_revenue_cents: i64,
    pub average_ticket_cents: i64,
    pub by_payment_method: BTreeMap<PaymentMethod, Bucket>,
    pub by_status: BTreeMap<TransactionStatus, Bucket>,
    /// Sorted by revenue descending, then product id.
    pub products: Vec<ProductSales>,
}

impl SalesReport {
    /// Builds the report over `transactions`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use tienda_core::SalesReport;
    ///
    /// let report = SalesReport::from_transactions(&[], Utc::now());
    /// assert_eq!(report.transaction_count, 0);
    /// assert_eq!(report.average_ticket_cents, 0);
    /// ```
    pub fn from_transactions(transactions: &[Transaction], generated_at: DateTime<Utc>) -> Self {
        let mut by_payment_method: BTreeMap<PaymentMethod, Bucket> = BTreeMap::new();
        let mut by_status: BTreeMap<TransactionStatus, Bucket> = BTreeMap::new();
        let mut per_product: HashMap<&str, ProductSales> = HashMap::new();
        let mut total = Money::zero();

        for tx in transactions {
            let revenue = tx.total();
            total = total.saturating_add(revenue);
            by_payment_method
                .entry(tx.payment_method)
                .or_default()
                .record(revenue);
            by_status.entry(tx.status).or_default().record(revenue);

            let mut seen_in_tx: HashSet<&str> = HashSet::new();
            for line in &tx.products {
                let entry = per_product
                    .entry(line.product.as_str())
                    .or_insert_with(|| ProductSales {
                        product: line.product.clone(),
                        name: line.product_name.clone(),
                        units_sold: 0,
                        revenue_cents: 0,
                        transaction_count: 0,
                    });
                entry.name = line.product_name.clone();
                entry.units_sold = entry.units_sold.saturating_add(line.quantity);
                entry.revenue_cents = entry.revenue_cents.saturating_add(line.total_cents);
                if seen_in_tx.insert(line.product.as_str()) {
                    entry.transaction_count += 1;
                }
            }
        }

        let mut products: Vec<ProductSales> = per_product.into_values().collect();
        products.sort_by(|a, b| {
            b.revenue_cents
                .cmp(&a.revenue_cents)
                .then_with(|| a.product.cmp(&b.product))
        });

        SalesReport {
            generated_at,
            transaction_count: transactions.len() as u64,
            total_revenue_cents: total.cents(),
            average_ticket_cents: total.average(transactions.len()).cents(),
            by_payment_method,
            by_status,
            products,
        }
    }

    #[inline]
    pub fn total_revenue(&self) -> Money {
        Money::from_cents(self.total_revenue_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
