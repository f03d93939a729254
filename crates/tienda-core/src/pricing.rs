//! # Line Pricing
//!
//! Turns requested lines into priced lines using the product's price at the
//! moment of sale.
//!
//! ## Snapshot Pattern
//! ```text
//! LineRequest { product: "P1", quantity: 2 }
//!      │
//!      │  product resolved by the recorder (P1, price 10.00)
//!      ▼
//! price_line() ← THIS MODULE
//!      │
//!      ▼
//! PricedLine { unit_price: 10.00, quantity: 2, total: 20.00 }
//!      │
//!      ▼
//! Later price change on P1 ──► recorded line stays at 20.00
//! ```

use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, TransactionProduct};
use crate::validation;

/// A line item priced against a product snapshot, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total: Money,
}

impl PricedLine {
    /// Assigns an id and converts into the stored line item shape.
    pub fn into_line_item(self) -> TransactionProduct {
        TransactionProduct {
            id: Uuid::new_v4().to_string(),
            product: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price_cents: self.unit_price.cents(),
            total_cents: self.total.cents(),
        }
    }
}

/// Prices `quantity` units of `product` at its current price.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use tienda_core::pricing::price_line;
/// use tienda_core::Product;
///
/// let p1 = Product {
///     id: "P1".into(),
///     name: "Coffee".into(),
///     description: None,
///     price_cents: 1000,
///     stock: 10,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
/// let line = price_line(&p1, 2).unwrap();
/// assert_eq!(line.total.cents(), 2000);
/// ```
pub fn price_line(product: &Product, quantity: i64) -> CoreResult<PricedLine> {
    validation::validate_quantity(quantity)?;

    let unit_price = product.price();
    let total = unit_price
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| CoreError::AmountOverflow {
            product: product.id.clone(),
        })?;

    Ok(PricedLine {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity,
        unit_price,
        total,
    })
}

/// Header total: the exact sum of the line totals.
///
/// ## Errors
/// `TotalOverflow` when the sum does not fit in `i64` cents, even though
/// each line priced on its own.
pub fn transaction_total(lines: &[PricedLine]) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |acc, line| {
        acc.checked_add(line.total).ok_or(CoreError::TotalOverflow)
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
