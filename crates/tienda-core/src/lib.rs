//! # tienda-core: Pure Business Logic for the Tienda Back-Office
//!
//! This crate holds every rule of the back-office that can be expressed
//! without touching a database, a socket or a mailbox.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tienda Back-Office Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    REST API (apps/api)                          │   │
//! │  │   Permission Gate ──► Registries / Recorder ──► Reports, Mail   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ tienda-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌──────────────┐   │   │
//! │  │  │   types   │ │  pricing  │ │  report   │ │ permissions  │   │   │
//! │  │  │  Client   │ │ snapshot  │ │ SalesRpt  │ │ policy table │   │   │
//! │  │  │  Product  │ │ line tot. │ │ breakdown │ │ 12 perms     │   │   │
//! │  │  └───────────┘ └───────────┘ └───────────┘ └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tienda-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records and request payloads (Client, Product, Transaction)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Price snapshotting for transaction line items
//! - [`report`] - Sales report aggregation
//! - [`receipt`] - Confirmation email composition
//! - [`permissions`] - Permission constants and the (resource, verb) policy table
//! - [`validation`] - Field validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tienda_core::money::Money;
//!
//! let unit_price = Money::from_cents(1000); // $10.00
//! let line_total = unit_price.multiply_quantity(2);
//! assert_eq!(line_total.cents(), 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod permissions;
pub mod pricing;
pub mod receipt;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use permissions::{required_permission, Permission, Resource, Verb};
pub use pricing::PricedLine;
pub use report::SalesReport;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single transaction.
pub const MAX_TRANSACTION_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest accepted unit price, in cents ($1,000,000,000.00).
///
/// Together with the line and quantity limits this keeps every transaction
/// total far inside `i64` cents.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Product id taken by the `/products/healthcheck` route.
pub const RESERVED_PRODUCT_ID: &str = "healthcheck";
