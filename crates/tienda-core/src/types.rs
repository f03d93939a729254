//! # Domain Types
//!
//! Core records and request payloads used throughout the back-office.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │     Client      │   │   Transaction   │   │ TransactionProduct   │  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────────  │  │
//! │  │  document (PK)  │◄──│  client         │   │  product (ref)       │  │
//! │  │  email (unique) │   │  payment_method │──►│  unit_price snapshot │  │
//! │  │  name, phone    │   │  status, total  │   │  quantity, total     │  │
//! │  └─────────────────┘   └─────────────────┘   └──────────┬───────────┘  │
//! │                                                          │              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────▼───────────┐  │
//! │  │ PaymentMethod   │   │TransactionStatus│   │       Product        │  │
//! │  │  CASH           │   │  PENDING        │   │  id, name            │  │
//! │  │  CARD           │   │  PAID           │   │  price_cents, stock  │  │
//! │  │  TRANSFER       │   │  CANCELLED      │   └──────────────────────┘  │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! A Transaction owns its line items. Clients and Products are only referenced.
//!
//! ## Payload Types
//! Each resource has three inbound shapes:
//! - `New*` / the record itself - body of `POST`
//! - `*Fields` - body of `PUT` (full replacement, identity excluded)
//! - `*Patch` - body of `PATCH` (every field optional)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation;
use crate::{MAX_ITEM_QUANTITY, MAX_TRANSACTION_LINES};

// =============================================================================
// Client
// =============================================================================

/// A customer of the store, identified by their document number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    /// National document number; primary key.
    pub document: String,
    pub name: String,
    pub last_name: String,
    /// Unique across clients. Receives transaction confirmations.
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl Client {
    /// Validates every field of a client record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_document(&self.document)?;
        validation::validate_person_name("name", &self.name)?;
        validation::validate_person_name("last_name", &self.last_name)?;
        validation::validate_email(&self.email)?;
        if let Some(phone) = &self.phone {
            validation::validate_phone(phone)?;
        }
        Ok(())
    }
}

/// Full replacement of a client's mutable fields (`PUT`).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFields {
    pub name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ClientFields {
    /// Builds the replacement record for `document`.
    pub fn into_client(self, document: &str) -> Client {
        Client {
            document: document.to_string(),
            name: self.name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
        }
    }
}

/// Partial update of a client (`PATCH`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ClientPatch {
    /// Applies the present fields onto `client`.
    pub fn apply(self, mut client: Client) -> Client {
        if let Some(name) = self.name {
            client.name = name;
        }
        if let Some(last_name) = self.last_name {
            client.last_name = last_name;
        }
        if let Some(email) = self.email {
            client.email = email;
        }
        if self.phone.is_some() {
            client.phone = self.phone;
        }
        if self.address.is_some() {
            client.address = self.address;
        }
        client
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Caller-supplied code (e.g. `P1`) or a generated UUID v4.
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Current unit price in cents.
    pub price_cents: i64,
    /// Quantity on hand.
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Body of `POST /products`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    /// Optional explicit id; a UUID is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(id) = &self.id {
            validation::validate_product_id(id)?;
        }
        validation::validate_product_name(&self.name)?;
        validation::validate_price_cents(self.price_cents)?;
        validation::validate_stock(self.stock)?;
        Ok(())
    }
}

/// Full replacement of a product's mutable fields (`PUT`).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
}

impl ProductFields {
    /// Replaces the mutable fields of `product`, keeping id and creation time.
    pub fn apply(self, mut product: Product) -> Product {
        product.name = self.name;
        product.description = self.description;
        product.price_cents = self.price_cents;
        product.stock = self.stock;
        product
    }
}

/// Partial update of a product (`PATCH`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
}

impl ProductPatch {
    pub fn apply(self, mut product: Product) -> Product {
        if let Some(name) = self.name {
            product.name = name;
        }
        if self.description.is_some() {
            product.description = self.description;
        }
        if let Some(price_cents) = self.price_cents {
            product.price_cents = price_cents;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        product
    }
}

/// Validates a product record after a PUT or PATCH has been applied.
pub fn validate_product(product: &Product) -> Result<(), ValidationError> {
    validation::validate_product_name(&product.name)?;
    validation::validate_price_cents(product.price_cents)?;
    validation::validate_stock(product.stock)?;
    Ok(())
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a transaction was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] =
        [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Transfer];

    /// Wire name, as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL.iter().map(|m| m.to_string()).collect(),
            })
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle status of a recorded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Recorded, payment not yet confirmed.
    Pending,
    Paid,
    Cancelled,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 3] = [
        TransactionStatus::Pending,
        TransactionStatus::Paid,
        TransactionStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Paid => "PAID",
            TransactionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A recorded sale: header plus its ordered line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: String,
    /// Document of the purchasing client.
    pub client: String,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    /// Always Σ products[].total_cents.
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Line items in insertion order.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub products: Vec<TransactionProduct>,
}

impl Transaction {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a transaction.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionProduct {
    pub id: String,
    /// Referenced product id.
    pub product: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// unit_price_cents × quantity.
    pub total_cents: i64,
}

impl TransactionProduct {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One requested line: which product and how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product: String,
    pub quantity: i64,
}

/// Body of `POST /transactions` and `PUT /transactions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub client: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(alias = "items")]
    pub products: Vec<LineRequest>,
}

impl NewTransaction {
    /// Checks the payload shape before anything is resolved against storage.
    ///
    /// ## Rules
    /// - `client` must not be empty
    /// - at least one line, at most [`MAX_TRANSACTION_LINES`]
    /// - every quantity within 1..=[`MAX_ITEM_QUANTITY`]
    pub fn validate(&self) -> CoreResult<()> {
        if self.client.trim().is_empty() {
            return Err(ValidationError::required("client").into());
        }
        validate_lines(&self.products)
    }
}

/// Partial update of a transaction (`PATCH`).
///
/// When `products` is present the line items are replaced and re-priced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPatch {
    pub client: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<TransactionStatus>,
    #[serde(alias = "items")]
    pub products: Option<Vec<LineRequest>>,
}

impl TransactionPatch {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(client) = &self.client {
            if client.trim().is_empty() {
                return Err(ValidationError::required("client").into());
            }
        }
        match &self.products {
            Some(lines) => validate_lines(lines),
            None => Ok(()),
        }
    }
}

impl From<NewTransaction> for TransactionPatch {
    fn from(full: NewTransaction) -> Self {
        TransactionPatch {
            client: Some(full.client),
            payment_method: Some(full.payment_method),
            status: Some(full.status),
            products: Some(full.products),
        }
    }
}

fn validate_lines(lines: &[LineRequest]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyTransaction);
    }
    if lines.len() > MAX_TRANSACTION_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_TRANSACTION_LINES,
        });
    }
    for line in lines {
        if line.product.trim().is_empty() {
            return Err(ValidationError::required("product").into());
        }
        if line.quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: line.quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        validation::validate_quantity(line.quantity)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client {
            document: "123".to_string(),
            name: "Ana".to_string(),
            last_name: "Gomez".to_string(),
            email: "ana@example.com".to_string(),
            phone: Some("+57 300 1234567".to_string()),
            address: None,
        }
    }

    #[test]
    fn test_enums_use_screaming_snake_case() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Card).unwrap(), "\"CARD\"");
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
        let method: PaymentMethod = serde_json::from_str("\"TRANSFER\"").unwrap();
        assert_eq!(method, PaymentMethod::Transfer);
        assert!(serde_json::from_str::<PaymentMethod>("\"card\"").is_err());
        assert_eq!("CASH".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert!("BITCOIN".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_new_transaction_accepts_items_alias() {
        let body = r#"{"client":"123","payment_method":"CARD","status":"PAID",
                       "items":[{"product":"P1","quantity":2}]}"#;
        let tx: NewTransaction = serde_json::from_str(body).unwrap();
        assert_eq!(tx.products.len(), 1);
        assert_eq!(tx.status, TransactionStatus::Paid);
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn test_new_transaction_validation() {
        let mut tx = NewTransaction {
            client: "123".to_string(),
            payment_method: PaymentMethod::Cash,
            status: TransactionStatus::Pending,
            products: vec![],
        };
        assert!(matches!(tx.validate(), Err(CoreError::EmptyTransaction)));

        tx.products.push(LineRequest {
            product: "P1".to_string(),
            quantity: 0,
        });
        assert!(matches!(tx.validate(), Err(CoreError::Validation(_))));

        tx.products[0].quantity = 1000;
        assert!(matches!(tx.validate(), Err(CoreError::QuantityTooLarge { .. })));

        tx.products[0].quantity = 2;
        tx.client = "  ".to_string();
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_client_patch_keeps_absent_fields() {
        let patched = ClientPatch {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        }
        .apply(client());

        assert_eq!(patched.email, "new@example.com");
        assert_eq!(patched.name, "Ana");
        assert_eq!(patched.phone.as_deref(), Some("+57 300 1234567"));
    }

    #[test]
    fn test_client_fields_replace_everything() {
        let replaced = ClientFields {
            name: "Luis".to_string(),
            last_name: "Perez".to_string(),
            email: "luis@example.com".to_string(),
            phone: None,
            address: Some("Calle 1".to_string()),
        }
        .into_client("123");

        assert_eq!(replaced.document, "123");
        assert_eq!(replaced.phone, None);
        assert!(replaced.validate().is_ok());
    }

    #[test]
    fn test_full_update_becomes_complete_patch() {
        let patch: TransactionPatch = NewTransaction {
            client: "123".to_string(),
            payment_method: PaymentMethod::Card,
            status: TransactionStatus::Paid,
            products: vec![LineRequest {
                product: "P1".to_string(),
                quantity: 1,
            }],
        }
        .into();

        assert_eq!(patch.payment_method, Some(PaymentMethod::Card));
        assert_eq!(patch.products.map(|p| p.len()), Some(1));
    }
}
