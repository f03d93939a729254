//! # Validation Module
//!
//! Field validation for request payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: JSON decoding (axum Json extractor)                          │
//! │  ├── Missing fields, wrong types, unknown enum values                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Lengths, formats, numeric ranges                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (client email, ids)                                        │
//! │  └── Foreign keys (transaction → client, line → product)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure at any layer surfaces as HTTP 400 `{"error": <message>}`.

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, RESERVED_PRODUCT_ID};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn require_bounded(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::too_long(field, max));
    }

    Ok(())
}

/// Validates a client document number (primary key, at most 50 characters).
///
/// ## Example
/// ```rust
/// use tienda_core::validation::validate_document;
///
/// assert!(validate_document("1032456789").is_ok());
/// assert!(validate_document("").is_err());
/// ```
pub fn validate_document(document: &str) -> ValidationResult<()> {
    require_bounded("document", document, 50)
}

/// Validates a person's name or last name (at most 100 characters).
pub fn validate_person_name(field: &str, value: &str) -> ValidationResult<()> {
    require_bounded(field, value, 100)
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty, at most 255 characters
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot that is neither first nor last
///
/// ## Example
/// ```rust
/// use tienda_core::validation::validate_email;
///
/// assert!(validate_email("ana@example.com").is_ok());
/// assert!(validate_email("ana@localhost").is_err());
/// assert!(validate_email("not-an-email").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    require_bounded("email", email, 255)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("must contain '@'"))?;

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must contain a single '@' after the user name"));
    }

    if domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') {
        return Err(invalid("must have a valid domain"));
    }

    Ok(())
}

/// Validates an optional phone number.
///
/// ## Rules
/// - At most 15 characters
/// - Digits, spaces, `+`, `-`, parentheses only
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    if phone.chars().count() > 15 {
        return Err(ValidationError::too_long("phone", 15));
    }

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces, '+', '-' and parentheses".to_string(),
        });
    }

    Ok(())
}

/// Validates a caller-supplied product id.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, numbers, hyphens and underscores only (it appears in URLs)
///
/// ## Example
/// ```rust
/// use tienda_core::validation::validate_product_id;
///
/// assert!(validate_product_id("P1").is_ok());
/// assert!(validate_product_id("has space").is_err());
/// assert!(validate_product_id("healthcheck").is_err());
/// ```
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    require_bounded("id", id, 50)?;

    if !id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    if id.trim().eq_ignore_ascii_case(RESERVED_PRODUCT_ID) {
        return Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: format!("'{}' is reserved", RESERVED_PRODUCT_ID),
        });
    }

    Ok(())
}

/// Validates a product name (1 to 200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    require_bounded("name", name, 200)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_PRICE_CENTS
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price_cents".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock level. Negative stock is not representable here.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
