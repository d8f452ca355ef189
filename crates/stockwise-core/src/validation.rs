//! # Validation Module
//!
//! Input validation for Stockwise.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end (CLI / UI)                                         │
//! │  └── Parsing (is "12.5" a number?)                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + ledger                                         │
//! │  ├── quantity ≥ 1, amounts ≥ 0                                         │
//! │  └── names trimmed, bounded, non-empty                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  ├── UNIQUE (name_key), see product_name_key()                         │
//! │  └── Foreign keys with ON DELETE CASCADE                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::{MAX_CUSTOMER_LEN, MAX_PRODUCT_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `MAX_PRODUCT_NAME_LEN` characters
///
/// ## Example
/// ```rust
/// use stockwise_core::validation::validate_product_name;
///
/// assert_eq!(validate_product_name("  Widget ").unwrap(), "Widget");
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Lookup key under which product names are unique.
///
/// Trimmed and lowercased with Unicode rules, so "Café" and "CAFÉ" share a
/// key. SQLite's own `NOCASE` and `lower()` only fold ASCII, so the key is
/// computed here and stored alongside the name.
///
/// ```rust
/// use stockwise_core::validation::product_name_key;
///
/// assert_eq!(product_name_key(" Ñandú "), product_name_key("ñANDÚ"));
/// ```
pub fn product_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalises an optional customer label.
///
/// Blank input means "no customer" and becomes `None`.
pub fn validate_customer(customer: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(customer) = customer.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if customer.chars().count() > MAX_CUSTOMER_LEN {
        return Err(ValidationError::TooLong {
            field: "customer".to_string(),
            max: MAX_CUSTOMER_LEN,
        });
    }

    Ok(Some(customer.to_string()))
}

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use stockwise_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a purchase or sale quantity.
///
/// ## Rules
/// - Must be at least 1
pub fn validate_quantity(quantity: i64) -> CoreResult<()> {
    if quantity < 1 {
        return Err(CoreError::InvalidQuantity { quantity });
    }
    Ok(())
}

/// Validates that a monetary input is not negative. Zero is allowed.
///
/// ## Example
/// ```rust
/// use stockwise_core::validation::validate_non_negative;
/// use stockwise_core::Money;
///
/// assert!(validate_non_negative("sale price", Money::zero()).is_ok());
/// assert!(validate_non_negative("sale price", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_non_negative(field: &'static str, amount: Money) -> CoreResult<()> {
    if amount.is_negative() {
        return Err(CoreError::InvalidAmount { field, amount });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
