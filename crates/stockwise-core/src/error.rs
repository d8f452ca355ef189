//! # Error Types
//!
//! Domain-specific error types for stockwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockwise-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Malformed input (names, months, ids)            │
//! │                                                                         │
//! │  stockwise-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                     │
//! │  └── InventoryError   - CoreError | DbError, returned by Inventory      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → InventoryError → CLI (anyhow)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable: the caller shows the message and the user
//! corrects the input. Nothing here is fatal to the process.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A product with the same name already exists (case-insensitive).
    ///
    /// ## User Workflow
    /// ```text
    /// New product "Widget"
    ///      │
    ///      ▼
    /// "widget" already on file
    ///      │
    ///      ▼
    /// DuplicateProduct { name: "Widget" }
    ///      │
    ///      ▼
    /// UI: "pick the existing product to add stock instead"
    /// ```
    #[error("A product named '{name}' already exists; add stock to the existing product instead")]
    DuplicateProduct { name: String },

    /// Sale quantity exceeds the stock on hand.
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    /// Referenced product, sale or purchase does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Quantity is zero or negative.
    #[error("Invalid quantity {quantity}: must be at least 1")]
    InvalidQuantity { quantity: i64 },

    /// Monetary value is negative.
    #[error("Invalid {field} {amount}: must not be negative")]
    InvalidAmount { field: &'static str, amount: Money },

    /// A computed amount or stock level does not fit in 64 bits.
    #[error("Arithmetic overflow while computing {what}")]
    Overflow { what: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Machine-readable code for the error kind.
    ///
    /// Stable across message rewording; front ends switch on this.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::DuplicateProduct { .. } => "DUPLICATE_PRODUCT",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            CoreError::InvalidAmount { .. } => "INVALID_AMOUNT",
            CoreError::Overflow { .. } => "OVERFLOW",
            CoreError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
