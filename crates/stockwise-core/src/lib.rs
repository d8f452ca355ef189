//! # stockwise-core: Pure Inventory Logic for Stockwise
//!
//! This crate holds the weighted-average-cost arithmetic, the sale
//! valuation rules and the monthly report aggregation. None of it does I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockwise Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    stockwise CLI (apps/cli)                     │   │
//! │  │    product ─► purchase ─► sell ─► sale reverse/correct ─► report│   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               stockwise-db: Inventory service                   │   │
//! │  │    one SQLite transaction per operation, repositories, export   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockwise-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │ ledger  │ │ report  │ │  types  │ │validation│ │   │
//! │  │   │  Money  │ │ WAC     │ │ Period  │ │ Product │ │  rules  │  │   │
//! │  │   │         │ │ pricing │ │ Report  │ │ Sale    │ │         │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Fixed two-decimal amounts stored as integer cents
//! - [`ledger`] - Purchase merge, stock debit/restore, sale valuation
//! - [`report`] - Period grouping and revenue/profit totals
//! - [`types`] - Domain types (Product, PurchaseRecord, SaleRecord, Period)
//! - [`validation`] - Input rules
//! - [`clock`] - Injectable "now" for timestamps and the current period
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockwise_core::ledger::StockPosition;
//! use stockwise_core::Money;
//!
//! let position = StockPosition::EMPTY
//!     .merge_purchase(10, Money::from_major(1000))
//!     .unwrap();
//! assert_eq!(position.average_cost, Money::from_major(100));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod ledger;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{SaleValuation, StockPosition};
pub use money::{Money, ParseMoneyError};
pub use report::PeriodReport;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum product name length, in characters.
pub const MAX_PRODUCT_NAME_LEN: usize = 100;

/// Maximum customer label length, in characters.
pub const MAX_CUSTOMER_LEN: usize = 100;

/// Products with fewer units than this (but at least one) count as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 10;
