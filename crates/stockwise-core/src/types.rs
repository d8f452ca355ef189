//! # Domain Types
//!
//! Core domain types used throughout Stockwise.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │ PurchaseRecord  │   │   SaleRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  product_id     │   │  product_id     │──►    │
//! │  │  name (unique)  │   │  quantity       │   │  quantity       │       │
//! │  │  stock          │   │  total_cost     │   │  revenue        │       │
//! │  │  average_cost   │   │  purchased_at   │   │  profit         │       │
//! │  │  sale_price     │   └─────────────────┘   │  customer?      │       │
//! │  └─────────────────┘                         │  sold_at        │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │     Period      │   │   StockLevel    │                             │
//! │  │  year, month    │   │  OutOfStock     │                             │
//! │  └─────────────────┘   │  LowStock       │                             │
//! │                        │  InStock        │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: UUID v4 - immutable, used for relations
//! - `name`: human-facing, unique ignoring case, renameable

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::ledger::{SaleValuation, StockPosition};
use crate::money::Money;
use crate::LOW_STOCK_THRESHOLD;

// =============================================================================
// Product
// =============================================================================

/// A product held in stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique ignoring case.
    pub name: String,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Weighted average cost per unit. Only the purchase merge moves it.
    pub average_cost: Money,

    /// Unit sale price.
    pub sale_price: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the stock/cost state the ledger operates on.
    #[inline]
    pub fn position(&self) -> StockPosition {
        StockPosition {
            stock: self.stock,
            average_cost: self.average_cost,
        }
    }

    /// Stock valued at the current average cost.
    pub fn inventory_value(&self) -> Money {
        self.position().inventory_value()
    }

    /// Returns the stock level bucket for this product.
    #[inline]
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::of(self.stock)
    }
}

// =============================================================================
// New Product / Product Update
// =============================================================================

/// Details for a product created by the purchase flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub sale_price: Money,
}

/// Editable product fields. Stock and average cost are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sale_price: Option<Money>,
}

/// Which product a purchase lands on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseTarget {
    /// Add stock to a product already on file.
    Existing { product_id: String },
    /// Create the product (stock 0, cost 0), then merge the purchase.
    New(NewProduct),
}

// =============================================================================
// Purchase Record
// =============================================================================

/// An immutable log entry for a received purchase batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseRecord {
    pub id: String,
    pub product_id: String,
    /// Current name of the product, joined on read.
    pub product_name: String,
    pub quantity: i64,
    /// Cost of the whole batch, not per unit.
    pub total_cost: Money,
    #[ts(as = "String")]
    pub purchased_at: DateTime<Utc>,
}

impl PurchaseRecord {
    /// Per-unit cost of this batch, rounded to the cent.
    pub fn unit_cost(&self) -> Money {
        self.total_cost.div_round(self.quantity).unwrap_or_default()
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// A recorded sale.
///
/// `revenue` and `profit` are frozen when the sale is recorded; only the
/// explicit total correction rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    pub id: String,
    pub product_id: String,
    /// Current name of the product, joined on read.
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Money,
    pub profit: Money,
    pub customer: Option<String>,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

impl SaleRecord {
    /// The frozen revenue/profit pair.
    #[inline]
    pub fn valuation(&self) -> SaleValuation {
        SaleValuation {
            revenue: self.revenue,
            profit: self.profit,
        }
    }

    /// Total cost of goods sold, recovered as `revenue - profit`.
    #[inline]
    pub fn cost_of_goods(&self) -> Money {
        self.valuation().cost_of_goods()
    }

    /// Calendar month the sale belongs to.
    #[inline]
    pub fn period(&self) -> Period {
        Period::of(self.sold_at)
    }
}

// =============================================================================
// Period
// =============================================================================

/// A calendar month used as a reporting bucket (UTC).
///
/// Ordering is chronological, so `periods.sort_by(|a, b| b.cmp(a))` puts the
/// most recent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Creates a period, rejecting months outside 1-12.
    ///
    /// ## Example
    /// ```rust
    /// use stockwise_core::Period;
    ///
    /// assert!(Period::new(2026, 10).is_ok());
    /// assert!(Period::new(2026, 13).is_err());
    /// ```
    pub fn new(year: i32, month: u32) -> CoreResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            }
            .into());
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ValidationError::InvalidFormat {
                field: "year".to_string(),
                reason: format!("{} is not a representable year", year),
            }
            .into());
        }
        Ok(Period { year, month })
    }

    /// The period containing `at`.
    pub fn of(at: DateTime<Utc>) -> Self {
        Period {
            year: at.year(),
            month: at.month(),
        }
    }

    /// The period immediately after this one.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Whether `at` falls inside this period.
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        Period::of(at) == *self
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// Stock bucket used by product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    /// No units on hand.
    OutOfStock,
    /// Between 1 and `LOW_STOCK_THRESHOLD - 1` units.
    LowStock,
    /// `LOW_STOCK_THRESHOLD` units or more.
    InStock,
}

impl StockLevel {
    pub fn of(stock: i64) -> Self {
        if stock <= 0 {
            StockLevel::OutOfStock
        } else if stock < LOW_STOCK_THRESHOLD {
            StockLevel::LowStock
        } else {
            StockLevel::InStock
        }
    }
}

/// Product listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductFilter {
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    pub stock_level: Option<StockLevel>,
    pub limit: Option<u32>,
    pub offset: u32,
}

// =============================================================================
// Unit Tests
// =============================================================================
