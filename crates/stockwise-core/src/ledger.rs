//! # Stock Ledger
//!
//! Weighted-average-cost (WAC) arithmetic for a single product, as pure
//! functions over a [`StockPosition`].
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ledger Operations                                  │
//! │                                                                         │
//! │  merge_purchase(qty, total_cost)     stock += qty                       │
//! │                                      avg = (stock·avg + cost) / stock'  │
//! │                                                                         │
//! │  debit(qty)                          stock -= qty   (qty ≤ stock)       │
//! │                                      avg unchanged                      │
//! │                                                                         │
//! │  restore(qty)                        stock += qty   (sale reversal)     │
//! │                                      avg unchanged                      │
//! │                                                                         │
//! │  SaleValuation::price(qty, price, cost_basis)                           │
//! │                                      revenue = qty·price                │
//! │                                      profit  = revenue − qty·cost_basis │
//! │                                                                         │
//! │  SaleValuation::corrected(new_revenue)                                  │
//! │                                      cogs    = revenue − profit         │
//! │                                      profit' = new_revenue − cogs       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here touches storage. The database layer reads a fresh position
//! inside its transaction, calls these functions, and writes the result back,
//! so a retried transaction always recomputes from current state.
//!
//! ## Worked Example
//! ```rust
//! use stockwise_core::ledger::{SaleValuation, StockPosition};
//! use stockwise_core::Money;
//!
//! let pos = StockPosition::EMPTY
//!     .merge_purchase(10, Money::from_major(1000)).unwrap()
//!     .merge_purchase(5, Money::from_major(750)).unwrap();
//! assert_eq!(pos.stock, 15);
//! assert_eq!(pos.average_cost, Money::from_cents(11_667)); // 116.67
//!
//! let sale = SaleValuation::price(3, Money::from_major(150), pos.average_cost).unwrap();
//! assert_eq!(sale.revenue, Money::from_major(450));
//! assert_eq!(sale.profit, Money::from_cents(9_999));         // 99.99
//! assert_eq!(pos.debit(3).unwrap().stock, 12);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{round_half_away_from_zero, Money};
use crate::validation::{validate_non_negative, validate_quantity};

// =============================================================================
// Stock Position
// =============================================================================

/// A product's stock on hand and its weighted average unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockPosition {
    pub stock: i64,
    pub average_cost: Money,
}

impl StockPosition {
    /// A freshly created product: nothing on hand, zero cost.
    pub const EMPTY: StockPosition = StockPosition {
        stock: 0,
        average_cost: Money::zero(),
    };

    /// Merges a purchase batch into the position.
    ///
    /// ```text
    /// prior_value = stock × average_cost
    /// new_stock   = stock + quantity
    /// new_average = (prior_value + total_cost) / new_stock   (0 if new_stock = 0)
    /// ```
    ///
    /// The intermediate value is computed in 128 bits and the average is
    /// rounded to the cent, half away from zero.
    ///
    /// ## Errors
    /// - `InvalidQuantity` if `quantity < 1`
    /// - `InvalidAmount` if `total_cost` is negative
    /// - `Overflow` if the new stock or average does not fit in 64 bits
    pub fn merge_purchase(self, quantity: i64, total_cost: Money) -> CoreResult<StockPosition> {
        validate_quantity(quantity)?;
        validate_non_negative("total cost", total_cost)?;

        let new_stock = self
            .stock
            .checked_add(quantity)
            .ok_or(CoreError::Overflow { what: "stock" })?;

        let prior_value = self.stock as i128 * self.average_cost.cents() as i128;
        let new_value = prior_value + total_cost.cents() as i128;

        let new_average = if new_stock > 0 {
            round_half_away_from_zero(new_value, new_stock as i128)
                .and_then(|cents| i64::try_from(cents).ok())
                .map(Money::from_cents)
                .ok_or(CoreError::Overflow {
                    what: "average cost",
                })?
        } else {
            Money::zero()
        };

        Ok(StockPosition {
            stock: new_stock,
            average_cost: new_average,
        })
    }

    /// Removes sold units. The average cost does not move.
    ///
    /// ## Errors
    /// - `InvalidQuantity` if `quantity < 1`
    /// - `InsufficientStock` if `quantity > stock`, reporting the stock on hand
    pub fn debit(self, quantity: i64) -> CoreResult<StockPosition> {
        validate_quantity(quantity)?;

        if quantity > self.stock {
            return Err(CoreError::InsufficientStock {
                available: self.stock,
                requested: quantity,
            });
        }

        Ok(StockPosition {
            stock: self.stock - quantity,
            average_cost: self.average_cost,
        })
    }

    /// Puts units from a reversed sale back on hand. The average cost does not move.
    pub fn restore(self, quantity: i64) -> CoreResult<StockPosition> {
        validate_quantity(quantity)?;

        let stock = self
            .stock
            .checked_add(quantity)
            .ok_or(CoreError::Overflow { what: "stock" })?;

        Ok(StockPosition {
            stock,
            average_cost: self.average_cost,
        })
    }

    /// Stock valued at the average cost.
    pub fn inventory_value(&self) -> Money {
        self.average_cost.multiply_quantity(self.stock)
    }
}

impl Default for StockPosition {
    fn default() -> Self {
        StockPosition::EMPTY
    }
}

// =============================================================================
// Sale Valuation
// =============================================================================

/// The revenue and profit frozen onto a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleValuation {
    pub revenue: Money,
    pub profit: Money,
}

impl SaleValuation {
    /// Prices a sale against the cost basis captured at sale time.
    ///
    /// `cost_basis` is the product's average cost read *before* the debit;
    /// callers must capture it in the same transaction that debits stock.
    pub fn price(quantity: i64, sale_price: Money, cost_basis: Money) -> CoreResult<SaleValuation> {
        validate_quantity(quantity)?;

        let revenue = sale_price
            .checked_multiply_quantity(quantity)
            .ok_or(CoreError::Overflow { what: "revenue" })?;
        let cost_of_goods = cost_basis
            .checked_multiply_quantity(quantity)
            .ok_or(CoreError::Overflow {
                what: "cost of goods",
            })?;
        let profit = revenue
            .checked_sub(cost_of_goods)
            .ok_or(CoreError::Overflow { what: "profit" })?;

        Ok(SaleValuation { revenue, profit })
    }

    /// Total cost of goods this valuation was computed against.
    #[inline]
    pub fn cost_of_goods(&self) -> Money {
        self.revenue - self.profit
    }

    /// Manual override of the recorded total.
    ///
    /// Recovers the originally frozen cost of goods as `revenue - profit` and
    /// re-derives profit from `new_revenue`. This is a clerical correction,
    /// not a re-pricing: the current sale price and average cost are ignored.
    ///
    /// ## Example
    /// ```rust
    /// use stockwise_core::ledger::SaleValuation;
    /// use stockwise_core::Money;
    ///
    /// let recorded = SaleValuation {
    ///     revenue: Money::from_major(450),
    ///     profit: Money::from_cents(9_999),
    /// };
    /// let fixed = recorded.corrected(Money::from_major(400)).unwrap();
    /// assert_eq!(fixed.profit, Money::from_cents(4_999));
    /// assert_eq!(fixed.cost_of_goods(), recorded.cost_of_goods());
    /// ```
    pub fn corrected(&self, new_revenue: Money) -> CoreResult<SaleValuation> {
        validate_non_negative("revenue", new_revenue)?;

        let cost_of_goods = self
            .revenue
            .checked_sub(self.profit)
            .ok_or(CoreError::Overflow {
                what: "cost of goods",
            })?;
        let profit = new_revenue
            .checked_sub(cost_of_goods)
            .ok_or(CoreError::Overflow { what: "profit" })?;

        Ok(SaleValuation {
            revenue: new_revenue,
            profit,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
