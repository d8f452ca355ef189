//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Fixed-Point, Two Decimals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE AVERAGING PROBLEM                                                  │
//! │                                                                         │
//! │  Weighted average cost divides on every purchase:                       │
//! │    (1000.00 + 750.00) / 15 = 116.666...                                 │
//! │                                                                         │
//! │  With binary floats the error compounds purchase after purchase.        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (cents)                              │
//! │    175000 cents / 15 = 11666.67 → rounds to 11667 cents = 116.67        │
//! │    Every stored value is exact; rounding happens in ONE place           │
//! │    (`div_round`) with ONE rule (half away from zero)                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockwise_core::money::Money;
//!
//! let cost = Money::from_cents(175_000);        // 1750.00
//! let unit = cost.div_round(15).unwrap();        // 116.67
//! assert_eq!(unit.cents(), 11_667);
//!
//! let price: Money = "150".parse().unwrap();
//! assert_eq!(price.multiply_quantity(3).cents(), 45_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;
use ts_rs::TS;

/// Number of fractional digits every monetary value carries.
pub const MONEY_SCALE: u32 = 2;

/// Minor units per major unit (`10^MONEY_SCALE`).
pub const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: profit can legitimately be negative (selling below cost)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serializes as the bare integer**: `{"revenue": 45000}`
///
/// ## Where Money Flows
/// ```text
/// Purchase.total_cost ──► WAC merge ──► Product.average_cost ──┐
///                                                               ├─► Sale.profit
/// Product.sale_price ──► quantity × price ──► Sale.revenue ─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// let price = Money::from_cents(11_667);
    /// assert_eq!(price.to_string(), "116.67");
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the fractional portion, always 0-99.
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// let unit_price = Money::from_major(150);
    /// assert_eq!(unit_price.multiply_quantity(3), Money::from_major(450));
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Overflow-checked variant of [`Money::multiply_quantity`].
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    #[inline]
    pub fn checked_sub(&self, other: Money) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Divides by an integer and rounds to the nearest cent, half away from zero.
    ///
    /// Returns `None` when `divisor` is zero.
    ///
    /// ## Rounding Rule
    /// ```text
    /// 11666.666… → 11667      (nearest)
    ///     2.5    →     3      (half away from zero)
    ///    -2.5    →    -3
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(175_000).div_round(15), Some(Money::from_cents(11_667)));
    /// assert_eq!(Money::from_cents(5).div_round(2), Some(Money::from_cents(3)));
    /// assert_eq!(Money::from_cents(5).div_round(0), None);
    /// ```
    pub fn div_round(&self, divisor: i64) -> Option<Money> {
        let cents = round_half_away_from_zero(self.0 as i128, divisor as i128)?;
        i64::try_from(cents).ok().map(Money)
    }
}

/// Integer division of `numerator / divisor` rounded half away from zero.
///
/// Shared by [`Money::div_round`] and the ledger, which divides 128-bit
/// inventory values that may not fit in a single `Money`.
pub(crate) fn round_half_away_from_zero(numerator: i128, divisor: i128) -> Option<i128> {
    if divisor == 0 {
        return None;
    }

    let quotient = numerator / divisor;
    let remainder = numerator % divisor;

    if remainder.abs() * 2 >= divisor.abs() {
        let away = if (numerator < 0) == (divisor < 0) { 1 } else { -1 };
        Some(quotient + away)
    } else {
        Some(quotient)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Error returned when a string is not a valid amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMoneyError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount '{0}'")]
    Invalid(String),

    #[error("amount '{0}' has more than two decimal places")]
    TooPrecise(String),

    #[error("amount '{0}' is out of range")]
    OutOfRange(String),
}

/// Parses decimal strings such as `"116.67"`, `"-5.5"` or `"1000"`.
///
/// More than two fractional digits is rejected rather than silently rounded.
impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseMoneyError::Empty);
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(ParseMoneyError::Invalid(s.to_string()));
        }
        if frac.len() > MONEY_SCALE as usize {
            return Err(ParseMoneyError::TooPrecise(s.to_string()));
        }

        let out_of_range = || ParseMoneyError::OutOfRange(s.to_string());

        let major: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| out_of_range())?
        };
        let minor: i64 = if frac.is_empty() {
            0
        } else {
            // "5" in "1.5" means 50 cents
            let padded = format!("{:0<width$}", frac, width = MONEY_SCALE as usize);
            padded.parse().map_err(|_| ParseMoneyError::Invalid(s.to_string()))?
        };

        let cents = major
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(out_of_range)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with two decimals and no currency symbol.
///
/// The symbol is a presentation concern; see the CLI configuration.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl<'a> std::iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
