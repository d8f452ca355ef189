//! # Monthly Report
//!
//! Groups sales by calendar month and totals revenue and profit.
//!
//! ## Period Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  requested period?                                                      │
//! │     │                                                                   │
//! │     ├── none ─────────────► most recent period with sales               │
//! │     │                         (or the current month if no sales at all) │
//! │     │                                                                   │
//! │     └── some(p)                                                         │
//! │            ├── p has sales ─► p                                         │
//! │            ├── p empty, other periods have sales ─► most recent one     │
//! │            └── no sales anywhere ─► p (empty report, zero totals)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Aggregation only reads sale records; it never changes stock or cost.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Period, SaleRecord};

/// Revenue and profit totals for one period, with the sales behind them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodReport {
    pub period: Period,
    pub revenue_sum: Money,
    pub profit_sum: Money,
    /// Newest first.
    pub sales: Vec<SaleRecord>,
}

impl PeriodReport {
    /// Builds the report for `period` from any collection of sales.
    ///
    /// Sales outside the period are ignored; an empty period yields zero sums.
    pub fn build(period: Period, sales: impl IntoIterator<Item = SaleRecord>) -> Self {
        let mut in_period: Vec<SaleRecord> = sales
            .into_iter()
            .filter(|s| s.period() == period)
            .collect();
        in_period.sort_by(|a, b| b.sold_at.cmp(&a.sold_at).then_with(|| b.id.cmp(&a.id)));

        let revenue_sum = in_period.iter().map(|s| s.revenue).sum();
        let profit_sum = in_period.iter().map(|s| s.profit).sum();

        PeriodReport {
            period,
            revenue_sum,
            profit_sum,
            sales: in_period,
        }
    }

    /// Number of sales in the period.
    #[inline]
    pub fn sale_count(&self) -> usize {
        self.sales.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }
}

/// Distinct periods that contain at least one sale, most recent first.
pub fn sale_periods<'a>(sales: impl IntoIterator<Item = &'a SaleRecord>) -> Vec<Period> {
    let distinct: BTreeSet<Period> = sales.into_iter().map(SaleRecord::period).collect();
    distinct.into_iter().rev().collect()
}

/// Chooses the period a report should show.
///
/// `available` must be ordered most recent first (as returned by
/// [`sale_periods`]); `current` is the calendar month "now".
pub fn select_period(available: &[Period], requested: Option<Period>, current: Period) -> Period {
    let latest = available.first().copied();

    match (requested, latest) {
        (Some(p), Some(latest)) if !available.contains(&p) => latest,
        (Some(p), _) => p,
        (None, Some(latest)) => latest,
        (None, None) => current,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn sale(id: &str, y: i32, m: u32, d: u32, revenue: i64, profit: i64) -> SaleRecord {
        SaleRecord {
            id: id.to_string(),
            product_id: "p1".to_string(),
            product_name: "Widget".to_string(),
            quantity: 1,
            revenue: Money::from_cents(revenue),
            profit: Money::from_cents(profit),
            customer: None,
            sold_at: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        }
    }

    fn period(y: i32, m: u32) -> Period {
        Period::new(y, m).unwrap()
    }

    #[test]
    fn test_two_months_two_periods() {
        let sales = vec![
            sale("a", 2026, 2, 3, 1_000, 300),
            sale("b", 2026, 3, 1, 2_000, 500),
            sale("c", 2026, 2, 20, 4_000, 1_000),
        ];

        assert_eq!(sale_periods(&sales), vec![period(2026, 3), period(2026, 2)]);

        let feb = PeriodReport::build(period(2026, 2), sales.clone());
        assert_eq!(feb.revenue_sum, Money::from_cents(5_000));
        assert_eq!(feb.profit_sum, Money::from_cents(1_300));
        assert_eq!(feb.sale_count(), 2);
        assert_eq!(feb.sales[0].id, "c");

        let mar = PeriodReport::build(period(2026, 3), sales);
        assert_eq!(mar.revenue_sum, Money::from_cents(2_000));
        assert_eq!(mar.profit_sum, Money::from_cents(500));
    }

    #[test]
    fn test_same_month_different_years_are_distinct() {
        let sales = vec![sale("a", 2025, 3, 1, 100, 10), sale("b", 2026, 3, 1, 100, 10)];
        assert_eq!(sale_periods(&sales), vec![period(2026, 3), period(2025, 3)]);
    }

    #[test]
    fn test_empty_period_sums_to_zero() {
        let report = PeriodReport::build(period(2026, 5), vec![sale("a", 2026, 4, 1, 100, 10)]);
        assert!(report.is_empty());
        assert_eq!(report.revenue_sum, Money::zero());
        assert_eq!(report.profit_sum, Money::zero());
    }

    #[test]
    fn test_select_period_defaults() {
        let current = period(2026, 10);
        let available = vec![period(2026, 8), period(2026, 6)];

        assert_eq!(select_period(&available, None, current), period(2026, 8));
        assert_eq!(select_period(&[], None, current), current);
        assert_eq!(
            select_period(&available, Some(period(2026, 6)), current),
            period(2026, 6)
        );
        // requested month without sales falls back to the latest with sales
        assert_eq!(
            select_period(&available, Some(period(2026, 7)), current),
            period(2026, 8)
        );
        // nothing to fall back to
        assert_eq!(
            select_period(&[], Some(period(2026, 7)), current),
            period(2026, 7)
        );
    }

    proptest! {
        #[test]
        fn prop_period_sums_partition_totals(
            rows in prop::collection::vec((1u32..=12, 1u32..=28, 0i64..100_000, -50_000i64..50_000), 0..40)
        ) {
            let sales: Vec<SaleRecord> = rows
                .iter()
                .enumerate()
                .map(|(i, (m, d, r, p))| sale(&i.to_string(), 2026, *m, *d, *r, *p))
                .collect();

            let periods = sale_periods(&sales);
            for pair in periods.windows(2) {
                prop_assert!(pair[0] > pair[1]);
            }

            let mut revenue = Money::zero();
            let mut profit = Money::zero();
            let mut count = 0;
            for p in &periods {
                let report = PeriodReport::build(*p, sales.clone());
                prop_assert!(!report.is_empty());
                revenue += report.revenue_sum;
                profit += report.profit_sum;
                count += report.sale_count();
            }

            prop_assert_eq!(count, sales.len());
            prop_assert_eq!(revenue, sales.iter().map(|s| s.revenue).sum::<Money>());
            prop_assert_eq!(profit, sales.iter().map(|s| s.profit).sum::<Money>());
        }
    }
}
