//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. RECORD                                                             │
//! │     └── insert() → revenue/profit frozen, period columns filled        │
//! │                                                                         │
//! │  2. (OPTIONAL) CORRECT                                                 │
//! │     └── update_valuation() → revenue/profit rewritten, nothing else    │
//! │                                                                         │
//! │  3. (OPTIONAL) REVERSE                                                 │
//! │     └── delete() → row removed; the caller restores stock in the       │
//! │                    same transaction                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use stockwise_core::{Money, Period, SaleRecord, SaleValuation};

use crate::error::{DbError, DbResult};

const SALE_SELECT: &str = r#"
    SELECT
        s.id,
        s.product_id,
        p.name AS product_name,
        s.quantity,
        s.revenue_cents,
        s.profit_cents,
        s.customer,
        s.sold_at
    FROM sales s
    INNER JOIN products p ON p.id = s.product_id
"#;

const NEWEST_FIRST: &str = "ORDER BY s.sold_at DESC, s.id DESC";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SaleRow {
    id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    revenue_cents: i64,
    profit_cents: i64,
    customer: Option<String>,
    sold_at: DateTime<Utc>,
}

impl From<SaleRow> for SaleRecord {
    fn from(row: SaleRow) -> Self {
        SaleRecord {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            revenue: Money::from_cents(row.revenue_cents),
            profit: Money::from_cents(row.profit_cents),
            customer: row.customer,
            sold_at: row.sold_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PeriodRow {
    period_year: i64,
    period_month: i64,
}

impl TryFrom<PeriodRow> for Period {
    type Error = DbError;

    fn try_from(row: PeriodRow) -> Result<Self, Self::Error> {
        let year = i32::try_from(row.period_year)
            .map_err(|_| DbError::corrupt("sales", format!("year {}", row.period_year)))?;
        let month = u32::try_from(row.period_month)
            .map_err(|_| DbError::corrupt("sales", format!("month {}", row.period_month)))?;

        Period::new(year, month).map_err(|e| DbError::corrupt("sales", e.to_string()))
    }
}

// =============================================================================
// Connection-level Operations
// =============================================================================

/// Gets a sale by ID.
pub(crate) async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<SaleRecord>> {
    let sql = format!("{} WHERE s.id = ?1", SALE_SELECT);

    let row: Option<SaleRow> = sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?;

    Ok(row.map(SaleRecord::from))
}

/// Every sale, newest first.
pub(crate) async fn fetch_all(conn: &mut SqliteConnection) -> DbResult<Vec<SaleRecord>> {
    let sql = format!("{} {}", SALE_SELECT, NEWEST_FIRST);

    let rows: Vec<SaleRow> = sqlx::query_as(&sql).fetch_all(conn).await?;

    Ok(rows.into_iter().map(SaleRecord::from).collect())
}

/// Inserts a sale, deriving its reporting period from `sold_at`.
pub(crate) async fn insert(conn: &mut SqliteConnection, sale: &SaleRecord) -> DbResult<()> {
    let period = sale.period();

    debug!(
        id = %sale.id,
        product_id = %sale.product_id,
        quantity = sale.quantity,
        period = %period,
        "Inserting sale"
    );

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, product_id, quantity, revenue_cents, profit_cents,
            customer, sold_at, period_year, period_month
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.product_id)
    .bind(sale.quantity)
    .bind(sale.revenue.cents())
    .bind(sale.profit.cents())
    .bind(&sale.customer)
    .bind(sale.sold_at)
    .bind(period.year)
    .bind(i64::from(period.month))
    .execute(conn)
    .await?;

    Ok(())
}

/// Rewrites revenue and profit. Quantity, product and timestamp stay.
pub(crate) async fn update_valuation(
    conn: &mut SqliteConnection,
    id: &str,
    valuation: SaleValuation,
) -> DbResult<u64> {
    debug!(id = %id, revenue = %valuation.revenue, profit = %valuation.profit, "Updating sale valuation");

    let result = sqlx::query(
        r#"
        UPDATE sales
        SET revenue_cents = ?2, profit_cents = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(valuation.revenue.cents())
    .bind(valuation.profit.cents())
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Deletes a sale row.
pub(crate) async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<u64> {
    debug!(id = %id, "Deleting sale");

    let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

// =============================================================================
// SaleRepository
// =============================================================================

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Distinct periods containing at least one sale, most recent first.
    pub async fn list_periods(&self) -> DbResult<Vec<Period>> {
        let rows: Vec<PeriodRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT period_year, period_month
            FROM sales
            ORDER BY period_year DESC, period_month DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Period::try_from).collect()
    }

    /// Sales in one period, newest first.
    pub async fn list_for_period(&self, period: Period) -> DbResult<Vec<SaleRecord>> {
        debug!(period = %period, "Listing sales for period");

        let sql = format!(
            "{} WHERE s.period_year = ?1 AND s.period_month = ?2 {}",
            SALE_SELECT, NEWEST_FIRST
        );

        let rows: Vec<SaleRow> = sqlx::query_as(&sql)
            .bind(period.year)
            .bind(i64::from(period.month))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SaleRecord::from).collect())
    }

    /// All sales, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<SaleRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch_all(&mut conn).await
    }

    /// Counts all sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
