//! # Purchase Repository
//!
//! Append-only purchase log. Rows are written by the purchase flow and only
//! disappear with their product (ON DELETE CASCADE).

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use stockwise_core::{Money, PurchaseRecord};

use crate::error::DbResult;

const PURCHASE_SELECT: &str = r#"
    SELECT
        c.id,
        c.product_id,
        p.name AS product_name,
        c.quantity,
        c.total_cost_cents,
        c.purchased_at
    FROM purchases c
    INNER JOIN products p ON p.id = c.product_id
"#;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PurchaseRow {
    id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    total_cost_cents: i64,
    purchased_at: DateTime<Utc>,
}

impl From<PurchaseRow> for PurchaseRecord {
    fn from(row: PurchaseRow) -> Self {
        PurchaseRecord {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            total_cost: Money::from_cents(row.total_cost_cents),
            purchased_at: row.purchased_at,
        }
    }
}

/// Appends a purchase to the log.
pub(crate) async fn insert(conn: &mut SqliteConnection, purchase: &PurchaseRecord) -> DbResult<()> {
    debug!(
        id = %purchase.id,
        product_id = %purchase.product_id,
        quantity = purchase.quantity,
        "Inserting purchase"
    );

    sqlx::query(
        r#"
        INSERT INTO purchases (id, product_id, quantity, total_cost_cents, purchased_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&purchase.id)
    .bind(&purchase.product_id)
    .bind(purchase.quantity)
    .bind(purchase.total_cost.cents())
    .bind(purchase.purchased_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Every purchase, newest first.
pub(crate) async fn fetch_all(conn: &mut SqliteConnection) -> DbResult<Vec<PurchaseRecord>> {
    let sql = format!("{} ORDER BY c.purchased_at DESC, c.id DESC", PURCHASE_SELECT);

    let rows: Vec<PurchaseRow> = sqlx::query_as(&sql).fetch_all(conn).await?;

    Ok(rows.into_iter().map(PurchaseRecord::from).collect())
}

/// Repository for purchase history reads.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// All purchases, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<PurchaseRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch_all(&mut conn).await
    }

    /// Purchases of one product, newest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<PurchaseRecord>> {
        let sql = format!(
            "{} WHERE c.product_id = ?1 ORDER BY c.purchased_at DESC, c.id DESC",
            PURCHASE_SELECT
        );

        let rows: Vec<PurchaseRow> = sqlx::query_as(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PurchaseRecord::from).collect())
    }

    /// Counts all purchases.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product;
    use chrono::{Datelike, TimeZone};
    use stockwise_core::Product;
    use uuid::Uuid;

    async fn with_products(names: &[&str]) -> (Database, Vec<String>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let mut ids = Vec::new();
        for name in names {
            let now = Utc::now();
            let p = Product {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                stock: 0,
                average_cost: Money::zero(),
                sale_price: Money::from_cents(100),
                created_at: now,
                updated_at: now,
            };
            product::insert(&mut conn, &p).await.unwrap();
            ids.push(p.id);
        }
        drop(conn);
        (db, ids)
    }

    fn batch(product_id: &str, quantity: i64, cents: i64, day: u32) -> PurchaseRecord {
        PurchaseRecord {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            product_name: String::new(),
            quantity,
            total_cost: Money::from_cents(cents),
            purchased_at: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let (db, ids) = with_products(&["Widget"]).await;
        let first = batch(&ids[0], 10, 100_000, 1);
        let second = batch(&ids[0], 5, 75_000, 7);
        {
            let mut conn = db.pool().acquire().await.unwrap();
            insert(&mut conn, &first).await.unwrap();
            insert(&mut conn, &second).await.unwrap();
        }

        let all = db.purchases().list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[0].product_name, "Widget");
        assert_eq!(all[0].total_cost, Money::from_cents(75_000));
        assert_eq!(all[1].purchased_at, first.purchased_at);
        assert_eq!(db.purchases().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_for_product_filters() {
        let (db, ids) = with_products(&["Widget", "Gadget"]).await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            for (i, day) in [(0, 2), (1, 3), (0, 4)] {
                insert(&mut conn, &batch(&ids[i], 1, 100, day)).await.unwrap();
            }
        }

        let widget = db.purchases().list_for_product(&ids[0]).await.unwrap();
        let days: Vec<u32> = widget.iter().map(|p| p.purchased_at.day()).collect();
        assert_eq!(days, vec![4, 2]);
        assert!(widget.iter().all(|p| p.product_name == "Widget"));

        assert!(db.purchases().list_for_product("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unknown_product() {
        let (db, _) = with_products(&[]).await;
        let mut conn = db.pool().acquire().await.unwrap();
        assert!(insert(&mut conn, &batch("missing", 1, 100, 1)).await.is_err());
    }
}
