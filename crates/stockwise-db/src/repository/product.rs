//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How stock changes reach the row                      │
//! │                                                                         │
//! │  Purchase  → write_position(stock, average_cost)   absolute, computed   │
//! │              by the ledger from a position read in the same tx          │
//! │                                                                         │
//! │  Sale      → debit_stock(qty)                                          │
//! │              UPDATE ... SET stock = stock - ?                           │
//! │              WHERE id = ? AND stock >= ?                                │
//! │              0 rows affected ⇒ not enough stock, nothing written        │
//! │                                                                         │
//! │  Reversal  → restore_stock(qty)   stock = stock + ?                     │
//! │                                                                         │
//! │  average_cost is only ever written by write_position.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use stockwise_core::validation::product_name_key;
use stockwise_core::{Money, Product, ProductFilter, StockLevel, StockPosition, LOW_STOCK_THRESHOLD};

use crate::error::DbResult;

const PRODUCT_COLUMNS: &str = r#"
    id,
    name,
    stock,
    average_cost_cents,
    sale_price_cents,
    created_at,
    updated_at
"#;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: String,
    name: String,
    stock: i64,
    average_cost_cents: i64,
    sale_price_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            stock: row.stock,
            average_cost: Money::from_cents(row.average_cost_cents),
            sale_price: Money::from_cents(row.sale_price_cents),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Connection-level Operations
// =============================================================================

/// Gets a product by its ID.
pub(crate) async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);

    let row: Option<ProductRow> = sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?;

    Ok(row.map(Product::from))
}

/// Gets a product by name, ignoring case (Unicode, via `name_key`).
pub(crate) async fn fetch_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE name_key = ?1", PRODUCT_COLUMNS);

    let row: Option<ProductRow> = sqlx::query_as(&sql)
        .bind(product_name_key(name))
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Product::from))
}

/// Inserts a new product.
///
/// ## Returns
/// * `Err(DbError::UniqueViolation)` - a product with that name (ignoring case) exists
pub(crate) async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(id = %product.id, name = %product.name, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, name_key, stock, average_cost_cents, sale_price_cents,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(product_name_key(&product.name))
    .bind(product.stock)
    .bind(product.average_cost.cents())
    .bind(product.sale_price.cents())
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Writes a merged stock position back to the product row.
///
/// Returns the number of rows affected (0 if the product is gone).
pub(crate) async fn write_position(
    conn: &mut SqliteConnection,
    id: &str,
    position: StockPosition,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    debug!(
        id = %id,
        stock = position.stock,
        average_cost = %position.average_cost,
        "Writing stock position"
    );

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = ?2, average_cost_cents = ?3, updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(position.stock)
    .bind(position.average_cost.cents())
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Removes sold units, only if enough are on hand.
///
/// Returns `false` when the guard rejected the write (stock too low or
/// product missing); nothing is changed in that case.
pub(crate) async fn debit_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, quantity = quantity, "Debiting stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Puts units back on hand. Average cost is untouched.
pub(crate) async fn restore_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    debug!(id = %id, quantity = quantity, "Restoring stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Updates the editable fields (name, sale price). The name key follows the name.
///
/// ## Returns
/// * `Err(DbError::UniqueViolation)` - another product already has that name
pub(crate) async fn update_details(
    conn: &mut SqliteConnection,
    id: &str,
    name: &str,
    sale_price: Money,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    debug!(id = %id, name = %name, "Updating product details");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET name = ?2, name_key = ?3, sale_price_cents = ?4, updated_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(product_name_key(name))
    .bind(sale_price.cents())
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Deletes a product. Purchases and sales go with it (ON DELETE CASCADE).
pub(crate) async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<u64> {
    debug!(id = %id, "Deleting product");

    let result = sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// Every product, ordered by name.
pub(crate) async fn fetch_all(conn: &mut SqliteConnection) -> DbResult<Vec<Product>> {
    let sql = format!("SELECT {} FROM products ORDER BY name, id", PRODUCT_COLUMNS);

    let rows: Vec<ProductRow> = sqlx::query_as(&sql).fetch_all(conn).await?;

    Ok(rows.into_iter().map(Product::from).collect())
}

/// Inclusive stock bounds for a listing bucket.
fn stock_bounds(level: Option<StockLevel>) -> (i64, i64) {
    match level {
        None => (0, i64::MAX),
        Some(StockLevel::OutOfStock) => (0, 0),
        Some(StockLevel::LowStock) => (1, LOW_STOCK_THRESHOLD - 1),
        Some(StockLevel::InStock) => (LOW_STOCK_THRESHOLD, i64::MAX),
    }
}

/// Lowercases `search` the way `name_key` is lowercased and escapes LIKE
/// wildcards so user input matches literally.
fn like_pattern(search: &str) -> String {
    let search = product_name_key(search);
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// =============================================================================
// ProductRepository
// =============================================================================

/// Repository for product reads.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let widgets = repo.list(&ProductFilter {
///     search: Some("widget".into()),
///     ..Default::default()
/// }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Gets a product by name, ignoring case.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_name(&mut conn, name).await
    }

    /// Lists products ordered by name.
    ///
    /// ## Filter
    /// - `search`: case-insensitive substring of the name, matched on `name_key`
    /// - `stock_level`: out of stock (0), low (1..threshold), in stock
    /// - `limit` / `offset`: paging
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);
        let (min_stock, max_stock) = stock_bounds(filter.stock_level);
        // SQLite treats a negative LIMIT as "no limit"
        let limit = filter.limit.map(i64::from).unwrap_or(-1);

        debug!(
            search = ?search,
            min_stock = min_stock,
            max_stock = max_stock,
            limit = limit,
            offset = filter.offset,
            "Listing products"
        );

        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE (?1 IS NULL OR name_key LIKE ?1 ESCAPE '\')
              AND stock BETWEEN ?2 AND ?3
            ORDER BY name, id
            LIMIT ?4 OFFSET ?5
            "#,
            PRODUCT_COLUMNS
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(search)
            .bind(min_stock)
            .bind(max_stock)
            .bind(limit)
            .bind(i64::from(filter.offset))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Lists every product ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_all(&mut conn).await
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
