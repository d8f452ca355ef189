//! # Export
//!
//! Spreadsheet-friendly dump of the whole inventory.
//!
//! ## Sheets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.csv   name, stock, average_cost, sale_price                   │
//! │  sales.csv      date, product, quantity, revenue, profit, customer      │
//! │  purchases.csv  date, product, quantity, total_cost                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dates are UTC, formatted `%Y-%m-%d %H:%M:%S`. Amounts are plain decimals
//! with two places and no currency symbol. Styling is left to whatever opens
//! the files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use stockwise_core::{Product, PurchaseRecord, SaleRecord};

use crate::error::{DbError, DbResult};
use crate::pool::Database;

/// Timestamp format used in every sheet.
pub const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const PRODUCTS_FILE: &str = "products.csv";
pub const SALES_FILE: &str = "sales.csv";
pub const PURCHASES_FILE: &str = "purchases.csv";

const PRODUCTS_HEADER: &[&str] = &["name", "stock", "average_cost", "sale_price"];

const SALES_HEADER: &[&str] = &["date", "product", "quantity", "revenue", "profit", "customer"];

const PURCHASES_HEADER: &[&str] = &["date", "product", "quantity", "total_cost"];

/// Everything an export writes, read from one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub generated_at: DateTime<Utc>,
    /// Ordered by name.
    pub products: Vec<Product>,
    /// Newest first.
    pub sales: Vec<SaleRecord>,
    /// Newest first.
    pub purchases: Vec<PurchaseRecord>,
}

/// Reads products, sales and purchases inside a single read transaction so
/// the three sheets agree with each other.
pub async fn export_snapshot(db: &Database, generated_at: DateTime<Utc>) -> DbResult<ExportSnapshot> {
    let mut tx = db.pool().begin().await?;

    let products = crate::repository::product::fetch_all(&mut tx).await?;
    let sales = crate::repository::sale::fetch_all(&mut tx).await?;
    let purchases = crate::repository::purchase::fetch_all(&mut tx).await?;

    tx.commit().await?;

    Ok(ExportSnapshot {
        generated_at,
        products,
        sales,
        purchases,
    })
}

fn format_date(at: &DateTime<Utc>) -> String {
    at.format(EXPORT_DATE_FORMAT).to_string()
}

fn writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

/// Writes the products sheet.
pub fn write_products_csv(products: &[Product], out: impl Write) -> DbResult<()> {
    let mut csv = writer(out);
    csv.write_record(PRODUCTS_HEADER)?;

    for p in products {
        csv.write_record([
            p.name.clone(),
            p.stock.to_string(),
            p.average_cost.to_string(),
            p.sale_price.to_string(),
        ])?;
    }

    csv.flush().map_err(|e| DbError::Export(e.to_string()))?;
    Ok(())
}

/// Writes the sales sheet.
pub fn write_sales_csv(sales: &[SaleRecord], out: impl Write) -> DbResult<()> {
    let mut csv = writer(out);
    csv.write_record(SALES_HEADER)?;

    for s in sales {
        csv.write_record([
            format_date(&s.sold_at),
            s.product_name.clone(),
            s.quantity.to_string(),
            s.revenue.to_string(),
            s.profit.to_string(),
            s.customer.clone().unwrap_or_default(),
        ])?;
    }

    csv.flush().map_err(|e| DbError::Export(e.to_string()))?;
    Ok(())
}

/// Writes the purchases sheet.
pub fn write_purchases_csv(purchases: &[PurchaseRecord], out: impl Write) -> DbResult<()> {
    let mut csv = writer(out);
    csv.write_record(PURCHASES_HEADER)?;

    for c in purchases {
        csv.write_record([
            format_date(&c.purchased_at),
            c.product_name.clone(),
            c.quantity.to_string(),
            c.total_cost.to_string(),
        ])?;
    }

    csv.flush().map_err(|e| DbError::Export(e.to_string()))?;
    Ok(())
}

/// Writes all three sheets into `dir`, creating it if needed.
///
/// Returns the paths written, in sheet order.
pub fn write_csv_dir(snapshot: &ExportSnapshot, dir: &Path) -> DbResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| DbError::Export(e.to_string()))?;

    let create = |name: &str| -> DbResult<(PathBuf, File)> {
        let path = dir.join(name);
        let file = File::create(&path)
            .map_err(|e| DbError::Export(format!("{}: {}", path.display(), e)))?;
        Ok((path, file))
    };

    let (products_path, file) = create(PRODUCTS_FILE)?;
    write_products_csv(&snapshot.products, file)?;

    let (sales_path, file) = create(SALES_FILE)?;
    write_sales_csv(&snapshot.sales, file)?;

    let (purchases_path, file) = create(PURCHASES_FILE)?;
    write_purchases_csv(&snapshot.purchases, file)?;

    info!(
        dir = %dir.display(),
        products = snapshot.products.len(),
        sales = snapshot.sales.len(),
        purchases = snapshot.purchases.len(),
        "Export written"
    );

    Ok(vec![products_path, sales_path, purchases_path])
}

// =============================================================================
// Unit Tests
// =============================================================================
