//! # Inventory Service
//!
//! Every stock-changing operation, each in its own write transaction.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  One operation = one transaction                        │
//! │                                                                         │
//! │  BEGIN IMMEDIATE          ← takes the write lock up front; other        │
//! │       │                     writers wait (busy_timeout), readers don't  │
//! │       ▼                                                                 │
//! │  read product row         ← fresh StockPosition / sale price            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  stockwise-core ledger    ← merge_purchase / debit / price / corrected  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  write product row + append/modify record                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT                   ← any `?` before this drops the transaction,  │
//! │                             which rolls everything back                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation               | Stock          | Average cost | Records           |
//! |-------------------------|----------------|--------------|-------------------|
//! | `apply_purchase`        | `+ quantity`   | re-averaged  | purchase appended |
//! | `apply_sale`            | `- quantity`   | unchanged    | sale appended     |
//! | `reverse_sale`          | `+ quantity`   | unchanged    | sale deleted      |
//! | `correct_sale_total`    | unchanged      | unchanged    | revenue, profit   |
//! | `update_product`        | unchanged      | unchanged    | name, sale price  |
//! | `delete_product`        | row removed    | row removed  | cascade           |
//!
//! Nothing here retries: a failed operation leaves no trace and the error
//! goes back to the caller.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stockwise_core::report::{select_period, PeriodReport};
use stockwise_core::validation::{
    validate_customer, validate_non_negative, validate_product_name, validate_quantity,
};
use stockwise_core::{
    Clock, CoreError, Money, NewProduct, Period, Product, ProductFilter, ProductUpdate,
    PurchaseRecord, PurchaseTarget, SaleRecord, SaleValuation, StockPosition, SystemClock,
};

use crate::error::{DbError, InventoryResult};
use crate::export::{self, ExportSnapshot};
use crate::pool::Database;
use crate::repository::{product, purchase, sale};

/// Transactional inventory operations over a [`Database`].
///
/// ## Usage
/// ```rust,ignore
/// let inventory = db.inventory();
///
/// let receipt = inventory
///     .apply_purchase(
///         PurchaseTarget::New(NewProduct { name: "Widget".into(), sale_price: Money::from_major(150) }),
///         10,
///         Money::from_major(1000),
///     )
///     .await?;
///
/// let sale = inventory.apply_sale(&receipt.product_id, 3, Some("Ana")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Inventory {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl Inventory {
    /// Creates the service, timestamping with the wall clock.
    pub fn new(db: Database) -> Self {
        Inventory::with_clock(db, Arc::new(SystemClock))
    }

    /// Creates the service with an explicit clock.
    pub fn with_clock(db: Database, clock: Arc<dyn Clock>) -> Self {
        Inventory { db, clock }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Opens a write transaction holding SQLite's RESERVED lock from the start,
    /// so the read-compute-write below cannot interleave with another writer.
    async fn begin_write(&self) -> InventoryResult<Transaction<'static, Sqlite>> {
        let tx = self.db.pool().begin_with("BEGIN IMMEDIATE").await?;
        Ok(tx)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Creates a product, or fetches an existing one.
    ///
    /// - `sale_price = Some(_)`: create the product (stock 0, cost 0). A name
    ///   already on file, ignoring case, fails with `DuplicateProduct`.
    /// - `sale_price = None`: look the product up by name, ignoring case;
    ///   `NotFound` if there is none.
    pub async fn create_or_get_product(
        &self,
        name: &str,
        sale_price: Option<Money>,
    ) -> InventoryResult<Product> {
        match sale_price {
            Some(sale_price) => {
                let mut tx = self.begin_write().await?;
                let product = create_product_in(
                    &mut tx,
                    &NewProduct {
                        name: name.to_string(),
                        sale_price,
                    },
                    self.now(),
                )
                .await?;
                tx.commit().await?;

                info!(product_id = %product.id, name = %product.name, "Product created");
                Ok(product)
            }
            None => {
                let name = validate_product_name(name)?;
                self.find_product_by_name(&name)
                    .await?
                    .ok_or_else(|| CoreError::not_found("Product", name).into())
            }
        }
    }

    /// Gets a product by ID.
    pub async fn get_product(&self, product_id: &str) -> InventoryResult<Product> {
        self.db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id).into())
    }

    /// Finds a product by name, ignoring case.
    pub async fn find_product_by_name(&self, name: &str) -> InventoryResult<Option<Product>> {
        Ok(self.db.products().get_by_name(name).await?)
    }

    /// Lists products ordered by name.
    pub async fn list_products(&self, filter: &ProductFilter) -> InventoryResult<Vec<Product>> {
        Ok(self.db.products().list(filter).await?)
    }

    /// Renames and/or reprices a product.
    ///
    /// Stock and average cost are not editable here; they only move through
    /// purchases and sales.
    pub async fn update_product(
        &self,
        product_id: &str,
        update: ProductUpdate,
    ) -> InventoryResult<Product> {
        let name = update.name.as_deref().map(validate_product_name).transpose()?;
        if let Some(price) = update.sale_price {
            validate_non_negative("sale price", price)?;
        }

        let now = self.now();
        let mut tx = self.begin_write().await?;

        let current = product::fetch_by_id(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        let name = name.unwrap_or_else(|| current.name.clone());
        if let Some(other) = product::fetch_by_name(&mut tx, &name).await? {
            if other.id != current.id {
                warn!(product_id = %product_id, name = %name, "Rename rejected: name taken");
                return Err(CoreError::DuplicateProduct { name }.into());
            }
        }
        let sale_price = update.sale_price.unwrap_or(current.sale_price);

        product::update_details(&mut tx, product_id, &name, sale_price, now)
            .await
            .map_err(|e| duplicate_name(e, &name))?;
        tx.commit().await?;

        info!(product_id = %product_id, name = %name, sale_price = %sale_price, "Product updated");

        Ok(Product {
            name,
            sale_price,
            updated_at: now,
            ..current
        })
    }

    /// Deletes a product together with its purchases and sales.
    pub async fn delete_product(&self, product_id: &str) -> InventoryResult<()> {
        let mut tx = self.begin_write().await?;

        if product::delete(&mut tx, product_id).await? == 0 {
            return Err(CoreError::not_found("Product", product_id).into());
        }
        tx.commit().await?;

        info!(product_id = %product_id, "Product deleted with its history");
        Ok(())
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Receives a purchase batch and re-averages the product's unit cost.
    ///
    /// With [`PurchaseTarget::New`] the product is created in the same
    /// transaction as its first merge, so a failed merge leaves no product
    /// behind.
    pub async fn apply_purchase(
        &self,
        target: PurchaseTarget,
        quantity: i64,
        total_cost: Money,
    ) -> InventoryResult<PurchaseRecord> {
        validate_quantity(quantity)?;
        validate_non_negative("total cost", total_cost)?;

        let now = self.now();
        let mut tx = self.begin_write().await?;

        let current = match &target {
            PurchaseTarget::Existing { product_id } => product::fetch_by_id(&mut tx, product_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Product", product_id.as_str()))?,
            PurchaseTarget::New(new_product) => create_product_in(&mut tx, new_product, now).await?,
        };

        let merged = current.position().merge_purchase(quantity, total_cost)?;
        product::write_position(&mut tx, &current.id, merged, now).await?;

        let record = PurchaseRecord {
            id: Uuid::new_v4().to_string(),
            product_id: current.id.clone(),
            product_name: current.name.clone(),
            quantity,
            total_cost,
            purchased_at: now,
        };
        purchase::insert(&mut tx, &record).await?;

        tx.commit().await?;

        info!(
            product_id = %current.id,
            quantity = quantity,
            total_cost = %total_cost,
            stock = merged.stock,
            average_cost = %merged.average_cost,
            "Purchase applied"
        );

        Ok(record)
    }

    /// All purchases, newest first.
    pub async fn purchase_history(&self) -> InventoryResult<Vec<PurchaseRecord>> {
        Ok(self.db.purchases().list_all().await?)
    }

    /// Purchases of one product, newest first.
    pub async fn purchase_history_for(&self, product_id: &str) -> InventoryResult<Vec<PurchaseRecord>> {
        let product = self.get_product(product_id).await?;
        Ok(self.db.purchases().list_for_product(&product.id).await?)
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Sells `quantity` units at the product's current sale price.
    ///
    /// The cost basis is the average cost read inside the transaction, before
    /// the debit. Revenue and profit are frozen onto the record.
    ///
    /// ## Errors
    /// - `InsufficientStock { available, .. }` when `quantity` exceeds stock
    /// - `NotFound` when the product doesn't exist
    pub async fn apply_sale(
        &self,
        product_id: &str,
        quantity: i64,
        customer: Option<&str>,
    ) -> InventoryResult<SaleRecord> {
        validate_quantity(quantity)?;
        let customer = validate_customer(customer)?;

        let now = self.now();
        let mut tx = self.begin_write().await?;

        let current = product::fetch_by_id(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        let cost_basis = current.average_cost;
        let valuation = SaleValuation::price(quantity, current.sale_price, cost_basis)?;
        let remaining = current.position().debit(quantity).inspect_err(|_| {
            warn!(
                product_id = %product_id,
                available = current.stock,
                requested = quantity,
                "Sale rejected: insufficient stock"
            );
        })?;

        if !product::debit_stock(&mut tx, product_id, quantity, now).await? {
            // The guard saw different stock than the read above.
            let available = product::fetch_by_id(&mut tx, product_id)
                .await?
                .map(|p| p.stock)
                .unwrap_or(0);
            warn!(product_id = %product_id, available, requested = quantity, "Sale rejected by stock guard");
            return Err(CoreError::InsufficientStock {
                available,
                requested: quantity,
            }
            .into());
        }

        let record = SaleRecord {
            id: Uuid::new_v4().to_string(),
            product_id: current.id.clone(),
            product_name: current.name.clone(),
            quantity,
            revenue: valuation.revenue,
            profit: valuation.profit,
            customer,
            sold_at: now,
        };
        sale::insert(&mut tx, &record).await?;

        tx.commit().await?;

        info!(
            sale_id = %record.id,
            product_id = %product_id,
            quantity = quantity,
            revenue = %record.revenue,
            profit = %record.profit,
            cost_basis = %cost_basis,
            stock = remaining.stock,
            "Sale applied"
        );

        Ok(record)
    }

    /// Deletes a sale and puts its units back on hand.
    ///
    /// The average cost is not touched. A second reversal of the same sale
    /// fails with `NotFound`.
    pub async fn reverse_sale(&self, sale_id: &str) -> InventoryResult<()> {
        let now = self.now();
        let mut tx = self.begin_write().await?;

        let record = sale::fetch_by_id(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sale", sale_id))?;

        let current = product::fetch_by_id(&mut tx, &record.product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", record.product_id.as_str()))?;
        let restored = current.position().restore(record.quantity)?;

        product::restore_stock(&mut tx, &record.product_id, record.quantity, now).await?;
        sale::delete(&mut tx, sale_id).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            product_id = %record.product_id,
            quantity = record.quantity,
            stock = restored.stock,
            "Sale reversed"
        );

        Ok(())
    }

    /// Overrides a sale's recorded total.
    ///
    /// The cost of goods frozen at sale time is recovered as
    /// `revenue - profit` and profit is re-derived from `new_revenue`. Stock
    /// and average cost are not touched.
    pub async fn correct_sale_total(
        &self,
        sale_id: &str,
        new_revenue: Money,
    ) -> InventoryResult<SaleRecord> {
        validate_non_negative("revenue", new_revenue)?;

        let mut tx = self.begin_write().await?;

        let record = sale::fetch_by_id(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sale", sale_id))?;

        let corrected = record.valuation().corrected(new_revenue)?;
        sale::update_valuation(&mut tx, sale_id, corrected).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            old_revenue = %record.revenue,
            revenue = %corrected.revenue,
            profit = %corrected.profit,
            "Sale total corrected"
        );

        Ok(SaleRecord {
            revenue: corrected.revenue,
            profit: corrected.profit,
            ..record
        })
    }

    /// Gets a sale by ID.
    pub async fn get_sale(&self, sale_id: &str) -> InventoryResult<SaleRecord> {
        self.db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sale", sale_id).into())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Periods with at least one sale, most recent first.
    pub async fn list_sale_periods(&self) -> InventoryResult<Vec<Period>> {
        Ok(self.db.sales().list_periods().await?)
    }

    /// Revenue and profit totals for one calendar month.
    ///
    /// An empty month yields zero sums.
    pub async fn aggregate_period(&self, year: i32, month: u32) -> InventoryResult<PeriodReport> {
        let period = Period::new(year, month)?;
        self.report_for(period).await
    }

    /// Report for `requested`, falling back to the most recent period with
    /// sales when it is absent or empty, and to the current month when there
    /// are no sales at all.
    pub async fn monthly_report(&self, requested: Option<Period>) -> InventoryResult<PeriodReport> {
        let available = self.list_sale_periods().await?;
        let period = select_period(&available, requested, self.clock.current_period());

        if requested.is_some_and(|r| r != period) {
            debug!(requested = ?requested, selected = %period, "Requested period has no sales");
        }

        self.report_for(period).await
    }

    /// Products, sales and purchases for the spreadsheet export.
    pub async fn export_snapshot(&self) -> InventoryResult<ExportSnapshot> {
        Ok(export::export_snapshot(&self.db, self.now()).await?)
    }

    async fn report_for(&self, period: Period) -> InventoryResult<PeriodReport> {
        let sales = self.db.sales().list_for_period(period).await?;
        let report = PeriodReport::build(period, sales);

        debug!(
            period = %period,
            sales = report.sale_count(),
            revenue = %report.revenue_sum,
            profit = %report.profit_sum,
            "Period aggregated"
        );

        Ok(report)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Inserts a fresh product (stock 0, average cost 0) inside `tx`.
async fn create_product_in(
    tx: &mut Transaction<'static, Sqlite>,
    new_product: &NewProduct,
    now: DateTime<Utc>,
) -> InventoryResult<Product> {
    let name = validate_product_name(&new_product.name)?;
    validate_non_negative("sale price", new_product.sale_price)?;

    if let Some(existing) = product::fetch_by_name(tx, &name).await? {
        warn!(name = %name, existing_id = %existing.id, "Product creation rejected: duplicate name");
        return Err(CoreError::DuplicateProduct { name }.into());
    }

    let empty = StockPosition::EMPTY;
    let created = Product {
        id: Uuid::new_v4().to_string(),
        name,
        stock: empty.stock,
        average_cost: empty.average_cost,
        sale_price: new_product.sale_price,
        created_at: now,
        updated_at: now,
    };

    product::insert(tx, &created)
        .await
        .map_err(|e| duplicate_name(e, &created.name))?;

    debug!(product_id = %created.id, name = %created.name, "Product inserted");
    Ok(created)
}

/// Maps a unique-index hit on the product name to the domain error.
fn duplicate_name(err: DbError, name: &str) -> crate::error::InventoryError {
    match err {
        DbError::UniqueViolation { .. } => CoreError::DuplicateProduct {
            name: name.to_string(),
        }
        .into(),
        other => other.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InventoryError;
    use crate::pool::DbConfig;
    use chrono::{Duration, TimeZone};
    use stockwise_core::{FixedClock, StockLevel};

    struct Fixture {
        inventory: Inventory,
        clock: Arc<FixedClock>,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap(),
        ));
        Fixture {
            inventory: db.inventory_with_clock(clock.clone()),
            clock,
        }
    }

    fn new_product(name: &str, price_major: i64) -> PurchaseTarget {
        PurchaseTarget::New(NewProduct {
            name: name.to_string(),
            sale_price: Money::from_major(price_major),
        })
    }

    fn existing(product_id: &str) -> PurchaseTarget {
        PurchaseTarget::Existing {
            product_id: product_id.to_string(),
        }
    }

    fn is_insufficient(err: &InventoryError, expected_available: i64) -> bool {
        matches!(
            err,
            InventoryError::Core(CoreError::InsufficientStock { available, .. })
                if *available == expected_available
        )
    }

    // -------------------------------------------------------------------------
    // Worked scenario
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_purchase_purchase_sell_scenario() {
        let f = fixture().await;
        let inv = &f.inventory;

        let first = inv
            .apply_purchase(new_product("Widget", 150), 10, Money::from_major(1000))
            .await
            .unwrap();
        let widget = inv.get_product(&first.product_id).await.unwrap();
        assert_eq!(widget.stock, 10);
        assert_eq!(widget.average_cost, Money::from_major(100));

        inv.apply_purchase(existing(&widget.id), 5, Money::from_major(750))
            .await
            .unwrap();
        let widget = inv.get_product(&widget.id).await.unwrap();
        assert_eq!(widget.stock, 15);
        assert_eq!(widget.average_cost, Money::from_cents(11_667));

        let sale = inv.apply_sale(&widget.id, 3, None).await.unwrap();
        assert_eq!(sale.revenue, Money::from_major(450));
        assert_eq!(sale.profit, Money::from_cents(9_999));
        assert_eq!(sale.product_name, "Widget");

        let widget = inv.get_product(&widget.id).await.unwrap();
        assert_eq!(widget.stock, 12);
        assert_eq!(widget.average_cost, Money::from_cents(11_667));
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_or_get_product() {
        let f = fixture().await;
        let inv = &f.inventory;

        let created = inv
            .create_or_get_product("  Widget ", Some(Money::from_major(5)))
            .await
            .unwrap();
        assert_eq!(created.name, "Widget");
        assert_eq!(created.stock, 0);
        assert_eq!(created.average_cost, Money::zero());

        let fetched = inv.create_or_get_product("WIDGET", None).await.unwrap();
        assert_eq!(fetched.id, created.id);

        let missing = inv.create_or_get_product("Gadget", None).await.unwrap_err();
        assert_eq!(missing.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_duplicate_name_ignoring_case() {
        let f = fixture().await;
        let inv = &f.inventory;

        inv.create_or_get_product("widget", Some(Money::from_major(5)))
            .await
            .unwrap();

        let err = inv
            .create_or_get_product("Widget", Some(Money::from_major(6)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Core(CoreError::DuplicateProduct { ref name }) if name == "Widget"
        ));

        // the purchase flow refuses too, and records nothing
        let err = inv
            .apply_purchase(new_product("WIDGET", 6), 1, Money::from_major(1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_PRODUCT");
        assert!(inv.purchase_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_accented_name_ignoring_case() {
        let f = fixture().await;
        let inv = &f.inventory;

        for (first, second) in [("Café", "CAFÉ"), ("Ñandú", "ñandú")] {
            inv.create_or_get_product(first, Some(Money::from_major(5)))
                .await
                .unwrap();
            let err = inv
                .create_or_get_product(second, Some(Money::from_major(5)))
                .await
                .unwrap_err();
            assert_eq!(err.code(), "DUPLICATE_PRODUCT", "{} vs {}", first, second);

            let fetched = inv.create_or_get_product(second, None).await.unwrap();
            assert_eq!(fetched.name, first);
        }

        let tea = inv
            .create_or_get_product("Té Verde", Some(Money::from_major(3)))
            .await
            .unwrap();
        let err = inv
            .update_product(
                &tea.id,
                ProductUpdate {
                    name: Some("CAFÉ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_PRODUCT");

        let products = inv.list_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(products.len(), 3);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let f = fixture().await;
        let inv = &f.inventory;

        let err = inv
            .create_or_get_product("   ", Some(Money::from_major(1)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = inv
            .create_or_get_product("Widget", Some(Money::from_cents(-1)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");
    }

    #[tokio::test]
    async fn test_update_product() {
        let f = fixture().await;
        let inv = &f.inventory;

        let receipt = inv
            .apply_purchase(new_product("Widget", 150), 10, Money::from_major(1000))
            .await
            .unwrap();
        inv.create_or_get_product("Gadget", Some(Money::from_major(20)))
            .await
            .unwrap();

        let updated = inv
            .update_product(
                &receipt.product_id,
                ProductUpdate {
                    name: Some("Widget XL".to_string()),
                    sale_price: Some(Money::from_major(175)),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Widget XL");
        assert_eq!(updated.sale_price, Money::from_major(175));
        assert_eq!(updated.stock, 10);
        assert_eq!(updated.average_cost, Money::from_major(100));

        // same name, different case, is still this product
        inv.update_product(
            &receipt.product_id,
            ProductUpdate {
                name: Some("widget xl".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = inv
            .update_product(
                &receipt.product_id,
                ProductUpdate {
                    name: Some("gadget".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_PRODUCT");

        // history shows the current name
        let history = inv.purchase_history().await.unwrap();
        assert_eq!(history[0].product_name, "widget xl");

        let err = inv
            .update_product("missing", ProductUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_product_cascades() {
        let f = fixture().await;
        let inv = &f.inventory;

        let receipt = inv
            .apply_purchase(new_product("Widget", 150), 10, Money::from_major(1000))
            .await
            .unwrap();
        let sale = inv.apply_sale(&receipt.product_id, 2, None).await.unwrap();

        inv.delete_product(&receipt.product_id).await.unwrap();

        assert_eq!(
            inv.get_product(&receipt.product_id).await.unwrap_err().code(),
            "NOT_FOUND"
        );
        assert_eq!(inv.get_sale(&sale.id).await.unwrap_err().code(), "NOT_FOUND");
        assert!(inv.purchase_history().await.unwrap().is_empty());
        assert!(inv.list_sale_periods().await.unwrap().is_empty());

        let err = inv.delete_product(&receipt.product_id).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_products_by_stock_level() {
        let f = fixture().await;
        let inv = &f.inventory;

        inv.create_or_get_product("Empty", Some(Money::from_major(1)))
            .await
            .unwrap();
        inv.apply_purchase(new_product("Few", 2), 3, Money::from_major(3))
            .await
            .unwrap();
        inv.apply_purchase(new_product("Many", 2), 40, Money::from_major(40))
            .await
            .unwrap();

        let low = inv
            .list_products(&ProductFilter {
                stock_level: Some(StockLevel::LowStock),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Few");
        assert_eq!(low[0].stock_level(), StockLevel::LowStock);

        let all = inv.list_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    // -------------------------------------------------------------------------
    // Purchases
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_average_cost_tracks_each_purchase() {
        let f = fixture().await;
        let inv = &f.inventory;

        let product = inv
            .create_or_get_product("Bolt", Some(Money::from_cents(50)))
            .await
            .unwrap();

        let batches = [(7, 1_000), (3, 0), (11, 2_345), (1, 99)];
        let mut stock = 0i64;
        let mut avg = 0i64;
        for (qty, cost) in batches {
            inv.apply_purchase(existing(&product.id), qty, Money::from_cents(cost))
                .await
                .unwrap();

            let numerator = stock as i128 * avg as i128 + cost as i128;
            let denominator = (stock + qty) as i128;
            let expected = stockwise_core::money::Money::from_cents(
                i64::try_from((2 * numerator + denominator) / (2 * denominator)).unwrap(),
            );
            stock += qty;
            avg = expected.cents();

            let current = inv.get_product(&product.id).await.unwrap();
            assert_eq!(current.stock, stock);
            assert_eq!(current.average_cost, expected);
        }
    }

    #[tokio::test]
    async fn test_purchase_rejects_bad_input_without_side_effects() {
        let f = fixture().await;
        let inv = &f.inventory;

        let err = inv
            .apply_purchase(new_product("Widget", 1), 0, Money::from_major(1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_QUANTITY");

        let err = inv
            .apply_purchase(new_product("Widget", 1), 1, Money::from_cents(-100))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");

        let err = inv
            .apply_purchase(existing("missing"), 1, Money::from_major(1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        assert!(inv.find_product_by_name("Widget").await.unwrap().is_none());
        assert!(inv.purchase_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purchase_history_newest_first() {
        let f = fixture().await;
        let inv = &f.inventory;

        let first = inv
            .apply_purchase(new_product("Widget", 1), 1, Money::from_major(1))
            .await
            .unwrap();
        f.clock.advance(Duration::minutes(5));
        let second = inv
            .apply_purchase(existing(&first.product_id), 2, Money::from_major(2))
            .await
            .unwrap();

        let history = inv.purchase_history().await.unwrap();
        let ids: Vec<_> = history.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[tokio::test]
    async fn test_purchase_history_for_one_product() {
        let f = fixture().await;
        let inv = &f.inventory;

        let widget = inv
            .apply_purchase(new_product("Widget", 1), 1, Money::from_major(1))
            .await
            .unwrap();
        inv.apply_purchase(new_product("Gadget", 1), 4, Money::from_major(4))
            .await
            .unwrap();
        f.clock.advance(Duration::minutes(5));
        let later = inv
            .apply_purchase(existing(&widget.product_id), 2, Money::from_major(2))
            .await
            .unwrap();

        let history = inv.purchase_history_for(&widget.product_id).await.unwrap();
        let ids: Vec<_> = history.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![later.id.as_str(), widget.id.as_str()]);
        assert_eq!(inv.purchase_history().await.unwrap().len(), 3);

        let err = inv.purchase_history_for("missing").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_sale_on_empty_stock_reports_zero() {
        let f = fixture().await;
        let inv = &f.inventory;

        let product = inv
            .create_or_get_product("Widget", Some(Money::from_major(5)))
            .await
            .unwrap();

        let err = inv.apply_sale(&product.id, 1, None).await.unwrap_err();
        assert!(is_insufficient(&err, 0), "got {:?}", err);
        assert!(inv.list_sale_periods().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_boundaries() {
        let f = fixture().await;
        let inv = &f.inventory;

        let receipt = inv
            .apply_purchase(new_product("Widget", 5), 4, Money::from_major(8))
            .await
            .unwrap();

        let err = inv.apply_sale(&receipt.product_id, 5, None).await.unwrap_err();
        assert!(is_insufficient(&err, 4));
        assert_eq!(inv.get_product(&receipt.product_id).await.unwrap().stock, 4);

        inv.apply_sale(&receipt.product_id, 4, Some("Ana")).await.unwrap();
        let product = inv.get_product(&receipt.product_id).await.unwrap();
        assert_eq!(product.stock, 0);
        assert_eq!(product.average_cost, Money::from_major(2));

        let err = inv.apply_sale(&receipt.product_id, 0, None).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_QUANTITY");

        let err = inv.apply_sale("missing", 1, None).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_profit_uses_cost_at_time_of_sale() {
        let f = fixture().await;
        let inv = &f.inventory;

        let receipt = inv
            .apply_purchase(new_product("Widget", 10), 10, Money::from_major(50))
            .await
            .unwrap();
        let early = inv.apply_sale(&receipt.product_id, 2, None).await.unwrap();
        assert_eq!(early.profit, Money::from_major(10));

        // cost goes up after the first sale
        inv.apply_purchase(existing(&receipt.product_id), 8, Money::from_major(72))
            .await
            .unwrap();
        let late = inv.apply_sale(&receipt.product_id, 2, None).await.unwrap();
        assert_eq!(late.profit, Money::from_major(20 - 14));

        // the earlier sale keeps its frozen profit
        assert_eq!(inv.get_sale(&early.id).await.unwrap().profit, Money::from_major(10));
    }

    #[tokio::test]
    async fn test_sale_customer_is_normalised() {
        let f = fixture().await;
        let inv = &f.inventory;

        let receipt = inv
            .apply_purchase(new_product("Widget", 5), 5, Money::from_major(5))
            .await
            .unwrap();

        let named = inv.apply_sale(&receipt.product_id, 1, Some("  Ana ")).await.unwrap();
        assert_eq!(named.customer.as_deref(), Some("Ana"));

        let blank = inv.apply_sale(&receipt.product_id, 1, Some("  ")).await.unwrap();
        assert_eq!(blank.customer, None);
        assert_eq!(inv.get_sale(&blank.id).await.unwrap().customer, None);
    }

    #[tokio::test]
    async fn test_reverse_sale_restores_stock_once() {
        let f = fixture().await;
        let inv = &f.inventory;

        let receipt = inv
            .apply_purchase(new_product("Widget", 150), 15, Money::from_major(1750))
            .await
            .unwrap();
        let before = inv.get_product(&receipt.product_id).await.unwrap();

        let sale = inv.apply_sale(&receipt.product_id, 3, None).await.unwrap();
        inv.reverse_sale(&sale.id).await.unwrap();

        let after = inv.get_product(&receipt.product_id).await.unwrap();
        assert_eq!(after.stock, before.stock);
        assert_eq!(after.average_cost, before.average_cost);
        assert_eq!(inv.get_sale(&sale.id).await.unwrap_err().code(), "NOT_FOUND");

        let err = inv.reverse_sale(&sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Core(CoreError::NotFound { entity: "Sale", .. })
        ));
        assert_eq!(inv.get_product(&receipt.product_id).await.unwrap().stock, 15);
    }

    #[tokio::test]
    async fn test_reverse_sale_after_purchase_keeps_new_average() {
        let f = fixture().await;
        let inv = &f.inventory;

        let receipt = inv
            .apply_purchase(new_product("Widget", 10), 10, Money::from_major(50))
            .await
            .unwrap();
        let sale = inv.apply_sale(&receipt.product_id, 4, None).await.unwrap();
        inv.apply_purchase(existing(&receipt.product_id), 6, Money::from_major(60))
            .await
            .unwrap();
        let before = inv.get_product(&receipt.product_id).await.unwrap();

        inv.reverse_sale(&sale.id).await.unwrap();

        let after = inv.get_product(&receipt.product_id).await.unwrap();
        assert_eq!(after.stock, before.stock + 4);
        assert_eq!(after.average_cost, before.average_cost);
    }

    #[tokio::test]
    async fn test_correct_sale_total() {
        let f = fixture().await;
        let inv = &f.inventory;

        let first = inv
            .apply_purchase(new_product("Widget", 150), 10, Money::from_major(1000))
            .await
            .unwrap();
        inv.apply_purchase(existing(&first.product_id), 5, Money::from_major(750))
            .await
            .unwrap();
        let sale = inv.apply_sale(&first.product_id, 3, None).await.unwrap();
        let product_before = inv.get_product(&first.product_id).await.unwrap();

        let corrected = inv
            .correct_sale_total(&sale.id, Money::from_major(400))
            .await
            .unwrap();
        assert_eq!(corrected.revenue, Money::from_major(400));
        assert_eq!(corrected.profit, Money::from_cents(4_999));
        assert_eq!(corrected.cost_of_goods(), sale.cost_of_goods());
        assert_eq!(corrected.quantity, 3);
        assert_eq!(corrected.sold_at, sale.sold_at);

        let stored = inv.get_sale(&sale.id).await.unwrap();
        assert_eq!(stored, corrected);

        let product_after = inv.get_product(&first.product_id).await.unwrap();
        assert_eq!(product_after, product_before);

        let err = inv
            .correct_sale_total(&sale.id, Money::from_cents(-1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");

        let err = inv
            .correct_sale_total("missing", Money::from_major(1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_two_months_two_periods() {
        let f = fixture().await;
        let inv = &f.inventory;

        let receipt = inv
            .apply_purchase(new_product("Widget", 10), 100, Money::from_major(500))
            .await
            .unwrap();

        f.clock.set(Utc.with_ymd_and_hms(2026, 2, 27, 10, 0, 0).unwrap());
        inv.apply_sale(&receipt.product_id, 2, None).await.unwrap();
        inv.apply_sale(&receipt.product_id, 1, None).await.unwrap();

        f.clock.set(Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap());
        inv.apply_sale(&receipt.product_id, 4, None).await.unwrap();

        let periods = inv.list_sale_periods().await.unwrap();
        assert_eq!(
            periods,
            vec![Period::new(2026, 3).unwrap(), Period::new(2026, 2).unwrap()]
        );

        let feb = inv.aggregate_period(2026, 2).await.unwrap();
        assert_eq!(feb.revenue_sum, Money::from_major(30));
        assert_eq!(feb.profit_sum, Money::from_major(15));
        assert_eq!(feb.sale_count(), 2);

        let mar = inv.aggregate_period(2026, 3).await.unwrap();
        assert_eq!(mar.revenue_sum, Money::from_major(40));
        assert_eq!(mar.profit_sum, Money::from_major(20));

        let empty = inv.aggregate_period(2026, 4).await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.revenue_sum, Money::zero());

        assert!(inv.aggregate_period(2026, 13).await.is_err());
    }

    #[tokio::test]
    async fn test_monthly_report_fallback() {
        let f = fixture().await;
        let inv = &f.inventory;

        // no sales at all: current month, empty
        let report = inv.monthly_report(None).await.unwrap();
        assert_eq!(report.period, Period::new(2026, 3).unwrap());
        assert!(report.is_empty());

        let receipt = inv
            .apply_purchase(new_product("Widget", 10), 10, Money::from_major(50))
            .await
            .unwrap();
        f.clock.set(Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap());
        inv.apply_sale(&receipt.product_id, 1, None).await.unwrap();
        f.clock.set(Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap());

        // default: most recent month with sales, not the current month
        let report = inv.monthly_report(None).await.unwrap();
        assert_eq!(report.period, Period::new(2026, 1).unwrap());
        assert_eq!(report.revenue_sum, Money::from_major(10));

        // requested month without sales falls back
        let report = inv
            .monthly_report(Some(Period::new(2026, 5).unwrap()))
            .await
            .unwrap();
        assert_eq!(report.period, Period::new(2026, 1).unwrap());
    }

    #[tokio::test]
    async fn test_corrections_and_reversals_flow_into_reports() {
        let f = fixture().await;
        let inv = &f.inventory;

        let receipt = inv
            .apply_purchase(new_product("Widget", 10), 10, Money::from_major(50))
            .await
            .unwrap();
        let a = inv.apply_sale(&receipt.product_id, 1, None).await.unwrap();
        let b = inv.apply_sale(&receipt.product_id, 1, None).await.unwrap();

        inv.correct_sale_total(&a.id, Money::from_major(8)).await.unwrap();
        inv.reverse_sale(&b.id).await.unwrap();

        let report = inv.aggregate_period(2026, 3).await.unwrap();
        assert_eq!(report.sale_count(), 1);
        assert_eq!(report.revenue_sum, Money::from_major(8));
        assert_eq!(report.profit_sum, Money::from_major(3));
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("stock.db")).max_connections(8))
            .await
            .unwrap();
        let inv = db.inventory();

        let receipt = inv
            .apply_purchase(new_product("Widget", 10), 10, Money::from_major(50))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let inv = inv.clone();
            let product_id = receipt.product_id.clone();
            handles.push(tokio::spawn(async move {
                inv.apply_sale(&product_id, 1, None).await
            }));
        }

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(e) => assert!(is_insufficient(&e, 0), "unexpected error {:?}", e),
            }
        }

        assert_eq!(sold, 10);
        assert_eq!(inv.get_product(&receipt.product_id).await.unwrap().stock, 0);
        assert_eq!(db.sales().count().await.unwrap(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_purchases_all_counted() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("stock.db")).max_connections(8))
            .await
            .unwrap();
        let inv = db.inventory();

        let product = inv
            .create_or_get_product("Widget", Some(Money::from_major(10)))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..12 {
            let inv = inv.clone();
            let product_id = product.id.clone();
            handles.push(tokio::spawn(async move {
                inv.apply_purchase(existing(&product_id), 2, Money::from_major(10))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let product = inv.get_product(&product.id).await.unwrap();
        assert_eq!(product.stock, 24);
        assert_eq!(product.average_cost, Money::from_major(5));
        assert_eq!(inv.purchase_history().await.unwrap().len(), 12);
    }
}
