//! Command handlers.
//!
//! Each handler runs one inventory operation and renders the result as text,
//! or as JSON with `--json`. Nothing here prints; `main` does.

use anyhow::{bail, Context};
use serde::Serialize;
use std::fmt::Write;

use stockwise_core::validation::validate_uuid;
use stockwise_core::{
    Money, PeriodReport, Product, ProductFilter, ProductUpdate, PurchaseRecord, PurchaseTarget,
    NewProduct, Period, SaleRecord,
};
use stockwise_db::{export, Inventory};

use crate::cli::{Command, ProductCommand, PurchaseArgs, SaleCommand};
use crate::config::AppConfig;

/// Renders results for the terminal.
#[derive(Debug, Clone)]
pub struct Printer {
    config: AppConfig,
    json: bool,
}

impl Printer {
    pub fn new(config: AppConfig, json: bool) -> Self {
        Printer { config, json }
    }

    fn money(&self, amount: Money) -> String {
        self.config.money(amount)
    }

    /// JSON when requested, otherwise the text produced by `text`.
    fn render<T: Serialize>(
        &self,
        value: &T,
        text: impl FnOnce(&T) -> anyhow::Result<String>,
    ) -> anyhow::Result<String> {
        if self.json {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            text(value)
        }
    }

    fn product_line(&self, p: &Product) -> String {
        format!(
            "{:<30} {:>8} {:>12} {:>12} {:>14}",
            p.name,
            p.stock,
            self.money(p.average_cost),
            self.money(p.sale_price),
            self.money(p.inventory_value())
        )
    }

    fn sale_line(&self, s: &SaleRecord) -> String {
        format!(
            "{}  {}  {:<24} {:>6} {:>12} {:>12}  {}",
            s.sold_at.format("%Y-%m-%d %H:%M"),
            s.id,
            s.product_name,
            s.quantity,
            self.money(s.revenue),
            self.money(s.profit),
            s.customer.as_deref().unwrap_or("-")
        )
    }

    fn purchase_line(&self, c: &PurchaseRecord) -> String {
        format!(
            "{}  {:<24} {:>6} {:>12} {:>12}/u",
            c.purchased_at.format("%Y-%m-%d %H:%M"),
            c.product_name,
            c.quantity,
            self.money(c.total_cost),
            self.money(c.unit_cost())
        )
    }
}

/// Runs one command against the inventory.
pub async fn execute(
    command: Command,
    inventory: &Inventory,
    printer: &Printer,
) -> anyhow::Result<String> {
    match command {
        Command::Product { action } => product(action, inventory, printer).await,
        Command::Purchase(args) => purchase(args, inventory, printer).await,
        Command::Sell {
            product,
            quantity,
            customer,
        } => {
            let target = inventory.create_or_get_product(&product, None).await?;
            let sale = inventory
                .apply_sale(&target.id, quantity, customer.as_deref())
                .await?;
            printer.render(&sale, |s| {
                Ok(format!(
                    "Sold {} x {} for {} (profit {})\nSale {}",
                    s.quantity,
                    s.product_name,
                    printer.money(s.revenue),
                    printer.money(s.profit),
                    s.id
                ))
            })
        }
        Command::Sale { action } => sale(action, inventory, printer).await,
        Command::Purchases { product } => {
            let history = match product {
                Some(name) => {
                    let target = inventory.create_or_get_product(&name, None).await?;
                    inventory.purchase_history_for(&target.id).await?
                }
                None => inventory.purchase_history().await?,
            };
            printer.render(&history, |rows| {
                let mut out = String::new();
                for c in rows {
                    writeln!(out, "{}", printer.purchase_line(c))?;
                }
                if rows.is_empty() {
                    out.push_str("No purchases recorded.");
                }
                Ok(out)
            })
        }
        Command::Report { year, month } => {
            let requested = match (year, month) {
                (Some(year), Some(month)) => Some(Period::new(year, month)?),
                _ => None,
            };
            let report = inventory.monthly_report(requested).await?;
            printer.render(&report, |r| render_report(printer, requested, r))
        }
        Command::Periods => {
            let periods = inventory.list_sale_periods().await?;
            printer.render(&periods, |list| {
                if list.is_empty() {
                    return Ok("No sales recorded.".to_string());
                }
                Ok(list.iter().map(Period::to_string).collect::<Vec<_>>().join("\n"))
            })
        }
        Command::Export { dir } => {
            let snapshot = inventory.export_snapshot().await?;
            let paths = export::write_csv_dir(&snapshot, &dir)
                .with_context(|| format!("exporting to {}", dir.display()))?;
            printer.render(&paths, |list| {
                Ok(list
                    .iter()
                    .map(|p| format!("Wrote {}", p.display()))
                    .collect::<Vec<_>>()
                    .join("\n"))
            })
        }
    }
}

async fn product(
    action: ProductCommand,
    inventory: &Inventory,
    printer: &Printer,
) -> anyhow::Result<String> {
    match action {
        ProductCommand::Add { name, sale_price } => {
            let product = inventory.create_or_get_product(&name, Some(sale_price)).await?;
            printer.render(&product, |p| {
                Ok(format!("Created {} at {}", p.name, printer.money(p.sale_price)))
            })
        }
        ProductCommand::List {
            search,
            level,
            limit,
            offset,
        } => {
            let filter = ProductFilter {
                search,
                stock_level: level.map(Into::into),
                limit,
                offset,
            };
            let products = inventory.list_products(&filter).await?;
            printer.render(&products, |list| {
                let mut out = String::new();
                writeln!(
                    out,
                    "{:<30} {:>8} {:>12} {:>12} {:>14}",
                    "NAME", "STOCK", "AVG COST", "PRICE", "VALUE"
                )?;
                for p in list {
                    writeln!(out, "{}", printer.product_line(p))?;
                }
                Ok(out)
            })
        }
        ProductCommand::Rename { name, new_name } => {
            let current = inventory.create_or_get_product(&name, None).await?;
            let updated = inventory
                .update_product(
                    &current.id,
                    ProductUpdate {
                        name: Some(new_name),
                        ..Default::default()
                    },
                )
                .await?;
            printer.render(&updated, |p| Ok(format!("Renamed {} to {}", current.name, p.name)))
        }
        ProductCommand::Price { name, sale_price } => {
            let current = inventory.create_or_get_product(&name, None).await?;
            let updated = inventory
                .update_product(
                    &current.id,
                    ProductUpdate {
                        sale_price: Some(sale_price),
                        ..Default::default()
                    },
                )
                .await?;
            printer.render(&updated, |p| {
                Ok(format!(
                    "{} now sells at {} (was {})",
                    p.name,
                    printer.money(p.sale_price),
                    printer.money(current.sale_price)
                ))
            })
        }
        ProductCommand::Delete { name } => {
            let current = inventory.create_or_get_product(&name, None).await?;
            inventory.delete_product(&current.id).await?;
            printer.render(&current, |p| Ok(format!("Deleted {} and its history", p.name)))
        }
    }
}

async fn purchase(
    args: PurchaseArgs,
    inventory: &Inventory,
    printer: &Printer,
) -> anyhow::Result<String> {
    let target = match (inventory.find_product_by_name(&args.product).await?, args.sale_price) {
        (Some(existing), None) => PurchaseTarget::Existing {
            product_id: existing.id,
        },
        (Some(existing), Some(_)) => bail!(
            "{} already exists; use `product price` to change its sale price",
            existing.name
        ),
        (None, Some(sale_price)) => PurchaseTarget::New(NewProduct {
            name: args.product.clone(),
            sale_price,
        }),
        (None, None) => bail!(
            "no product named {:?}; pass --sale-price to create it",
            args.product
        ),
    };

    let record = inventory
        .apply_purchase(target, args.quantity, args.total_cost)
        .await?;
    let product = inventory.get_product(&record.product_id).await?;

    printer.render(&record, |c| {
        Ok(format!(
            "Received {} x {} for {}\n{}: stock {}, average cost {}",
            c.quantity,
            c.product_name,
            printer.money(c.total_cost),
            product.name,
            product.stock,
            printer.money(product.average_cost)
        ))
    })
}

async fn sale(
    action: SaleCommand,
    inventory: &Inventory,
    printer: &Printer,
) -> anyhow::Result<String> {
    match action {
        SaleCommand::Reverse { id } => {
            validate_uuid(&id)?;
            let record = inventory.get_sale(&id).await?;
            inventory.reverse_sale(&id).await?;
            printer.render(&record, |s| {
                Ok(format!(
                    "Reversed sale {}: {} x {} back in stock",
                    s.id, s.quantity, s.product_name
                ))
            })
        }
        SaleCommand::Correct { id, total } => {
            validate_uuid(&id)?;
            let corrected = inventory.correct_sale_total(&id, total).await?;
            printer.render(&corrected, |s| {
                Ok(format!(
                    "Sale {} now {} (profit {})",
                    s.id,
                    printer.money(s.revenue),
                    printer.money(s.profit)
                ))
            })
        }
    }
}

fn render_report(
    printer: &Printer,
    requested: Option<Period>,
    report: &PeriodReport,
) -> anyhow::Result<String> {
    let mut out = String::new();

    if let Some(requested) = requested.filter(|r| *r != report.period) {
        writeln!(out, "No sales in {}; showing {}.", requested, report.period)?;
    }
    writeln!(out, "Period   {}", report.period)?;
    writeln!(out, "Sales    {}", report.sale_count())?;
    writeln!(out, "Revenue  {}", printer.money(report.revenue_sum))?;
    writeln!(out, "Profit   {}", printer.money(report.profit_sum))?;

    if !report.is_empty() {
        writeln!(out)?;
        for s in &report.sales {
            writeln!(out, "{}", printer.sale_line(s))?;
        }
    }

    Ok(out)
}

// =============================================================================
// Unit Tests
// =============================================================================
