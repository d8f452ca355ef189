//! # Seed Data Generator
//!
//! Populates a database with demo products, purchases and sales for
//! development.
//!
//! ## Usage
//! ```bash
//! # Six months of history (default)
//! cargo run -p stockwise-db --bin seed
//!
//! # Custom number of months
//! cargo run -p stockwise-db --bin seed -- --months 12
//!
//! # Specify database path
//! cargo run -p stockwise-db --bin seed -- --db ./data/stockwise.db
//! ```
//!
//! Everything goes through the `Inventory` API, so the seeded stock and
//! average costs obey the same rules as real data. Timestamps come from a
//! `FixedClock` stepped through the months, ending at the current month.

use chrono::{Duration, Months, Utc};
use std::env;
use std::sync::Arc;
use stockwise_core::{Clock, FixedClock, Money, NewProduct, PurchaseTarget};
use stockwise_db::{Database, DbConfig, InventoryError};

/// (name, sale price in cents, unit cost in cents)
const CATALOG: &[(&str, i64, i64)] = &[
    ("Coffee Beans 500g", 1_299, 780),
    ("Green Tea 100g", 649, 310),
    ("Oat Milk 1L", 349, 190),
    ("Dark Chocolate 100g", 299, 140),
    ("Honey 350g", 899, 520),
    ("Olive Oil 750ml", 1_499, 960),
    ("Basmati Rice 1kg", 429, 230),
    ("Sea Salt 250g", 249, 80),
    ("Pasta Fusilli 500g", 219, 95),
    ("Tomato Passata 700g", 279, 130),
];

const CUSTOMERS: &[&str] = &["Ana", "Luis", "Marta", "", "Jorge", ""];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut months: u32 = 6;
    let mut db_path = String::from("./stockwise_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--months" | "-m" => {
                if i + 1 < args.len() {
                    months = args[i + 1].parse().unwrap_or(6).max(1);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockwise Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -m, --months <N>   Months of history to generate (default: 6)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockwise_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockwise Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Months:   {}", months);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = Utc::now()
        .checked_sub_months(Months::new(months - 1))
        .unwrap_or_else(Utc::now);
    let clock = Arc::new(FixedClock::new(start));
    let inventory = db.inventory_with_clock(clock.clone());

    // Opening stock
    let mut product_ids = Vec::with_capacity(CATALOG.len());
    for (idx, (name, price, unit_cost)) in CATALOG.iter().enumerate() {
        let quantity = 20 + (idx as i64 * 7) % 30;
        let receipt = inventory
            .apply_purchase(
                PurchaseTarget::New(NewProduct {
                    name: name.to_string(),
                    sale_price: Money::from_cents(*price),
                }),
                quantity,
                Money::from_cents(unit_cost * quantity),
            )
            .await?;
        product_ids.push(receipt.product_id);
    }
    println!("✓ Created {} products", product_ids.len());

    let mut purchases = CATALOG.len();
    let mut sales = 0usize;
    let mut rejected = 0usize;

    for month in 0..months as usize {
        for day in 0..20usize {
            clock.advance(Duration::hours(30));

            let pick = (month * 31 + day * 7) % product_ids.len();
            let quantity = 1 + ((month + day) % 4) as i64;
            let customer = CUSTOMERS[(month + day) % CUSTOMERS.len()];

            match inventory
                .apply_sale(&product_ids[pick], quantity, Some(customer))
                .await
            {
                Ok(_) => sales += 1,
                Err(InventoryError::Core(e)) if e.code() == "INSUFFICIENT_STOCK" => rejected += 1,
                Err(e) => return Err(e.into()),
            }

            // Restock every fifth day, at a cost drifting up month by month
            if day % 5 == 4 {
                let (_, _, unit_cost) = CATALOG[pick];
                let unit_cost = unit_cost + (month as i64 * 15);
                inventory
                    .apply_purchase(
                        PurchaseTarget::Existing {
                            product_id: product_ids[pick].clone(),
                        },
                        12,
                        Money::from_cents(unit_cost * 12),
                    )
                    .await?;
                purchases += 1;
            }
        }

        if clock.now() > Utc::now() {
            break;
        }
    }

    println!("✓ Recorded {} purchases", purchases);
    println!("✓ Recorded {} sales ({} rejected for stock)", sales, rejected);

    println!();
    println!("Periods with sales:");
    for period in inventory.list_sale_periods().await? {
        let report = inventory.aggregate_period(period.year, period.month).await?;
        println!(
            "  {}  sales {:>3}  revenue {:>10}  profit {:>10}",
            period,
            report.sale_count(),
            report.revenue_sum,
            report.profit_sum
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
