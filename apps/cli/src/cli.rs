//! Argument definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use stockwise_core::{Money, StockLevel};

#[derive(Parser, Debug)]
#[command(name = "stockwise")]
#[command(about = "Inventory stock and weighted-average-cost tracking")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ./stockwise.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite database file, overriding configuration
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductCommand,
    },

    /// Receive a purchase batch
    Purchase(PurchaseArgs),

    /// Sell units at the product's sale price
    Sell {
        /// Product name, any case
        #[arg(long)]
        product: String,

        #[arg(long)]
        quantity: i64,

        #[arg(long)]
        customer: Option<String>,
    },

    /// Reverse or correct a recorded sale
    Sale {
        #[command(subcommand)]
        action: SaleCommand,
    },

    /// Purchase history, newest first
    Purchases {
        /// Only this product, any case
        #[arg(long)]
        product: Option<String>,
    },

    /// Revenue and profit for one month
    Report {
        #[arg(long, requires = "month")]
        year: Option<i32>,

        #[arg(long, requires = "year")]
        month: Option<u32>,
    },

    /// Months with recorded sales
    Periods,

    /// Write products.csv, sales.csv and purchases.csv into a directory
    Export {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// Create a product with no stock
    Add {
        name: String,

        #[arg(long)]
        sale_price: Money,
    },

    /// List products by name
    List {
        /// Substring match on the name, any case
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_enum)]
        level: Option<LevelArg>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Rename a product
    Rename { name: String, new_name: String },

    /// Change a product's sale price
    Price { name: String, sale_price: Money },

    /// Delete a product and its purchase and sale history
    Delete { name: String },
}

#[derive(Args, Debug)]
pub struct PurchaseArgs {
    /// Product name, any case
    #[arg(long)]
    pub product: String,

    #[arg(long)]
    pub quantity: i64,

    /// Cost of the whole batch
    #[arg(long)]
    pub total_cost: Money,

    /// Creates the product at this price if it doesn't exist yet
    #[arg(long)]
    pub sale_price: Option<Money>,
}

#[derive(Subcommand, Debug)]
pub enum SaleCommand {
    /// Delete a sale and put its units back on hand
    Reverse { id: String },

    /// Override a sale's total; profit is recomputed from its frozen cost
    Correct {
        id: String,

        #[arg(long)]
        total: Money,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LevelArg {
    Out,
    Low,
    In,
}

impl From<LevelArg> for StockLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Out => StockLevel::OutOfStock,
            LevelArg::Low => StockLevel::LowStock,
            LevelArg::In => StockLevel::InStock,
        }
    }
}
