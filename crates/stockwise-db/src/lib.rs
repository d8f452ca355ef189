//! # stockwise-db: Database Layer for Stockwise
//!
//! SQLite persistence and the transactional [`Inventory`] service.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockwise Data Flow                              │
//! │                                                                         │
//! │  stockwise sell --product Widget --quantity 3                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockwise-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Inventory   │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │(inventory.rs) │───►│ product.rs    │    │  (embedded)  │  │   │
//! │  │   │ one tx per op │    │ purchase.rs   │    │ 001_init.sql │  │   │
//! │  │   └───────┬───────┘    │ sale.rs       │    └──────────────┘  │   │
//! │  │           │            └───────────────┘                       │   │
//! │  │           ▼                                                     │   │
//! │  │   stockwise-core ledger (pure WAC arithmetic)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SQLite Database (WAL)                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and inventory error types
//! - [`repository`] - Row access for products, purchases and sales
//! - [`inventory`] - Purchase, sale, reversal, correction and report operations
//! - [`export`] - CSV export
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockwise_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockwise.db")).await?;
//! let inventory = db.inventory();
//!
//! let report = inventory.monthly_report(None).await?;
//! println!("{}: revenue {} profit {}", report.period, report.revenue_sum, report.profit_sum);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod inventory;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, InventoryError, InventoryResult};
pub use export::ExportSnapshot;
pub use inventory::Inventory;
pub use pool::{Database, DbConfig};

pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::sale::SaleRepository;
