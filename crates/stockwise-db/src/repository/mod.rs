//! # Repository Module
//!
//! Row-level database access for Stockwise.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two ways into the same SQL                           │
//! │                                                                         │
//! │  Read paths (listings, reports, export)                                │
//! │       │  db.products().list(&filter)                                   │
//! │       ▼                                                                 │
//! │  ProductRepository / PurchaseRepository / SaleRepository               │
//! │       │  acquire a pooled connection                                   │
//! │       ▼                                                                 │
//! │  module functions: fetch_by_id(&mut conn, ..), insert(..), ...         │
//! │       ▲                                                                 │
//! │       │  &mut *tx                                                       │
//! │  Inventory (write paths, one BEGIN IMMEDIATE transaction each)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The module-level functions take `&mut SqliteConnection`, so the same
//! statement runs either on a pooled connection or inside a transaction.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product lookup and listing
//! - [`purchase::PurchaseRepository`] - Purchase history
//! - [`sale::SaleRepository`] - Sale lookup and period queries

pub mod product;
pub mod purchase;
pub mod sale;
