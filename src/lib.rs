//! Embedded back-office engine for a gold trading operation: SQLite-backed
//! project tracking with automatic completion, a priced buy/sell ledger
//! with supplier advances, and physical inventory with movement history.
//!
//! The two load-bearing pieces are [`services::completion`], which keeps a
//! project's status derived from its tasks and records every boundary
//! crossing as an activity, and [`services::ledger`], which prices gold
//! from the spot price and records transactions, advance offsets, and
//! inventory intake as single units of work.

pub mod db;
pub mod error;
pub mod migrations;
pub mod pricing;
pub mod services;
pub mod types;

pub use db::{DbError, LedgerDb};
pub use error::EngineError;
pub use pricing::{advance_offset, price_gold, PricedGold, GRAMS_PER_TROY_OZ};
pub use types::{
    Actor, ActivityType, AdvanceStatus, ProjectStatus, StockLocation, SupplierType, TaskStatus,
    TransactionType,
};
