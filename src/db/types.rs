//! Shared type definitions for the database layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

/// A row from the `projects` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbProject {
    pub id: String,
    pub name: String,
    pub status: String,
    pub priority: String,
    pub owner_id: String,
    pub due_date: Option<String>,
    pub favourite: bool,
    pub template_tag: Option<String>,
    /// Free-form JSON metadata map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `tasks` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTask {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub assignee_id: Option<String>,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the append-only `activities` audit table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbActivity {
    pub id: String,
    pub actor_id: String,
    pub activity_type: String,
    pub title: String,
    pub description: Option<String>,
    pub entity_type: String,
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    pub created_at: String,
}

/// A row from the `suppliers` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSupplier {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub supplier_type: String,
    pub trust_level: String,
    /// Un-settled advances minus settlements. Signed: negative means the
    /// supplier is owed money.
    pub outstanding_balance: f64,
    pub total_transactions: i64,
    pub total_weight_grams: f64,
    pub total_amount: f64,
    pub last_transaction_at: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `advances` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbAdvance {
    pub id: String,
    pub supplier_id: String,
    pub amount: f64,
    /// Starts equal to `amount`, monotonically non-increasing.
    pub remaining_balance: f64,
    pub currency: String,
    pub status: String,
    pub given_date: String,
    pub expected_settlement_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `transactions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTransaction {
    pub id: String,
    pub transaction_type: String,
    pub supplier_id: String,
    pub gold_type: String,
    pub purity: String,
    pub purity_percentage: f64,
    pub weight_grams: f64,
    pub spot_price_per_oz: f64,
    pub spot_price_per_gram: f64,
    pub discount_percentage: f64,
    pub buying_price_per_gram: f64,
    pub total_amount: f64,
    pub advance_deducted: f64,
    pub amount_paid: f64,
    pub payment_method: Option<String>,
    pub advance_id: Option<String>,
    pub location: String,
    pub receipt_number: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// A row from the `inventory` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbInventoryBatch {
    pub id: String,
    pub gold_type: String,
    pub purity: String,
    pub purity_percentage: f64,
    pub weight_grams: f64,
    pub avg_cost_per_gram: f64,
    /// Always `weight_grams * avg_cost_per_gram`; recomputed on every
    /// weight change.
    pub total_cost: f64,
    pub location: String,
    pub source_transaction_id: Option<String>,
    pub supplier_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `inventory_movements` history table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbMovement {
    pub id: i64,
    pub batch_id: String,
    pub from_location: String,
    pub to_location: String,
    pub weight_grams: f64,
    pub notes: Option<String>,
    pub moved_at: String,
}
