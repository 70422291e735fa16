//! Domain enums shared by the db layer and the service engines.
//!
//! Statuses are stored as lowercase strings in SQLite; each enum carries
//! `as_str` for SQL storage and a `parse` that rejects unknown input so bad
//! request payloads surface as validation errors instead of silently
//! landing in the database.

use serde::{Deserialize, Serialize};

/// Authenticated identity threaded into every engine call.
///
/// Engines never consult a global "current user" — the host resolves the
/// session and passes the actor explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Project lifecycle state. `Archived` is manual and terminal: the
/// completion engine never transitions into or out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProjectStatus::Active),
            "completed" => Some(ProjectStatus::Completed),
            "archived" => Some(ProjectStatus::Archived),
            _ => None,
        }
    }
}

/// Task workflow state. The legacy alias "completed" parses to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "review" => Some(TaskStatus::Review),
            "done" | "completed" => Some(TaskStatus::Done),
            "blocked" => Some(TaskStatus::Blocked),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

/// Audit activity kinds the engines emit. Stored as the uppercase labels
/// the activity feed consumers key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    ProjectCompleted,
    ProjectReactivated,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::ProjectCompleted => "PROJECT-COMPLETED",
            ActivityType::ProjectReactivated => "PROJECT-REACTIVATED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "buy",
            TransactionType::Sell => "sell",
        }
    }

    /// Uppercase prefix used in receipt numbers.
    pub fn receipt_prefix(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(TransactionType::Buy),
            "sell" => Some(TransactionType::Sell),
            _ => None,
        }
    }
}

/// Settlement state of a supplier advance, derived from its balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceStatus {
    Pending,
    Partial,
    Settled,
}

impl AdvanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvanceStatus::Pending => "pending",
            AdvanceStatus::Partial => "partial",
            AdvanceStatus::Settled => "settled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AdvanceStatus::Pending),
            "partial" => Some(AdvanceStatus::Partial),
            "settled" => Some(AdvanceStatus::Settled),
            _ => None,
        }
    }

    /// Derive status from the remaining balance against the original amount:
    /// settled iff nothing remains, partial iff some but not all remains.
    pub fn from_balances(remaining: f64, amount: f64) -> Self {
        if remaining <= 0.0 {
            AdvanceStatus::Settled
        } else if remaining < amount {
            AdvanceStatus::Partial
        } else {
            AdvanceStatus::Pending
        }
    }
}

/// Physical location of an inventory batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLocation {
    InSafe,
    AtRefinery,
    InTransit,
    Exported,
}

impl StockLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockLocation::InSafe => "in_safe",
            StockLocation::AtRefinery => "at_refinery",
            StockLocation::InTransit => "in_transit",
            StockLocation::Exported => "exported",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_safe" => Some(StockLocation::InSafe),
            "at_refinery" => Some(StockLocation::AtRefinery),
            "in_transit" => Some(StockLocation::InTransit),
            "exported" => Some(StockLocation::Exported),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierType {
    Miner,
    Trader,
    Refinery,
}

impl SupplierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierType::Miner => "miner",
            SupplierType::Trader => "trader",
            SupplierType::Refinery => "refinery",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "miner" => Some(SupplierType::Miner),
            "trader" => Some(SupplierType::Trader),
            "refinery" => Some(SupplierType::Refinery),
            _ => None,
        }
    }
}
