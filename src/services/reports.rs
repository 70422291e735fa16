//! Period summaries over the transaction ledger.
//!
//! Summaries are derived entirely from the transaction rows in the
//! requested range; nothing here writes to the database, and re-running
//! a report never changes its result.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::db::LedgerDb;
use crate::error::EngineError;
use crate::types::TransactionType;

/// An inclusive calendar-date range, `YYYY-MM-DD` on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Today only.
    pub fn today() -> Self {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        Self::new(today.clone(), today)
    }

    /// The current ISO week, Monday through today.
    pub fn this_week() -> Self {
        let now = Utc::now();
        let monday = now - Duration::days(now.weekday().num_days_from_monday() as i64);
        Self::new(
            monday.format("%Y-%m-%d").to_string(),
            now.format("%Y-%m-%d").to_string(),
        )
    }

    /// The current calendar month, first through today.
    pub fn this_month() -> Self {
        let now = Utc::now();
        Self::new(
            format!("{:04}-{:02}-01", now.year(), now.month()),
            now.format("%Y-%m-%d").to_string(),
        )
    }
}

/// Count, weight, and amount totals for one side of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideTotals {
    pub count: i64,
    pub weight_grams: f64,
    pub total_amount: f64,
}

/// One calendar day's buy/sell totals inside a summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBreakdown {
    pub buys: SideTotals,
    pub sells: SideTotals,
    pub profit_loss: f64,
}

/// Aggregate view of a date range of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub range: DateRange,
    pub buys: SideTotals,
    pub sells: SideTotals,
    /// Sell revenue minus buy spend over the period.
    pub profit_loss: f64,
    /// Grams bought minus grams sold; positive means stock grew.
    pub net_weight_grams: f64,
    /// Per-day totals keyed by `YYYY-MM-DD`, in date order.
    pub daily: BTreeMap<String, DayBreakdown>,
}

/// Fold every transaction in the range into a summary.
pub fn period_summary(db: &LedgerDb, range: DateRange) -> Result<PeriodSummary, EngineError> {
    let transactions = db.get_transactions_in_range(&range.start, &range.end)?;

    let mut summary = PeriodSummary {
        range,
        buys: SideTotals::default(),
        sells: SideTotals::default(),
        profit_loss: 0.0,
        net_weight_grams: 0.0,
        daily: BTreeMap::new(),
    };

    for txn in &transactions {
        let txn_type = match TransactionType::parse(&txn.transaction_type) {
            Some(t) => t,
            None => {
                log::warn!(
                    "Skipping transaction {} with unknown type '{}'",
                    txn.id,
                    txn.transaction_type
                );
                continue;
            }
        };

        // created_at is RFC 3339; the calendar date is its first 10 bytes.
        let day = txn.created_at.get(..10).unwrap_or(&txn.created_at);
        let entry = summary.daily.entry(day.to_string()).or_default();

        match txn_type {
            TransactionType::Buy => {
                summary.buys.count += 1;
                summary.buys.weight_grams += txn.weight_grams;
                summary.buys.total_amount += txn.total_amount;
                entry.buys.count += 1;
                entry.buys.weight_grams += txn.weight_grams;
                entry.buys.total_amount += txn.total_amount;
            }
            TransactionType::Sell => {
                summary.sells.count += 1;
                summary.sells.weight_grams += txn.weight_grams;
                summary.sells.total_amount += txn.total_amount;
                entry.sells.count += 1;
                entry.sells.weight_grams += txn.weight_grams;
                entry.sells.total_amount += txn.total_amount;
            }
        }
    }

    for day in summary.daily.values_mut() {
        day.profit_loss = day.sells.total_amount - day.buys.total_amount;
    }
    summary.profit_loss = summary.sells.total_amount - summary.buys.total_amount;
    summary.net_weight_grams = summary.buys.weight_grams - summary.sells.weight_grams;
    Ok(summary)
}
