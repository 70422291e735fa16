//! Inventory engine: manual stock entry, movement between physical
//! locations, and consumption (refining loss, export, write-off).

use uuid::Uuid;

use crate::db::{DbInventoryBatch, LedgerDb};
use crate::error::EngineError;
use crate::types::{Actor, StockLocation};

/// Request body for `add_stock` — a batch that did not come from a
/// recorded buy (opening stock, found stock, corrections).
#[derive(Debug, Clone, Default)]
pub struct StockInput {
    pub gold_type: String,
    pub purity: Option<String>,
    pub purity_percentage: Option<f64>,
    pub weight_grams: f64,
    pub avg_cost_per_gram: f64,
    pub location: Option<String>,
    pub supplier_id: Option<String>,
}

/// Record a batch that entered the books outside a buy transaction.
pub fn add_stock(
    db: &LedgerDb,
    actor: &Actor,
    input: StockInput,
) -> Result<DbInventoryBatch, EngineError> {
    if input.weight_grams <= 0.0 {
        return Err(EngineError::validation("weightGrams must be positive"));
    }
    if input.avg_cost_per_gram < 0.0 {
        return Err(EngineError::validation("avgCostPerGram cannot be negative"));
    }
    let location = match input.location.as_deref() {
        Some(s) => StockLocation::parse(s)
            .ok_or_else(|| EngineError::validation(format!("Unknown location '{s}'")))?,
        None => StockLocation::InSafe,
    };

    db.with_transaction(|db| {
        let now = LedgerDb::now();
        let batch = DbInventoryBatch {
            id: Uuid::new_v4().to_string(),
            gold_type: if input.gold_type.trim().is_empty() {
                "raw".to_string()
            } else {
                input.gold_type.clone()
            },
            purity: input.purity.clone().unwrap_or_else(|| "24K".to_string()),
            purity_percentage: input.purity_percentage.unwrap_or(0.999),
            weight_grams: input.weight_grams,
            avg_cost_per_gram: input.avg_cost_per_gram,
            total_cost: input.weight_grams * input.avg_cost_per_gram,
            location: location.as_str().to_string(),
            source_transaction_id: None,
            supplier_id: input.supplier_id.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        db.insert_batch(&batch)?;
        log::info!(
            "Stock batch {} ({:.3}g) added at {} by {}",
            batch.id,
            batch.weight_grams,
            batch.location,
            actor.user_id
        );
        Ok(batch)
    })
}

/// Move a batch to another location, recording a movement history row.
///
/// Moving a batch to the location it already occupies is rejected and
/// leaves no history row behind.
pub fn move_inventory(
    db: &LedgerDb,
    actor: &Actor,
    batch_id: &str,
    to_location: &str,
    notes: Option<&str>,
) -> Result<DbInventoryBatch, EngineError> {
    let destination = StockLocation::parse(to_location)
        .ok_or_else(|| EngineError::validation(format!("Unknown location '{to_location}'")))?;

    db.with_transaction(|db| {
        let batch = db
            .get_batch(batch_id)?
            .ok_or_else(|| EngineError::not_found("Inventory batch", batch_id))?;
        if batch.location == destination.as_str() {
            return Err(EngineError::conflict(format!(
                "Batch {} is already at {}",
                batch.id,
                destination.as_str()
            )));
        }

        db.relocate_batch(
            &batch.id,
            &batch.location,
            destination.as_str(),
            batch.weight_grams,
            notes,
        )?;
        log::info!(
            "Batch {} moved {} -> {} by {}",
            batch.id,
            batch.location,
            destination.as_str(),
            actor.user_id
        );

        let updated = db
            .get_batch(batch_id)?
            .ok_or_else(|| EngineError::not_found("Inventory batch", batch_id))?;
        Ok(updated)
    })
}

/// Reduce a batch's weight (refining loss, sale fulfilment, export).
///
/// The batch's total cost follows its weight at the same average cost
/// per gram. Consuming more than the batch holds is rejected.
pub fn consume_stock(
    db: &LedgerDb,
    actor: &Actor,
    batch_id: &str,
    grams: f64,
) -> Result<DbInventoryBatch, EngineError> {
    if grams <= 0.0 {
        return Err(EngineError::validation("grams must be positive"));
    }

    db.with_transaction(|db| {
        let batch = db
            .get_batch(batch_id)?
            .ok_or_else(|| EngineError::not_found("Inventory batch", batch_id))?;
        if grams > batch.weight_grams + 1e-9 {
            return Err(EngineError::conflict(format!(
                "Batch {} holds {:.3}g, cannot consume {:.3}g",
                batch.id, batch.weight_grams, grams
            )));
        }

        let remaining = (batch.weight_grams - grams).max(0.0);
        db.set_batch_weight(&batch.id, remaining)?;
        log::info!(
            "Batch {} consumed {:.3}g ({:.3}g left) by {}",
            batch.id,
            grams,
            remaining,
            actor.user_id
        );

        let updated = db
            .get_batch(batch_id)?
            .ok_or_else(|| EngineError::not_found("Inventory batch", batch_id))?;
        Ok(updated)
    })
}
