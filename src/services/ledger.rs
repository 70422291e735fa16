//! Ledger engine: pricing and recording buy/sell transactions, supplier
//! advances, and their settlement.
//!
//! Every operation is one transaction. The advance's remaining balance is
//! re-read inside that transaction immediately before deduction, so two
//! concurrent buys against the same advance cannot double-spend it.

use rand::RngExt;
use uuid::Uuid;

use crate::db::{DbAdvance, DbInventoryBatch, DbTransaction, LedgerDb};
use crate::error::EngineError;
use crate::pricing::{advance_offset, price_gold};
use crate::types::{Actor, AdvanceStatus, StockLocation, TransactionType};

/// Payment method recorded when any part of a buy was offset by an advance.
pub const ADVANCE_DEDUCTION: &str = "advance_deduction";

/// Request body for `record_transaction`, already parsed by the host.
#[derive(Debug, Clone, Default)]
pub struct TransactionInput {
    pub transaction_type: String,
    pub supplier_id: String,
    pub weight_grams: f64,
    pub spot_price_per_oz: f64,
    pub gold_type: Option<String>,
    pub purity: Option<String>,
    pub purity_percentage: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub advance_id: Option<String>,
    pub location: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Result of a recorded transaction.
#[derive(Debug, Clone)]
pub struct RecordedTransaction {
    pub transaction: DbTransaction,
    /// Human-readable confirmation including the receipt number.
    pub message: String,
}

/// Request body for `give_advance`.
#[derive(Debug, Clone, Default)]
pub struct AdvanceInput {
    pub supplier_id: String,
    pub amount: f64,
    pub currency: Option<String>,
    pub given_date: Option<String>,
    pub expected_settlement_date: Option<String>,
    pub notes: Option<String>,
}

/// Generate a receipt number: `{TYPE}-{epochMillis}-{4-digit random}`.
/// The UNIQUE constraint on `transactions.receipt_number` backs this up.
fn generate_receipt_number(txn_type: TransactionType) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(1000..10000);
    format!("{}-{}-{}", txn_type.receipt_prefix(), millis, suffix)
}

/// Price and record a buy/sell transaction as one unit of work:
/// transaction row, optional advance offset, supplier stats, and (for
/// buys) a new inventory batch. Any failure rolls the whole thing back.
pub fn record_transaction(
    db: &LedgerDb,
    actor: &Actor,
    input: TransactionInput,
) -> Result<RecordedTransaction, EngineError> {
    let txn_type = TransactionType::parse(&input.transaction_type).ok_or_else(|| {
        EngineError::validation(format!(
            "Transaction type must be 'buy' or 'sell', got '{}'",
            input.transaction_type
        ))
    })?;
    if input.supplier_id.trim().is_empty() {
        return Err(EngineError::validation("supplierId is required"));
    }
    if input.weight_grams <= 0.0 {
        return Err(EngineError::validation("weightGrams must be positive"));
    }
    if input.spot_price_per_oz <= 0.0 {
        return Err(EngineError::validation("spotPricePerOz must be positive"));
    }
    let location = match input.location.as_deref() {
        Some(s) => StockLocation::parse(s)
            .ok_or_else(|| EngineError::validation(format!("Unknown location '{s}'")))?,
        None => StockLocation::InSafe,
    };

    let purity = input.purity.clone().unwrap_or_else(|| "24K".to_string());
    let purity_percentage = input.purity_percentage.unwrap_or(0.999);
    let discount_percentage = input.discount_percentage.unwrap_or(0.0);
    let gold_type = input.gold_type.clone().unwrap_or_else(|| "raw".to_string());

    db.with_transaction(|db| {
        let supplier = db
            .get_supplier(&input.supplier_id)?
            .ok_or_else(|| EngineError::not_found("Supplier", input.supplier_id.clone()))?;

        let priced = price_gold(
            input.weight_grams,
            input.spot_price_per_oz,
            purity_percentage,
            discount_percentage,
        );

        // Advance offset applies to buys only. The balance used here is the
        // one re-read inside this transaction.
        let advance = match (&input.advance_id, txn_type) {
            (Some(advance_id), TransactionType::Buy) => {
                let advance = db
                    .get_advance(advance_id)?
                    .ok_or_else(|| EngineError::not_found("Advance", advance_id.clone()))?;
                if advance.supplier_id != supplier.id {
                    return Err(EngineError::validation(format!(
                        "Advance {} belongs to a different supplier",
                        advance.id
                    )));
                }
                if advance.remaining_balance <= 0.0 {
                    return Err(EngineError::conflict(format!(
                        "Advance {} has no remaining balance",
                        advance.id
                    )));
                }
                Some(advance)
            }
            _ => None,
        };

        let (advance_deducted, amount_paid) = match &advance {
            Some(adv) => advance_offset(adv.remaining_balance, priced.total_amount),
            None => (0.0, priced.total_amount),
        };
        let payment_method = if advance_deducted > 0.0 {
            Some(ADVANCE_DEDUCTION.to_string())
        } else {
            input.payment_method.clone()
        };

        // The transaction row is created first so the advance settlement
        // below references an id that already exists.
        let txn = DbTransaction {
            id: Uuid::new_v4().to_string(),
            transaction_type: txn_type.as_str().to_string(),
            supplier_id: supplier.id.clone(),
            gold_type: gold_type.clone(),
            purity: purity.clone(),
            purity_percentage,
            weight_grams: input.weight_grams,
            spot_price_per_oz: input.spot_price_per_oz,
            spot_price_per_gram: priced.spot_price_per_gram,
            discount_percentage,
            buying_price_per_gram: priced.buying_price_per_gram,
            total_amount: priced.total_amount,
            advance_deducted,
            amount_paid,
            payment_method,
            advance_id: advance.as_ref().map(|a| a.id.clone()),
            location: location.as_str().to_string(),
            receipt_number: generate_receipt_number(txn_type),
            notes: input.notes.clone(),
            created_at: LedgerDb::now(),
        };
        db.insert_transaction(&txn)?;

        if let Some(adv) = &advance {
            let remaining = adv.remaining_balance - advance_deducted;
            let status = AdvanceStatus::from_balances(remaining, adv.amount);
            db.apply_advance_deduction(&adv.id, advance_deducted, status.as_str())?;
            db.adjust_supplier_balance(&supplier.id, -advance_deducted)?;
            log::info!(
                "Advance {} offset {:.2} against transaction {} by {}",
                adv.id,
                advance_deducted,
                txn.id,
                actor.user_id
            );
        }

        db.bump_supplier_stats(&supplier.id, txn.weight_grams, txn.total_amount)?;

        if txn_type == TransactionType::Buy {
            let now = LedgerDb::now();
            db.insert_batch(&DbInventoryBatch {
                id: Uuid::new_v4().to_string(),
                gold_type,
                purity: purity.clone(),
                purity_percentage,
                weight_grams: txn.weight_grams,
                avg_cost_per_gram: priced.buying_price_per_gram,
                total_cost: txn.weight_grams * priced.buying_price_per_gram,
                location: location.as_str().to_string(),
                source_transaction_id: Some(txn.id.clone()),
                supplier_id: Some(supplier.id.clone()),
                created_at: now.clone(),
                updated_at: now,
            })?;
        }

        let message = format!(
            "{} of {:.3}g recorded for {} (receipt {})",
            if txn_type == TransactionType::Buy {
                "Purchase"
            } else {
                "Sale"
            },
            txn.weight_grams,
            supplier.name,
            txn.receipt_number
        );
        Ok(RecordedTransaction {
            transaction: txn,
            message,
        })
    })
}

/// Give a cash advance to a supplier against future gold delivery.
pub fn give_advance(
    db: &LedgerDb,
    actor: &Actor,
    input: AdvanceInput,
) -> Result<DbAdvance, EngineError> {
    if input.supplier_id.trim().is_empty() {
        return Err(EngineError::validation("supplierId is required"));
    }
    if input.amount <= 0.0 {
        return Err(EngineError::validation("amount must be positive"));
    }

    db.with_transaction(|db| {
        let supplier = db
            .get_supplier(&input.supplier_id)?
            .ok_or_else(|| EngineError::not_found("Supplier", input.supplier_id.clone()))?;

        let now = LedgerDb::now();
        let advance = DbAdvance {
            id: Uuid::new_v4().to_string(),
            supplier_id: supplier.id.clone(),
            amount: input.amount,
            remaining_balance: input.amount,
            currency: input.currency.clone().unwrap_or_else(|| "USD".to_string()),
            status: AdvanceStatus::Pending.as_str().to_string(),
            given_date: input
                .given_date
                .clone()
                .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string()),
            expected_settlement_date: input.expected_settlement_date.clone(),
            notes: input.notes.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        db.insert_advance(&advance)?;
        db.adjust_supplier_balance(&supplier.id, input.amount)?;

        log::info!(
            "Advance {} of {:.2} {} given to {} by {}",
            advance.id,
            advance.amount,
            advance.currency,
            supplier.name,
            actor.user_id
        );
        Ok(advance)
    })
}

/// Settle part or all of an advance by direct cash repayment.
///
/// The applied amount is clamped to the remaining balance so an advance is
/// never over-settled. Returns the advance after settlement.
pub fn settle_advance(
    db: &LedgerDb,
    actor: &Actor,
    advance_id: &str,
    amount: f64,
) -> Result<DbAdvance, EngineError> {
    if amount <= 0.0 {
        return Err(EngineError::validation("amount must be positive"));
    }

    db.with_transaction(|db| {
        let advance = db
            .get_advance(advance_id)?
            .ok_or_else(|| EngineError::not_found("Advance", advance_id))?;
        if advance.remaining_balance <= 0.0 {
            return Err(EngineError::conflict(format!(
                "Advance {} is already settled",
                advance.id
            )));
        }

        let applied = amount.min(advance.remaining_balance);
        let remaining = advance.remaining_balance - applied;
        let status = AdvanceStatus::from_balances(remaining, advance.amount);
        db.apply_advance_deduction(&advance.id, applied, status.as_str())?;
        db.adjust_supplier_balance(&advance.supplier_id, -applied)?;

        log::info!(
            "Advance {} settled by {:.2} ({}) by {}",
            advance.id,
            applied,
            status.as_str(),
            actor.user_id
        );

        let updated = db
            .get_advance(advance_id)?
            .ok_or_else(|| EngineError::not_found("Advance", advance_id))?;
        Ok(updated)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{sample_supplier, test_db};

    const TOL: f64 = 1e-2;

    fn actor() -> Actor {
        Actor::new("kwame")
    }

    fn buy_input(supplier_id: &str) -> TransactionInput {
        TransactionInput {
            transaction_type: "buy".to_string(),
            supplier_id: supplier_id.to_string(),
            weight_grams: 10.0,
            spot_price_per_oz: 2480.85,
            purity_percentage: Some(0.999),
            discount_percentage: Some(5.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_record_buy_prices_and_materializes_inventory() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();

        let recorded = record_transaction(&db, &actor(), buy_input("s1")).unwrap();
        let txn = &recorded.transaction;

        assert!((txn.spot_price_per_gram - 79.77).abs() < TOL);
        assert!((txn.buying_price_per_gram - 75.78).abs() < TOL);
        assert!((txn.total_amount - 756.97).abs() < TOL);
        assert!((txn.amount_paid - txn.total_amount).abs() < 1e-9);
        assert!(txn.receipt_number.starts_with("BUY-"));
        assert!(recorded.message.contains(&txn.receipt_number));

        // Supplier stats were bumped.
        let supplier = db.get_supplier("s1").unwrap().unwrap();
        assert_eq!(supplier.total_transactions, 1);
        assert!((supplier.total_weight_grams - 10.0).abs() < 1e-9);
        assert!(supplier.last_transaction_at.is_some());

        // A batch now sits in the safe, costed at the buying price.
        let batches = db.get_batches_at_location("in_safe").unwrap();
        assert_eq!(batches.len(), 1);
        assert!((batches[0].avg_cost_per_gram - txn.buying_price_per_gram).abs() < 1e-9);
        assert!(
            (batches[0].total_cost - batches[0].weight_grams * batches[0].avg_cost_per_gram).abs()
                < 1e-6
        );
        assert_eq!(
            batches[0].source_transaction_id.as_deref(),
            Some(txn.id.as_str())
        );
    }

    #[test]
    fn test_record_sell_creates_no_inventory() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();

        let mut input = buy_input("s1");
        input.transaction_type = "sell".to_string();
        let recorded = record_transaction(&db, &actor(), input).unwrap();
        assert!(recorded.transaction.receipt_number.starts_with("SELL-"));

        assert!(db.get_batches_at_location("in_safe").unwrap().is_empty());
    }

    #[test]
    fn test_advance_offset_scenario() {
        // Supplier holds a 1000 advance; a 756.97 buy references it.
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        let advance = give_advance(
            &db,
            &actor(),
            AdvanceInput {
                supplier_id: "s1".to_string(),
                amount: 1000.0,
                ..Default::default()
            },
        )
        .unwrap();
        assert!((db.get_supplier("s1").unwrap().unwrap().outstanding_balance - 1000.0).abs() < 1e-9);

        let mut input = buy_input("s1");
        input.advance_id = Some(advance.id.clone());
        input.payment_method = Some("cash".to_string());
        let recorded = record_transaction(&db, &actor(), input).unwrap();
        let txn = &recorded.transaction;

        assert!((txn.advance_deducted - 756.97).abs() < TOL);
        assert!((txn.amount_paid - 0.0).abs() < TOL);
        assert_eq!(txn.payment_method.as_deref(), Some(ADVANCE_DEDUCTION));

        let advance = db.get_advance(&advance.id).unwrap().unwrap();
        assert!((advance.remaining_balance - 243.03).abs() < TOL);
        assert_eq!(advance.status, "partial");

        let supplier = db.get_supplier("s1").unwrap().unwrap();
        assert!((supplier.outstanding_balance - 243.03).abs() < TOL);
    }

    #[test]
    fn test_advance_never_over_deducted() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        let advance = give_advance(
            &db,
            &actor(),
            AdvanceInput {
                supplier_id: "s1".to_string(),
                amount: 500.0,
                ..Default::default()
            },
        )
        .unwrap();

        // Total (~756.97) exceeds the advance; deduction caps at 500.
        let mut input = buy_input("s1");
        input.advance_id = Some(advance.id.clone());
        let recorded = record_transaction(&db, &actor(), input).unwrap();
        assert!((recorded.transaction.advance_deducted - 500.0).abs() < TOL);
        assert!((recorded.transaction.amount_paid - 256.97).abs() < TOL);

        let advance = db.get_advance(&advance.id).unwrap().unwrap();
        assert!(advance.remaining_balance.abs() < 1e-9);
        assert_eq!(advance.status, "settled");

        // A further buy against the exhausted advance is a conflict.
        let mut input = buy_input("s1");
        input.advance_id = Some(advance.id.clone());
        let err = record_transaction(&db, &actor(), input).unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[test]
    fn test_advance_ignored_for_sell() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        let advance = give_advance(
            &db,
            &actor(),
            AdvanceInput {
                supplier_id: "s1".to_string(),
                amount: 1000.0,
                ..Default::default()
            },
        )
        .unwrap();

        let mut input = buy_input("s1");
        input.transaction_type = "sell".to_string();
        input.advance_id = Some(advance.id.clone());
        let recorded = record_transaction(&db, &actor(), input).unwrap();
        assert_eq!(recorded.transaction.advance_deducted, 0.0);

        let advance = db.get_advance(&advance.id).unwrap().unwrap();
        assert!((advance.remaining_balance - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_validation_rejections() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();

        let mut bad_type = buy_input("s1");
        bad_type.transaction_type = "loan".to_string();
        assert!(matches!(
            record_transaction(&db, &actor(), bad_type).unwrap_err(),
            EngineError::Validation(_)
        ));

        let mut bad_weight = buy_input("s1");
        bad_weight.weight_grams = 0.0;
        assert!(matches!(
            record_transaction(&db, &actor(), bad_weight).unwrap_err(),
            EngineError::Validation(_)
        ));

        let mut bad_spot = buy_input("s1");
        bad_spot.spot_price_per_oz = -1.0;
        assert!(matches!(
            record_transaction(&db, &actor(), bad_spot).unwrap_err(),
            EngineError::Validation(_)
        ));

        let mut bad_location = buy_input("s1");
        bad_location.location = Some("vault".to_string());
        assert!(matches!(
            record_transaction(&db, &actor(), bad_location).unwrap_err(),
            EngineError::Validation(_)
        ));

        assert!(matches!(
            record_transaction(&db, &actor(), buy_input("ghost")).unwrap_err(),
            EngineError::NotFound { .. }
        ));
    }

    #[test]
    fn test_failed_transaction_leaves_no_partial_state() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();

        // Referencing a missing advance fails after the supplier lookup;
        // nothing from the attempt may persist.
        let mut input = buy_input("s1");
        input.advance_id = Some("ghost".to_string());
        let err = record_transaction(&db, &actor(), input).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));

        let supplier = db.get_supplier("s1").unwrap().unwrap();
        assert_eq!(supplier.total_transactions, 0);
        assert!(db.get_batches_at_location("in_safe").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_supplier_advance_rejected() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        db.upsert_supplier(&sample_supplier("s2")).unwrap();
        let advance = give_advance(
            &db,
            &actor(),
            AdvanceInput {
                supplier_id: "s2".to_string(),
                amount: 1000.0,
                ..Default::default()
            },
        )
        .unwrap();

        let mut input = buy_input("s1");
        input.advance_id = Some(advance.id);
        let err = record_transaction(&db, &actor(), input).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_give_advance_validation() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();

        let err = give_advance(
            &db,
            &actor(),
            AdvanceInput {
                supplier_id: "s1".to_string(),
                amount: 0.0,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let err = give_advance(
            &db,
            &actor(),
            AdvanceInput {
                supplier_id: "ghost".to_string(),
                amount: 100.0,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_settle_advance_cash_repayment() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        let advance = give_advance(
            &db,
            &actor(),
            AdvanceInput {
                supplier_id: "s1".to_string(),
                amount: 1000.0,
                ..Default::default()
            },
        )
        .unwrap();

        let after = settle_advance(&db, &actor(), &advance.id, 400.0).unwrap();
        assert!((after.remaining_balance - 600.0).abs() < 1e-9);
        assert_eq!(after.status, "partial");

        // Over-paying clamps to what remains.
        let after = settle_advance(&db, &actor(), &advance.id, 10_000.0).unwrap();
        assert!(after.remaining_balance.abs() < 1e-9);
        assert_eq!(after.status, "settled");

        let supplier = db.get_supplier("s1").unwrap().unwrap();
        assert!(supplier.outstanding_balance.abs() < 1e-9);

        // Settling again is a conflict.
        let err = settle_advance(&db, &actor(), &advance.id, 1.0).unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[test]
    fn test_receipt_number_format() {
        let receipt = generate_receipt_number(TransactionType::Buy);
        let parts: Vec<&str> = receipt.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "BUY");
        assert!(parts[1].parse::<i64>().is_ok());
        let suffix: u32 = parts[2].parse().unwrap();
        assert!((1000..10000).contains(&suffix));
    }
}
