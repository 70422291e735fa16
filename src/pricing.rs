//! Gold pricing arithmetic.
//!
//! The spot → per-gram → discounted → total chain lives here and nowhere
//! else; every handler and engine that needs a price goes through
//! `price_gold` so the formula has one definition and one test surface.

use serde::Serialize;

/// Grams in one troy ounce. Spot prices are quoted per troy ounce; all
/// ledger arithmetic is per gram.
pub const GRAMS_PER_TROY_OZ: f64 = 31.1035;

/// Output of the pricing chain for a single transaction.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedGold {
    pub spot_price_per_gram: f64,
    pub buying_price_per_gram: f64,
    pub total_amount: f64,
}

/// Price a quantity of gold, in order:
/// 1. `spot_price_per_gram = spot_price_per_oz / 31.1035`
/// 2. `buying_price_per_gram = spot_price_per_gram * (1 - discount/100)`
/// 3. `total_amount = weight_grams * buying_price_per_gram * purity`
pub fn price_gold(
    weight_grams: f64,
    spot_price_per_oz: f64,
    purity_percentage: f64,
    discount_percentage: f64,
) -> PricedGold {
    let spot_price_per_gram = spot_price_per_oz / GRAMS_PER_TROY_OZ;
    let buying_price_per_gram = spot_price_per_gram * (1.0 - discount_percentage / 100.0);
    let total_amount = weight_grams * buying_price_per_gram * purity_percentage;
    PricedGold {
        spot_price_per_gram,
        buying_price_per_gram,
        total_amount,
    }
}

/// Split a transaction total against an advance's remaining balance.
///
/// Returns `(advance_deducted, amount_paid)` where the deduction never
/// exceeds either the remaining balance or the total.
pub fn advance_offset(remaining_balance: f64, total_amount: f64) -> (f64, f64) {
    let deducted = remaining_balance.min(total_amount).max(0.0);
    (deducted, total_amount - deducted)
}
