use super::*;

impl LedgerDb {
    // =========================================================================
    // Transactions
    // =========================================================================

    pub(crate) fn map_transaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbTransaction> {
        Ok(DbTransaction {
            id: row.get(0)?,
            transaction_type: row.get(1)?,
            supplier_id: row.get(2)?,
            gold_type: row.get(3)?,
            purity: row.get(4)?,
            purity_percentage: row.get(5)?,
            weight_grams: row.get(6)?,
            spot_price_per_oz: row.get(7)?,
            spot_price_per_gram: row.get(8)?,
            discount_percentage: row.get(9)?,
            buying_price_per_gram: row.get(10)?,
            total_amount: row.get(11)?,
            advance_deducted: row.get(12)?,
            amount_paid: row.get(13)?,
            payment_method: row.get(14)?,
            advance_id: row.get(15)?,
            location: row.get(16)?,
            receipt_number: row.get(17)?,
            notes: row.get(18)?,
            created_at: row.get(19)?,
        })
    }

    const TRANSACTION_COLUMNS: &'static str =
        "id, transaction_type, supplier_id, gold_type, purity, purity_percentage,
                    weight_grams, spot_price_per_oz, spot_price_per_gram, discount_percentage,
                    buying_price_per_gram, total_amount, advance_deducted, amount_paid,
                    payment_method, advance_id, location, receipt_number, notes, created_at";

    /// Insert a transaction row.
    pub fn insert_transaction(&self, txn: &DbTransaction) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO transactions (
                id, transaction_type, supplier_id, gold_type, purity, purity_percentage,
                weight_grams, spot_price_per_oz, spot_price_per_gram, discount_percentage,
                buying_price_per_gram, total_amount, advance_deducted, amount_paid,
                payment_method, advance_id, location, receipt_number, notes, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                       ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            params![
                txn.id,
                txn.transaction_type,
                txn.supplier_id,
                txn.gold_type,
                txn.purity,
                txn.purity_percentage,
                txn.weight_grams,
                txn.spot_price_per_oz,
                txn.spot_price_per_gram,
                txn.discount_percentage,
                txn.buying_price_per_gram,
                txn.total_amount,
                txn.advance_deducted,
                txn.amount_paid,
                txn.payment_method,
                txn.advance_id,
                txn.location,
                txn.receipt_number,
                txn.notes,
                txn.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a transaction by ID.
    pub fn get_transaction(&self, id: &str) -> Result<Option<DbTransaction>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE id = ?1",
            Self::TRANSACTION_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_transaction_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Transactions whose calendar date falls within [start, end]
    /// (inclusive, `YYYY-MM-DD`), oldest first. Feeds the reporting fold.
    pub fn get_transactions_in_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<DbTransaction>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE date(created_at) >= date(?1) AND date(created_at) <= date(?2)
             ORDER BY created_at",
            Self::TRANSACTION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![start_date, end_date], Self::map_transaction_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Transactions for a supplier, newest first.
    pub fn get_transactions_for_supplier(
        &self,
        supplier_id: &str,
        limit: i64,
    ) -> Result<Vec<DbTransaction>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE supplier_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
            Self::TRANSACTION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![supplier_id, limit], Self::map_transaction_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{sample_supplier, sample_transaction, test_db};

    #[test]
    fn test_insert_and_get_transaction() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        db.insert_transaction(&sample_transaction("t1", "s1", "buy", 756.97))
            .unwrap();

        let txn = db.get_transaction("t1").expect("query").expect("found");
        assert_eq!(txn.transaction_type, "buy");
        assert_eq!(txn.supplier_id, "s1");
        assert!((txn.total_amount - 756.97).abs() < 1e-9);
    }

    #[test]
    fn test_range_query_bounds_inclusive() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();

        let mut t1 = sample_transaction("t1", "s1", "buy", 100.0);
        t1.created_at = "2026-03-01T09:00:00+00:00".to_string();
        let mut t2 = sample_transaction("t2", "s1", "sell", 200.0);
        t2.created_at = "2026-03-15T09:00:00+00:00".to_string();
        let mut t3 = sample_transaction("t3", "s1", "buy", 300.0);
        t3.created_at = "2026-04-01T09:00:00+00:00".to_string();
        db.insert_transaction(&t1).unwrap();
        db.insert_transaction(&t2).unwrap();
        db.insert_transaction(&t3).unwrap();

        let march = db
            .get_transactions_in_range("2026-03-01", "2026-03-31")
            .unwrap();
        assert_eq!(march.len(), 2);
        assert_eq!(march[0].id, "t1");
        assert_eq!(march[1].id, "t2");
    }

    #[test]
    fn test_supplier_history_limit() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        for i in 0..5 {
            let mut txn = sample_transaction(&format!("t{i}"), "s1", "buy", 100.0);
            txn.created_at = format!("2026-03-{:02}T09:00:00+00:00", i + 1);
            db.insert_transaction(&txn).unwrap();
        }

        let recent = db.get_transactions_for_supplier("s1", 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].id, "t4", "newest first");
    }
}
