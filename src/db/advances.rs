use super::*;

impl LedgerDb {
    // =========================================================================
    // Advances
    // =========================================================================

    pub(crate) fn map_advance_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbAdvance> {
        Ok(DbAdvance {
            id: row.get(0)?,
            supplier_id: row.get(1)?,
            amount: row.get(2)?,
            remaining_balance: row.get(3)?,
            currency: row.get(4)?,
            status: row.get(5)?,
            given_date: row.get(6)?,
            expected_settlement_date: row.get(7)?,
            notes: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    const ADVANCE_COLUMNS: &'static str =
        "id, supplier_id, amount, remaining_balance, currency, status,
                    given_date, expected_settlement_date, notes, created_at, updated_at";

    /// Insert a new advance.
    pub fn insert_advance(&self, advance: &DbAdvance) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO advances (
                id, supplier_id, amount, remaining_balance, currency, status,
                given_date, expected_settlement_date, notes, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                advance.id,
                advance.supplier_id,
                advance.amount,
                advance.remaining_balance,
                advance.currency,
                advance.status,
                advance.given_date,
                advance.expected_settlement_date,
                advance.notes,
                advance.created_at,
                advance.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get an advance by ID.
    pub fn get_advance(&self, id: &str) -> Result<Option<DbAdvance>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM advances WHERE id = ?1",
            Self::ADVANCE_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_advance_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Advances for a supplier, newest first.
    pub fn get_advances_for_supplier(
        &self,
        supplier_id: &str,
    ) -> Result<Vec<DbAdvance>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM advances WHERE supplier_id = ?1 ORDER BY given_date DESC",
            Self::ADVANCE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![supplier_id], Self::map_advance_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Reduce an advance's remaining balance and set its derived status.
    /// The balance only ever moves down; callers pass the amount deducted.
    pub fn apply_advance_deduction(
        &self,
        id: &str,
        deducted: f64,
        new_status: &str,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE advances
             SET remaining_balance = remaining_balance - ?1,
                 status = ?2,
                 updated_at = ?3
             WHERE id = ?4",
            params![deducted, new_status, Self::now(), id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{sample_advance, sample_supplier, test_db};

    #[test]
    fn test_insert_and_get_advance() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        db.insert_advance(&sample_advance("adv1", "s1", 1000.0))
            .unwrap();

        let advance = db.get_advance("adv1").expect("query").expect("found");
        assert_eq!(advance.supplier_id, "s1");
        assert_eq!(advance.amount, 1000.0);
        assert_eq!(advance.remaining_balance, 1000.0);
        assert_eq!(advance.status, "pending");

        assert!(db.get_advance("missing").unwrap().is_none());
    }

    #[test]
    fn test_apply_advance_deduction() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        db.insert_advance(&sample_advance("adv1", "s1", 1000.0))
            .unwrap();

        db.apply_advance_deduction("adv1", 756.97, "partial").unwrap();

        let advance = db.get_advance("adv1").unwrap().unwrap();
        assert!((advance.remaining_balance - 243.03).abs() < 1e-9);
        assert_eq!(advance.status, "partial");
        assert_eq!(advance.amount, 1000.0, "original amount never changes");
    }

    #[test]
    fn test_advances_for_supplier_ordered() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();

        let mut old = sample_advance("adv-old", "s1", 100.0);
        old.given_date = "2026-01-01".to_string();
        let mut new = sample_advance("adv-new", "s1", 200.0);
        new.given_date = "2026-06-01".to_string();
        db.insert_advance(&old).unwrap();
        db.insert_advance(&new).unwrap();

        let advances = db.get_advances_for_supplier("s1").unwrap();
        assert_eq!(advances.len(), 2);
        assert_eq!(advances[0].id, "adv-new");
    }
}
