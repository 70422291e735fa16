use super::*;

impl LedgerDb {
    // =========================================================================
    // Suppliers
    // =========================================================================

    pub(crate) fn map_supplier_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbSupplier> {
        Ok(DbSupplier {
            id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            email: row.get(3)?,
            location: row.get(4)?,
            supplier_type: row.get(5)?,
            trust_level: row.get(6)?,
            outstanding_balance: row.get(7)?,
            total_transactions: row.get(8)?,
            total_weight_grams: row.get(9)?,
            total_amount: row.get(10)?,
            last_transaction_at: row.get(11)?,
            active: row.get::<_, i32>(12).unwrap_or(0) != 0,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }

    const SUPPLIER_COLUMNS: &'static str =
        "id, name, phone, email, location, supplier_type, trust_level,
                    outstanding_balance, total_transactions, total_weight_grams, total_amount,
                    last_transaction_at, active, created_at, updated_at";

    /// Insert or update a supplier. Aggregate stats and outstanding balance
    /// are not touched on update — those move only through the ledger paths.
    pub fn upsert_supplier(&self, supplier: &DbSupplier) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO suppliers (
                id, name, phone, email, location, supplier_type, trust_level,
                outstanding_balance, total_transactions, total_weight_grams, total_amount,
                last_transaction_at, active, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                phone = excluded.phone,
                email = excluded.email,
                location = excluded.location,
                supplier_type = excluded.supplier_type,
                trust_level = excluded.trust_level,
                active = excluded.active,
                updated_at = excluded.updated_at",
            params![
                supplier.id,
                supplier.name,
                supplier.phone,
                supplier.email,
                supplier.location,
                supplier.supplier_type,
                supplier.trust_level,
                supplier.outstanding_balance,
                supplier.total_transactions,
                supplier.total_weight_grams,
                supplier.total_amount,
                supplier.last_transaction_at,
                supplier.active as i32,
                supplier.created_at,
                supplier.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a supplier by ID.
    pub fn get_supplier(&self, id: &str) -> Result<Option<DbSupplier>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM suppliers WHERE id = ?1",
            Self::SUPPLIER_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_supplier_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Get all active suppliers, ordered by name.
    pub fn get_active_suppliers(&self) -> Result<Vec<DbSupplier>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM suppliers WHERE active = 1 ORDER BY name",
            Self::SUPPLIER_COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::map_supplier_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Shift a supplier's outstanding balance by a signed delta.
    pub fn adjust_supplier_balance(&self, id: &str, delta: f64) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE suppliers
             SET outstanding_balance = outstanding_balance + ?1, updated_at = ?2
             WHERE id = ?3",
            params![delta, Self::now(), id],
        )?;
        Ok(())
    }

    /// Bump per-supplier aggregate stats after a recorded transaction.
    pub fn bump_supplier_stats(
        &self,
        id: &str,
        weight_grams: f64,
        amount: f64,
    ) -> Result<(), DbError> {
        let now = Self::now();
        self.conn.execute(
            "UPDATE suppliers
             SET total_transactions = total_transactions + 1,
                 total_weight_grams = total_weight_grams + ?1,
                 total_amount = total_amount + ?2,
                 last_transaction_at = ?3,
                 updated_at = ?3
             WHERE id = ?4",
            params![weight_grams, amount, now, id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{sample_supplier, test_db};

    #[test]
    fn test_upsert_and_get_supplier() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();

        let supplier = db.get_supplier("s1").expect("query").expect("found");
        assert_eq!(supplier.name, "Supplier s1");
        assert_eq!(supplier.supplier_type, "trader");
        assert_eq!(supplier.outstanding_balance, 0.0);
        assert!(supplier.active);

        assert!(db.get_supplier("missing").unwrap().is_none());
    }

    #[test]
    fn test_update_does_not_touch_balances() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        db.adjust_supplier_balance("s1", 500.0).unwrap();

        // Re-upsert with zeroed stats; balance must survive.
        let mut again = sample_supplier("s1");
        again.name = "Renamed".to_string();
        db.upsert_supplier(&again).unwrap();

        let supplier = db.get_supplier("s1").unwrap().unwrap();
        assert_eq!(supplier.name, "Renamed");
        assert_eq!(supplier.outstanding_balance, 500.0);
    }

    #[test]
    fn test_bump_supplier_stats() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();

        db.bump_supplier_stats("s1", 10.0, 756.97).unwrap();
        db.bump_supplier_stats("s1", 5.0, 380.0).unwrap();

        let supplier = db.get_supplier("s1").unwrap().unwrap();
        assert_eq!(supplier.total_transactions, 2);
        assert!((supplier.total_weight_grams - 15.0).abs() < 1e-9);
        assert!((supplier.total_amount - 1136.97).abs() < 1e-9);
        assert!(supplier.last_transaction_at.is_some());
    }

    #[test]
    fn test_active_suppliers_excludes_inactive() {
        let db = test_db();
        db.upsert_supplier(&sample_supplier("s1")).unwrap();
        let mut inactive = sample_supplier("s2");
        inactive.active = false;
        db.upsert_supplier(&inactive).unwrap();

        let suppliers = db.get_active_suppliers().unwrap();
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].id, "s1");
    }
}
