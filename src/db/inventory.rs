use super::*;

impl LedgerDb {
    // =========================================================================
    // Inventory batches + movement history
    // =========================================================================

    pub(crate) fn map_batch_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbInventoryBatch> {
        Ok(DbInventoryBatch {
            id: row.get(0)?,
            gold_type: row.get(1)?,
            purity: row.get(2)?,
            purity_percentage: row.get(3)?,
            weight_grams: row.get(4)?,
            avg_cost_per_gram: row.get(5)?,
            total_cost: row.get(6)?,
            location: row.get(7)?,
            source_transaction_id: row.get(8)?,
            supplier_id: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    const BATCH_COLUMNS: &'static str =
        "id, gold_type, purity, purity_percentage, weight_grams, avg_cost_per_gram,
                    total_cost, location, source_transaction_id, supplier_id, created_at, updated_at";

    /// Insert a new inventory batch.
    pub fn insert_batch(&self, batch: &DbInventoryBatch) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO inventory (
                id, gold_type, purity, purity_percentage, weight_grams, avg_cost_per_gram,
                total_cost, location, source_transaction_id, supplier_id, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                batch.id,
                batch.gold_type,
                batch.purity,
                batch.purity_percentage,
                batch.weight_grams,
                batch.avg_cost_per_gram,
                batch.total_cost,
                batch.location,
                batch.source_transaction_id,
                batch.supplier_id,
                batch.created_at,
                batch.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a batch by ID.
    pub fn get_batch(&self, id: &str) -> Result<Option<DbInventoryBatch>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM inventory WHERE id = ?1",
            Self::BATCH_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_batch_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// All batches at a location, largest first.
    pub fn get_batches_at_location(
        &self,
        location: &str,
    ) -> Result<Vec<DbInventoryBatch>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM inventory WHERE location = ?1 ORDER BY weight_grams DESC",
            Self::BATCH_COLUMNS
        ))?;
        let rows = stmt.query_map(params![location], Self::map_batch_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Relocate a batch. The movement-history append lives in the same call
    /// so a location change can never be recorded without its history row.
    pub fn relocate_batch(
        &self,
        id: &str,
        from_location: &str,
        to_location: &str,
        weight_grams: f64,
        notes: Option<&str>,
    ) -> Result<(), DbError> {
        let now = Self::now();
        self.conn.execute(
            "UPDATE inventory SET location = ?1, updated_at = ?2 WHERE id = ?3",
            params![to_location, now, id],
        )?;
        self.conn.execute(
            "INSERT INTO inventory_movements (batch_id, from_location, to_location,
                weight_grams, notes, moved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, from_location, to_location, weight_grams, notes, now],
        )?;
        Ok(())
    }

    /// Set a batch's weight and recompute `total_cost` from its average
    /// cost in the same statement, keeping the cost invariant in one write.
    pub fn set_batch_weight(&self, id: &str, weight_grams: f64) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE inventory
             SET weight_grams = ?1,
                 total_cost = ?1 * avg_cost_per_gram,
                 updated_at = ?2
             WHERE id = ?3",
            params![weight_grams, Self::now(), id],
        )?;
        Ok(())
    }

    /// Movement history for a batch, oldest first.
    pub fn get_movements(&self, batch_id: &str) -> Result<Vec<DbMovement>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, batch_id, from_location, to_location, weight_grams, notes, moved_at
             FROM inventory_movements
             WHERE batch_id = ?1
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![batch_id], |row| {
            Ok(DbMovement {
                id: row.get(0)?,
                batch_id: row.get(1)?,
                from_location: row.get(2)?,
                to_location: row.get(3)?,
                weight_grams: row.get(4)?,
                notes: row.get(5)?,
                moved_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
