use super::*;

impl LedgerDb {
    // =========================================================================
    // Activities (append-only audit trail)
    // =========================================================================

    pub(crate) fn map_activity_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbActivity> {
        Ok(DbActivity {
            id: row.get(0)?,
            actor_id: row.get(1)?,
            activity_type: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            entity_type: row.get(5)?,
            entity_id: row.get(6)?,
            metadata: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    /// Append an activity record. There is deliberately no update or delete
    /// counterpart: the trail is append-only.
    pub fn insert_activity(&self, activity: &DbActivity) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO activities (
                id, actor_id, activity_type, title, description,
                entity_type, entity_id, metadata, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                activity.id,
                activity.actor_id,
                activity.activity_type,
                activity.title,
                activity.description,
                activity.entity_type,
                activity.entity_id,
                activity.metadata,
                activity.created_at,
            ],
        )?;
        Ok(())
    }

    /// Activities referencing an entity, newest first.
    pub fn get_activities_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<DbActivity>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, actor_id, activity_type, title, description,
                    entity_type, entity_id, metadata, created_at
             FROM activities
             WHERE entity_type = ?1 AND entity_id = ?2
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![entity_type, entity_id], Self::map_activity_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Count activities of a given type for an entity. Used by callers
    /// asserting the one-activity-per-transition contract.
    pub fn count_activities(
        &self,
        entity_id: &str,
        activity_type: &str,
    ) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM activities WHERE entity_id = ?1 AND activity_type = ?2",
            params![entity_id, activity_type],
            |row| row.get(0),
        )?)
    }
}
