use super::*;

impl LedgerDb {
    // =========================================================================
    // Projects
    // =========================================================================

    /// Helper: map a row to `DbProject`.
    pub(crate) fn map_project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbProject> {
        Ok(DbProject {
            id: row.get(0)?,
            name: row.get(1)?,
            status: row
                .get::<_, Option<String>>(2)?
                .unwrap_or_else(|| "active".to_string()),
            priority: row.get(3)?,
            owner_id: row.get(4)?,
            due_date: row.get(5)?,
            favourite: row.get::<_, i32>(6).unwrap_or(0) != 0,
            template_tag: row.get(7)?,
            metadata: row.get(8).unwrap_or(None),
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    const PROJECT_COLUMNS: &'static str = "id, name, status, priority, owner_id, due_date,
                    favourite, template_tag, metadata, created_at, updated_at";

    /// Insert or update a project.
    pub fn upsert_project(&self, project: &DbProject) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO projects (
                id, name, status, priority, owner_id, due_date,
                favourite, template_tag, metadata, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                status = excluded.status,
                priority = excluded.priority,
                owner_id = excluded.owner_id,
                due_date = excluded.due_date,
                favourite = excluded.favourite,
                template_tag = excluded.template_tag,
                metadata = excluded.metadata,
                updated_at = excluded.updated_at",
            params![
                project.id,
                project.name,
                project.status,
                project.priority,
                project.owner_id,
                project.due_date,
                project.favourite as i32,
                project.template_tag,
                project.metadata,
                project.created_at,
                project.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a project by ID.
    pub fn get_project(&self, id: &str) -> Result<Option<DbProject>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM projects WHERE id = ?1",
            Self::PROJECT_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_project_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Get all projects owned by or shared with a user, ordered by name.
    pub fn get_projects_for_user(&self, user_id: &str) -> Result<Vec<DbProject>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM projects p
             WHERE p.owner_id = ?1
                OR EXISTS (SELECT 1 FROM project_members pm
                           WHERE pm.project_id = p.id AND pm.user_id = ?1)
             ORDER BY name",
            Self::PROJECT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], Self::map_project_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Set a project's status, bumping `updated_at`.
    pub fn set_project_status(&self, id: &str, status: &str) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE projects SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, Self::now(), id],
        )?;
        Ok(())
    }

    /// Add a user to a project's member list (idempotent).
    pub fn add_project_member(&self, project_id: &str, user_id: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO project_members (project_id, user_id) VALUES (?1, ?2)",
            params![project_id, user_id],
        )?;
        Ok(())
    }

    /// Whether a user may act on a project: owner or listed member.
    pub fn user_has_project_access(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<bool, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT 1 FROM projects p
             WHERE p.id = ?1
               AND (p.owner_id = ?2
                    OR EXISTS (SELECT 1 FROM project_members pm
                               WHERE pm.project_id = p.id AND pm.user_id = ?2))",
        )?;
        Ok(stmt.exists(params![project_id, user_id])?)
    }
}
