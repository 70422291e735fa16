use super::*;

impl LedgerDb {
    // =========================================================================
    // Tasks
    // =========================================================================

    /// Helper: map a row to `DbTask`.
    pub(crate) fn map_task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbTask> {
        Ok(DbTask {
            id: row.get(0)?,
            project_id: row.get(1)?,
            title: row.get(2)?,
            status: row.get(3)?,
            priority: row.get(4)?,
            assignee_id: row.get(5)?,
            due_date: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    const TASK_COLUMNS: &'static str = "id, project_id, title, status, priority, assignee_id,
                    due_date, created_at, updated_at";

    /// Insert or update a task.
    pub fn upsert_task(&self, task: &DbTask) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO tasks (
                id, project_id, title, status, priority, assignee_id,
                due_date, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                project_id = excluded.project_id,
                title = excluded.title,
                status = excluded.status,
                priority = excluded.priority,
                assignee_id = excluded.assignee_id,
                due_date = excluded.due_date,
                updated_at = excluded.updated_at",
            params![
                task.id,
                task.project_id,
                task.title,
                task.status,
                task.priority,
                task.assignee_id,
                task.due_date,
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a task by ID.
    pub fn get_task(&self, id: &str) -> Result<Option<DbTask>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE id = ?1",
            Self::TASK_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_task_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Get all tasks belonging to a project, oldest first.
    pub fn get_tasks_for_project(&self, project_id: &str) -> Result<Vec<DbTask>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE project_id = ?1 ORDER BY created_at",
            Self::TASK_COLUMNS
        ))?;
        let rows = stmt.query_map(params![project_id], Self::map_task_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Write a task's status, bumping `updated_at`.
    pub fn set_task_status(&self, id: &str, status: &str) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, Self::now(), id],
        )?;
        Ok(())
    }

    /// Reparent a task onto another project.
    pub fn set_task_project(&self, id: &str, project_id: &str) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE tasks SET project_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![project_id, Self::now(), id],
        )?;
        Ok(())
    }

    /// Delete a task. Returns true if a row was removed.
    pub fn delete_task(&self, id: &str) -> Result<bool, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{sample_project, sample_task, test_db};
    use super::*;

    #[test]
    fn test_upsert_and_get_task() {
        let db = test_db();
        db.upsert_project(&sample_project("p1", "alice")).unwrap();
        db.upsert_task(&sample_task("t1", "p1")).unwrap();

        let task = db.get_task("t1").expect("query").expect("found");
        assert_eq!(task.project_id, "p1");
        assert_eq!(task.status, "todo");

        assert!(db.get_task("missing").expect("query").is_none());
    }

    #[test]
    fn test_tasks_for_project_ordered() {
        let db = test_db();
        db.upsert_project(&sample_project("p1", "alice")).unwrap();

        let mut t1 = sample_task("t1", "p1");
        t1.created_at = "2026-01-01T00:00:00+00:00".to_string();
        let mut t2 = sample_task("t2", "p1");
        t2.created_at = "2026-01-02T00:00:00+00:00".to_string();
        db.upsert_task(&t2).unwrap();
        db.upsert_task(&t1).unwrap();

        let tasks = db.get_tasks_for_project("p1").unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "t1");
        assert_eq!(tasks[1].id, "t2");
    }

    #[test]
    fn test_set_task_status() {
        let db = test_db();
        db.upsert_project(&sample_project("p1", "alice")).unwrap();
        db.upsert_task(&sample_task("t1", "p1")).unwrap();

        db.set_task_status("t1", "done").unwrap();
        let task = db.get_task("t1").unwrap().unwrap();
        assert_eq!(task.status, "done");
    }

    #[test]
    fn test_set_task_project() {
        let db = test_db();
        db.upsert_project(&sample_project("p1", "alice")).unwrap();
        db.upsert_project(&sample_project("p2", "alice")).unwrap();
        db.upsert_task(&sample_task("t1", "p1")).unwrap();

        db.set_task_project("t1", "p2").unwrap();
        let task = db.get_task("t1").unwrap().unwrap();
        assert_eq!(task.project_id, "p2");
    }

    #[test]
    fn test_delete_task() {
        let db = test_db();
        db.upsert_project(&sample_project("p1", "alice")).unwrap();
        db.upsert_task(&sample_task("t1", "p1")).unwrap();

        assert!(db.delete_task("t1").unwrap());
        assert!(!db.delete_task("t1").unwrap(), "second delete is a no-op");
        assert!(db.get_task("t1").unwrap().is_none());
    }
}
