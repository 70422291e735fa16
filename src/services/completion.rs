//! Project auto-completion engine.
//!
//! Keeps `projects.status` consistent with the completion state of its
//! tasks: a project is `completed` iff it has at least one task and every
//! task is `done`. The recompute runs inside the same transaction as the
//! task write that triggered it, so an external reader never observes a
//! project whose status is stale relative to its tasks.

use serde_json::json;
use uuid::Uuid;

use crate::db::{DbActivity, DbTask, LedgerDb};
use crate::error::EngineError;
use crate::types::{ActivityType, Actor, ProjectStatus, TaskStatus};

/// A project status transition produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Completed,
    Reactivated,
}

/// Set a task's status and synchronously recompute the owning project's
/// completion state, all in one transaction.
///
/// Unknown status strings are a validation error; the legacy "completed"
/// alias is accepted and stored as `done`.
pub fn set_task_status(
    db: &LedgerDb,
    actor: &Actor,
    task_id: &str,
    new_status: &str,
) -> Result<DbTask, EngineError> {
    let status = TaskStatus::parse(new_status)
        .ok_or_else(|| EngineError::validation(format!("Unknown task status '{new_status}'")))?;

    db.with_transaction(|db| {
        let task = db
            .get_task(task_id)?
            .ok_or_else(|| EngineError::not_found("Task", task_id))?;

        db.set_task_status(task_id, status.as_str())?;
        recompute_project_completion(db, actor, &task.project_id, Some(task_id))?;

        let updated = db
            .get_task(task_id)?
            .ok_or_else(|| EngineError::not_found("Task", task_id))?;
        Ok(updated)
    })
}

/// Recompute a project's completion status after a task change.
///
/// Must be called inside the transaction that wrote the task. Returns the
/// transition performed, if any. `trigger_task_id` is recorded in the audit
/// activity's metadata when present.
///
/// Archived projects are terminal: the engine never overrides them.
pub fn recompute_project_completion(
    db: &LedgerDb,
    actor: &Actor,
    project_id: &str,
    trigger_task_id: Option<&str>,
) -> Result<Option<Transition>, EngineError> {
    let project = db
        .get_project(project_id)?
        .ok_or_else(|| EngineError::not_found("Project", project_id))?;

    let current = ProjectStatus::parse(&project.status).unwrap_or(ProjectStatus::Active);
    if current == ProjectStatus::Archived {
        return Ok(None);
    }

    let tasks = db.get_tasks_for_project(project_id)?;
    // An empty project is never auto-completed: all() over an empty set is
    // vacuously true, so the non-empty check is load-bearing.
    let all_done = !tasks.is_empty()
        && tasks
            .iter()
            .all(|t| TaskStatus::parse(&t.status).map(|s| s.is_done()).unwrap_or(false));

    let transition = match (all_done, current) {
        (true, ProjectStatus::Active) => Some(Transition::Completed),
        (false, ProjectStatus::Completed) => Some(Transition::Reactivated),
        _ => None,
    };

    if let Some(transition) = transition {
        let (new_status, activity_type, title) = match transition {
            Transition::Completed => (
                ProjectStatus::Completed,
                ActivityType::ProjectCompleted,
                format!("Project '{}' completed", project.name),
            ),
            Transition::Reactivated => (
                ProjectStatus::Active,
                ActivityType::ProjectReactivated,
                format!("Project '{}' reactivated", project.name),
            ),
        };

        db.set_project_status(project_id, new_status.as_str())?;

        // The activity write shares the transaction: a failed audit append
        // rolls the status change back rather than dropping the trail.
        let now = LedgerDb::now();
        let metadata = json!({
            "triggeringTaskId": trigger_task_id,
            "taskCount": tasks.len(),
            "transitionedAt": now,
        });
        db.insert_activity(&DbActivity {
            id: Uuid::new_v4().to_string(),
            actor_id: actor.user_id.clone(),
            activity_type: activity_type.as_str().to_string(),
            title,
            description: None,
            entity_type: "project".to_string(),
            entity_id: project_id.to_string(),
            metadata: Some(metadata.to_string()),
            created_at: now,
        })?;

        log::info!(
            "Project {} {} ({} tasks)",
            project_id,
            activity_type.as_str(),
            tasks.len()
        );
    }

    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{sample_project, sample_task, test_db};

    fn actor() -> Actor {
        Actor::new("alice")
    }

    fn status_of(db: &LedgerDb, project_id: &str) -> String {
        db.get_project(project_id).unwrap().unwrap().status
    }

    #[test]
    fn test_completion_scenario() {
        // Create project "Launch" with 2 tasks both todo → active.
        let db = test_db();
        let mut project = sample_project("launch", "alice");
        project.name = "Launch".to_string();
        db.upsert_project(&project).unwrap();
        db.upsert_task(&sample_task("t1", "launch")).unwrap();
        db.upsert_task(&sample_task("t2", "launch")).unwrap();
        assert_eq!(status_of(&db, "launch"), "active");

        // Mark task 1 done → still active, no activity.
        set_task_status(&db, &actor(), "t1", "done").unwrap();
        assert_eq!(status_of(&db, "launch"), "active");
        assert_eq!(db.count_activities("launch", "PROJECT-COMPLETED").unwrap(), 0);

        // Mark task 2 done → completed, exactly one activity.
        set_task_status(&db, &actor(), "t2", "done").unwrap();
        assert_eq!(status_of(&db, "launch"), "completed");
        assert_eq!(db.count_activities("launch", "PROJECT-COMPLETED").unwrap(), 1);

        // Reopen task 1 → active again, exactly one reactivation activity.
        set_task_status(&db, &actor(), "t1", "in_progress").unwrap();
        assert_eq!(status_of(&db, "launch"), "active");
        assert_eq!(
            db.count_activities("launch", "PROJECT-REACTIVATED").unwrap(),
            1
        );
    }

    #[test]
    fn test_empty_project_never_completes() {
        let db = test_db();
        db.upsert_project(&sample_project("empty", "alice")).unwrap();

        let transition =
            recompute_project_completion(&db, &actor(), "empty", None).unwrap();
        assert!(transition.is_none());
        assert_eq!(status_of(&db, "empty"), "active");
    }

    #[test]
    fn test_single_activity_per_transition() {
        let db = test_db();
        db.upsert_project(&sample_project("p1", "alice")).unwrap();
        db.upsert_task(&sample_task("t1", "p1")).unwrap();

        // Writes that do not cross the all-done boundary emit nothing.
        set_task_status(&db, &actor(), "t1", "in_progress").unwrap();
        set_task_status(&db, &actor(), "t1", "review").unwrap();
        set_task_status(&db, &actor(), "t1", "blocked").unwrap();
        assert_eq!(db.count_activities("p1", "PROJECT-COMPLETED").unwrap(), 0);
        assert_eq!(db.count_activities("p1", "PROJECT-REACTIVATED").unwrap(), 0);

        // Crossing once emits exactly one, and re-writing done stays quiet.
        set_task_status(&db, &actor(), "t1", "done").unwrap();
        set_task_status(&db, &actor(), "t1", "done").unwrap();
        assert_eq!(db.count_activities("p1", "PROJECT-COMPLETED").unwrap(), 1);
    }

    #[test]
    fn test_completed_alias_counts_as_done() {
        let db = test_db();
        db.upsert_project(&sample_project("p1", "alice")).unwrap();
        db.upsert_task(&sample_task("t1", "p1")).unwrap();

        let task = set_task_status(&db, &actor(), "t1", "completed").unwrap();
        assert_eq!(task.status, "done");
        assert_eq!(status_of(&db, "p1"), "completed");
    }

    #[test]
    fn test_unknown_status_rejected() {
        let db = test_db();
        db.upsert_project(&sample_project("p1", "alice")).unwrap();
        db.upsert_task(&sample_task("t1", "p1")).unwrap();

        let err = set_task_status(&db, &actor(), "t1", "cancelled").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        // The invalid write must not have landed.
        assert_eq!(db.get_task("t1").unwrap().unwrap().status, "todo");
    }

    #[test]
    fn test_missing_task_is_not_found() {
        let db = test_db();
        let err = set_task_status(&db, &actor(), "ghost", "done").unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_archived_project_is_terminal() {
        let db = test_db();
        let mut project = sample_project("p1", "alice");
        project.status = "archived".to_string();
        db.upsert_project(&project).unwrap();
        db.upsert_task(&sample_task("t1", "p1")).unwrap();

        set_task_status(&db, &actor(), "t1", "done").unwrap();
        assert_eq!(status_of(&db, "p1"), "archived");
        assert_eq!(db.count_activities("p1", "PROJECT-COMPLETED").unwrap(), 0);
    }

    #[test]
    fn test_activity_metadata_names_trigger_task() {
        let db = test_db();
        db.upsert_project(&sample_project("p1", "alice")).unwrap();
        db.upsert_task(&sample_task("t1", "p1")).unwrap();

        set_task_status(&db, &actor(), "t1", "done").unwrap();

        let activities = db.get_activities_for_entity("project", "p1").unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].actor_id, "alice");
        let metadata: serde_json::Value =
            serde_json::from_str(activities[0].metadata.as_ref().unwrap()).unwrap();
        assert_eq!(metadata["triggeringTaskId"], "t1");
        assert_eq!(metadata["taskCount"], 1);
    }

    #[test]
    fn test_blocked_task_prevents_completion() {
        let db = test_db();
        db.upsert_project(&sample_project("p1", "alice")).unwrap();
        db.upsert_task(&sample_task("t1", "p1")).unwrap();
        db.upsert_task(&sample_task("t2", "p1")).unwrap();

        set_task_status(&db, &actor(), "t1", "done").unwrap();
        set_task_status(&db, &actor(), "t2", "blocked").unwrap();
        assert_eq!(status_of(&db, "p1"), "active");
    }
}
