//! Task and project lifecycle operations.
//!
//! Creation, deletion, and the cross-project move all re-trigger the
//! completion recompute for every project whose task set changed, inside
//! the same transaction as the structural write.

use uuid::Uuid;

use crate::db::{DbProject, DbTask, LedgerDb};
use crate::error::EngineError;
use crate::services::completion::recompute_project_completion;
use crate::types::{Actor, ProjectStatus, TaskStatus};

/// Input for creating a project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub favourite: bool,
    pub template_tag: Option<String>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub project_id: String,
    pub title: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<String>,
    pub due_date: Option<String>,
}

/// Create a project owned by the acting user.
pub fn create_project(
    db: &LedgerDb,
    actor: &Actor,
    input: NewProject,
) -> Result<DbProject, EngineError> {
    if input.name.trim().is_empty() {
        return Err(EngineError::validation("Project name is required"));
    }

    let now = LedgerDb::now();
    let project = DbProject {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        status: ProjectStatus::Active.as_str().to_string(),
        priority: input.priority.unwrap_or_else(|| "medium".to_string()),
        owner_id: actor.user_id.clone(),
        due_date: input.due_date,
        favourite: input.favourite,
        template_tag: input.template_tag,
        metadata: None,
        created_at: now.clone(),
        updated_at: now,
    };
    db.with_transaction(|db| {
        db.upsert_project(&project)?;
        Ok::<_, EngineError>(())
    })?;
    Ok(project)
}

/// Create a task under a project the actor can access.
///
/// Adding a not-done task to a completed project reactivates it, so the
/// recompute runs in the same transaction as the insert.
pub fn create_task(db: &LedgerDb, actor: &Actor, input: NewTask) -> Result<DbTask, EngineError> {
    if input.title.trim().is_empty() {
        return Err(EngineError::validation("Task title is required"));
    }
    let status = match input.status.as_deref() {
        Some(s) => TaskStatus::parse(s)
            .ok_or_else(|| EngineError::validation(format!("Unknown task status '{s}'")))?,
        None => TaskStatus::Todo,
    };

    db.with_transaction(|db| {
        let project = db
            .get_project(&input.project_id)?
            .ok_or_else(|| EngineError::not_found("Project", input.project_id.clone()))?;
        if !db.user_has_project_access(&project.id, &actor.user_id)? {
            return Err(EngineError::Authorization {
                scope: "target",
                project_id: project.id,
            });
        }

        let now = LedgerDb::now();
        let task = DbTask {
            id: Uuid::new_v4().to_string(),
            project_id: input.project_id.clone(),
            title: input.title.clone(),
            status: status.as_str().to_string(),
            priority: input.priority.clone().unwrap_or_else(|| "medium".to_string()),
            assignee_id: input.assignee_id.clone(),
            due_date: input.due_date.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        db.upsert_task(&task)?;
        recompute_project_completion(db, actor, &input.project_id, Some(&task.id))?;
        Ok(task)
    })
}

/// Delete a task and recompute its former project's completion state.
/// Removing the last not-done task can complete the project.
pub fn delete_task(db: &LedgerDb, actor: &Actor, task_id: &str) -> Result<(), EngineError> {
    db.with_transaction(|db| {
        let task = db
            .get_task(task_id)?
            .ok_or_else(|| EngineError::not_found("Task", task_id))?;
        db.delete_task(task_id)?;
        recompute_project_completion(db, actor, &task.project_id, None)?;
        Ok(())
    })
}

/// Move a task to another project.
///
/// The actor must have access to both the source and the destination
/// project; the two authorization failures are reported distinctly.
/// Completion state is recomputed for both projects: the source may become
/// all-done (or lose its vacuous completeness), the destination may gain a
/// not-done task.
pub fn move_task(
    db: &LedgerDb,
    actor: &Actor,
    task_id: &str,
    dest_project_id: &str,
) -> Result<DbTask, EngineError> {
    db.with_transaction(|db| {
        let task = db
            .get_task(task_id)?
            .ok_or_else(|| EngineError::not_found("Task", task_id))?;

        let source_id = task.project_id.clone();
        db.get_project(&source_id)?
            .ok_or_else(|| EngineError::not_found("Project", source_id.clone()))?;
        db.get_project(dest_project_id)?
            .ok_or_else(|| EngineError::not_found("Project", dest_project_id))?;

        if !db.user_has_project_access(&source_id, &actor.user_id)? {
            return Err(EngineError::Authorization {
                scope: "source",
                project_id: source_id,
            });
        }
        if !db.user_has_project_access(dest_project_id, &actor.user_id)? {
            return Err(EngineError::Authorization {
                scope: "destination",
                project_id: dest_project_id.to_string(),
            });
        }

        if source_id == dest_project_id {
            // No-op move: nothing to reparent, nothing to recompute.
            return Ok(task);
        }

        db.set_task_project(task_id, dest_project_id)?;
        recompute_project_completion(db, actor, &source_id, Some(task_id))?;
        recompute_project_completion(db, actor, dest_project_id, Some(task_id))?;

        let moved = db
            .get_task(task_id)?
            .ok_or_else(|| EngineError::not_found("Task", task_id))?;
        Ok(moved)
    })
}
