//! Engine error taxonomy.
//!
//! Errors are classified by what the caller can do about them:
//! - Validation: fix the request and resend
//! - NotFound / Authorization / Conflict: business-rule rejections
//! - Db: storage failure — the enclosing transaction has been rolled back
//!
//! Business-rule violations are always returned as values, never panicked;
//! only genuine storage failures surface through the `Db` variant.

use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("No access to {scope} project {project_id}")]
    Authorization {
        scope: &'static str,
        project_id: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        EngineError::Conflict(msg.into())
    }

    /// True for errors the caller caused (bad input, missing entity, no
    /// access, invariant violation) as opposed to storage failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, EngineError::Db(_))
    }

    /// HTTP-equivalent status for host handlers mapping engine results to
    /// responses. The engine itself never builds HTTP responses.
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::Validation(_) => 400,
            EngineError::Authorization { .. } => 403,
            EngineError::NotFound { .. } => 404,
            EngineError::Conflict(_) => 409,
            EngineError::Db(_) => 500,
        }
    }
}
