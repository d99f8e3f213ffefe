//! Project aggregate root.
//!
//! # Invariants
//! - `uuid`, `owner` and `created_at` are fixed at creation.
//! - `todos` holds references only; todo bodies live in their own table.
//! - `title` is never blank.

use super::todo::{Todo, TodoId};
use super::{now_epoch_ms, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Canonical project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "id")]
    pub uuid: ProjectId,
    pub title: String,
    /// Verified caller identity that created the project.
    pub owner: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub is_deleted: bool,
    /// Todo references in append order.
    pub todos: Vec<TodoId>,
}

impl Project {
    /// Creates an active project with a generated id and no todos.
    pub fn new(title: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            owner: owner.into(),
            created_at: now_epoch_ms(),
            is_deleted: false,
            todos: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.uuid.is_nil() {
            return Err(ModelValidationError::NilUuid);
        }
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::EmptyTitle);
        }
        if self.owner.trim().is_empty() {
            return Err(ModelValidationError::EmptyOwner);
        }
        Ok(())
    }

    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// A project with its todo references resolved into records.
///
/// `todos` holds only active todos, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectAggregate {
    pub project: Project,
    pub todos: Vec<Todo>,
}

impl ProjectAggregate {
    /// Number of resolved todos marked completed.
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|todo| todo.status).count()
    }

    /// Wire shape: the project's fields with `todos` holding the resolved
    /// records instead of bare ids.
    pub fn json_view(&self) -> serde_json::Value {
        let mut view = serde_json::to_value(&self.project).unwrap_or(serde_json::Value::Null);
        if let serde_json::Value::Object(fields) = &mut view {
            let todos = serde_json::to_value(&self.todos).unwrap_or_default();
            fields.insert("todos".to_string(), todos);
        }
        view
    }
}
