//! Todo entity owned by exactly one project.
//!
//! # Invariants
//! - `project` never changes after creation.
//! - `updated_at` is refreshed on every field mutation and never moves backward.

use super::project::ProjectId;
use super::{now_epoch_ms, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable todo identifier.
pub type TodoId = Uuid;

/// Canonical todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(rename = "id")]
    pub uuid: TodoId,
    pub name: String,
    pub description: String,
    /// `false` = pending, `true` = completed.
    pub status: bool,
    pub project: ProjectId,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_deleted: bool,
}

/// Partial update for todo content. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TodoPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

impl Todo {
    /// Creates a pending todo attached to `project`.
    pub fn new(
        project: ProjectId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            status: false,
            project,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.uuid.is_nil() || self.project.is_nil() {
            return Err(ModelValidationError::NilUuid);
        }
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::EmptyName);
        }
        Ok(())
    }

    pub fn set_status(&mut self, status: bool) {
        self.status = status;
        self.touch();
    }

    /// Applies only the provided fields of `patch`.
    pub fn apply_patch(&mut self, patch: &TodoPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        self.touch();
    }

    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at);
    }
}
