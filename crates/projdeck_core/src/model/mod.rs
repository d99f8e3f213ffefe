//! Domain model for the project/todo aggregate.
//!
//! # Responsibility
//! - Define canonical `Project` and `Todo` records used by core logic.
//! - Provide validation and soft-delete lifecycle helpers.
//!
//! # Invariants
//! - Every entity is identified by a stable, non-nil UUID.
//! - Deletion is represented by the `is_deleted` flag, never by removal.
//! - A todo belongs to exactly one project for its whole lifetime.

pub mod project;
pub mod todo;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Validation errors raised before any entity is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    NilUuid,
    EmptyTitle,
    EmptyOwner,
    EmptyName,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "entity id must not be nil"),
            Self::EmptyTitle => write!(f, "project title must not be blank"),
            Self::EmptyOwner => write!(f, "project owner must not be blank"),
            Self::EmptyName => write!(f, "todo name must not be blank"),
        }
    }
}

impl Error for ModelValidationError {}

/// Current wall-clock time as Unix epoch milliseconds.
///
/// Falls back to `0` when the system clock is set before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
