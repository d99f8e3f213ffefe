//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into project/todo use cases.
//! - Translate storage outcomes into the service error taxonomy.
//!
//! # Invariants
//! - Repository `NotFound` reaches callers unchanged.
//! - Any other storage failure is collapsed into `Internal` with a message;
//!   only its message travels upward.

pub mod project_service;

use crate::repo::{EntityKind, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Boxed cause carried by external-service failures.
pub type BoxedCause = Box<dyn Error + Send + Sync + 'static>;

/// Error taxonomy shared by the aggregate service and export pipeline.
#[derive(Debug)]
pub enum ServiceError {
    /// Entity id does not resolve.
    NotFound { entity: EntityKind, id: Uuid },
    /// Input rejected by entity validation.
    Validation(String),
    /// Paste API, local artifact or renderer failure.
    ExternalService {
        message: String,
        source: Option<BoxedCause>,
    },
    /// Storage failure or partial multi-document write.
    Internal { message: String },
}

impl ServiceError {
    pub fn external(message: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        Self::ExternalService {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for logs and boundary envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation_error",
            Self::ExternalService { .. } => "external_service_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                entity: EntityKind::Project,
                ..
            } => write!(f, "Project not found"),
            Self::NotFound {
                entity: EntityKind::Todo,
                id,
            } => write!(f, "Todo with ID {id} not found"),
            Self::Validation(message) => write!(f, "{message}"),
            Self::ExternalService { message, .. } => write!(f, "{message}"),
            Self::Internal { message } => write!(f, "{message}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ExternalService {
                source: Some(cause),
                ..
            } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Maps a repository error, keeping `NotFound`/`Validation` and collapsing
    /// everything else into `Internal` prefixed by `context`.
    pub(crate) fn from_repo(context: &str, err: RepoError) -> Self {
        match err {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::Validation(err.to_string()),
            other => {
                log::error!(
                    "event=repo_failure module=service status=error context=\"{context}\" error={other}"
                );
                Self::internal(format!("Error {context}: {other}"))
            }
        }
    }
}
