//! Core domain logic for projdeck.
//! This crate owns the project/todo aggregate and the export pipeline.

pub mod config;
pub mod db;
pub mod export;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::AppConfig;
pub use export::gist::{GistError, GistPublisher, GistResponse, HttpGistPublisher};
pub use export::pdf::{CommandPdfRenderer, PdfRenderHandle, PdfRenderer, RenderError};
pub use export::{ExportConfig, ExportPipeline, ExportReceipt};
pub use identity::{CallerIdentity, IdentityError, IdentityGate, SharedSecretGate};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::project::{Project, ProjectAggregate, ProjectId};
pub use model::todo::{Todo, TodoId, TodoPatch};
pub use model::ModelValidationError;
pub use repo::project_repo::{ProjectListQuery, ProjectRepository, SqliteProjectRepository};
pub use repo::todo_repo::{SqliteTodoRepository, TodoListQuery, TodoRepository};
pub use repo::{EntityKind, RepoError, RepoResult};
pub use service::project_service::ProjectService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
