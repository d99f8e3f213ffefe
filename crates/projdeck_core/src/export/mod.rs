//! Project summary export pipeline.
//!
//! # Responsibility
//! - Compose a markdown digest from a resolved project.
//! - Publish it as a private gist and keep local markdown + PDF copies.
//!
//! # Invariants
//! - Stages run in order: resolve, render, publish, verify echo, persist
//!   markdown, then dispatch the PDF render.
//! - Failures before the PDF stage surface as one `ExternalService` error
//!   (or `NotFound` for an unknown project).
//! - The PDF stage is detached and can never fail the export.

pub mod gist;
pub mod markdown;
pub mod pdf;

use crate::model::project::ProjectId;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::todo_repo::TodoRepository;
use crate::service::project_service::ProjectService;
use crate::service::{ServiceError, ServiceResult};
use gist::{GistError, GistPublisher};
use log::{error, info};
use markdown::{local_file_stem, render_markdown_summary};
use pdf::{spawn_pdf_render, PdfRenderHandle, PdfRenderer};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_GIST_ENDPOINT: &str = "https://api.github.com/gists";
pub const DEFAULT_EXPORT_DIR: &str = "gists";
pub const DEFAULT_PDF_COMMAND: &str = "pandoc";

const EXPORT_FAILURE_MESSAGE: &str = "Error exporting project summary to Gist";

/// Export settings injected at pipeline construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub gist_endpoint: String,
    /// Paste service credential. Exports fail while unset.
    pub api_token: Option<String>,
    /// Shared output directory for local artifacts.
    pub output_dir: PathBuf,
    /// External program used by `CommandPdfRenderer`.
    pub pdf_command: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            gist_endpoint: DEFAULT_GIST_ENDPOINT.to_string(),
            api_token: None,
            output_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            pdf_command: DEFAULT_PDF_COMMAND.to_string(),
        }
    }
}

/// Successful export result.
pub struct ExportReceipt {
    pub gist_url: String,
    pub markdown_path: PathBuf,
    pub pdf_path: PathBuf,
    /// Detached PDF render; drop it to ignore the outcome.
    pub pdf_render: PdfRenderHandle,
}

/// Stage sequence turning a project into a published digest.
pub struct ExportPipeline<G: GistPublisher> {
    config: ExportConfig,
    publisher: G,
    renderer: Arc<dyn PdfRenderer>,
}

impl<G: GistPublisher> ExportPipeline<G> {
    pub fn new(config: ExportConfig, publisher: G, renderer: Arc<dyn PdfRenderer>) -> Self {
        Self {
            config,
            publisher,
            renderer,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn publisher(&self) -> &G {
        &self.publisher
    }

    /// Exports one project's summary and returns the gist URL.
    pub fn export_project_summary<P, T>(
        &self,
        service: &ProjectService<P, T>,
        project_id: ProjectId,
    ) -> ServiceResult<ExportReceipt>
    where
        P: ProjectRepository,
        T: TodoRepository,
    {
        let aggregate = service
            .get_project_by_id(project_id)
            .map_err(|err| match err {
                ServiceError::NotFound { .. } => err,
                other => export_failure(project_id, "resolve", other),
            })?;

        let markdown = render_markdown_summary(&aggregate);
        let file_name = format!("{}.md", aggregate.project.title);

        let response = self
            .publisher
            .create_secret_gist(&file_name, &markdown)
            .map_err(|err| export_failure(project_id, "publish", err))?;

        let echoed = response
            .file_content(&file_name)
            .ok_or_else(|| {
                export_failure(project_id, "verify", GistError::MissingFile(file_name.clone()))
            })?
            .to_string();

        let stem = local_file_stem(&aggregate.project.title);
        let markdown_path = self.config.output_dir.join(format!("{stem}.md"));
        let pdf_path = self.config.output_dir.join(format!("{stem}.md.pdf"));

        std::fs::create_dir_all(&self.config.output_dir)
            .and_then(|()| std::fs::write(&markdown_path, echoed.as_bytes()))
            .map_err(|err| export_failure(project_id, "persist", err))?;

        let pdf_render = spawn_pdf_render(
            Arc::clone(&self.renderer),
            echoed,
            markdown_path.clone(),
            pdf_path.clone(),
        );

        info!(
            "event=project_export module=export status=ok project_id={project_id} todos={}",
            aggregate.todos.len()
        );
        Ok(ExportReceipt {
            gist_url: response.html_url,
            markdown_path,
            pdf_path,
            pdf_render,
        })
    }
}

fn export_failure(
    project_id: ProjectId,
    stage: &'static str,
    cause: impl std::error::Error + Send + Sync + 'static,
) -> ServiceError {
    error!(
        "event=project_export module=export status=error project_id={project_id} stage={stage} error={cause}"
    );
    ServiceError::external(EXPORT_FAILURE_MESSAGE, cause)
}
