//! Detached PDF rendering of exported markdown.
//!
//! # Responsibility
//! - Render a markdown artifact to PDF through an external renderer.
//! - Run rendering off the caller's path and report failures through logs.
//!
//! # Invariants
//! - A render failure never changes an export result already returned.
//! - Dropping a `PdfRenderHandle` detaches the render; it keeps running.

use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const RENDER_THREAD_NAME: &str = "projdeck-pdf-render";
const MAX_STDERR_CHARS: usize = 240;

/// PDF render failures.
#[derive(Debug)]
pub enum RenderError {
    /// Renderer process or worker thread could not be started.
    Spawn(io::Error),
    /// Renderer ran and reported failure.
    Failed { code: Option<i32>, stderr: String },
    /// Renderer panicked inside the worker thread.
    Panicked,
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to start pdf renderer: {err}"),
            Self::Failed { code, stderr } => match code {
                Some(code) => write!(f, "pdf renderer exited with code {code}: {stderr}"),
                None => write!(f, "pdf renderer terminated by signal: {stderr}"),
            },
            Self::Panicked => write!(f, "pdf renderer panicked"),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// Converts a persisted markdown file into a PDF file.
pub trait PdfRenderer: Send + Sync {
    /// `markdown` is the content already written at `markdown_path`.
    fn render(&self, markdown: &str, markdown_path: &Path, pdf_path: &Path)
        -> Result<(), RenderError>;
}

/// Renderer that shells out to an external program invoked as
/// `<program> <markdown_path> -o <pdf_path>` (pandoc-compatible).
pub struct CommandPdfRenderer {
    program: String,
}

impl CommandPdfRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PdfRenderer for CommandPdfRenderer {
    fn render(
        &self,
        _markdown: &str,
        markdown_path: &Path,
        pdf_path: &Path,
    ) -> Result<(), RenderError> {
        let output = Command::new(&self.program)
            .arg(markdown_path)
            .arg("-o")
            .arg(pdf_path)
            .output()
            .map_err(RenderError::Spawn)?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(RenderError::Failed {
            code: output.status.code(),
            stderr: stderr.trim().chars().take(MAX_STDERR_CHARS).collect(),
        })
    }
}

/// Handle to a detached render.
pub struct PdfRenderHandle {
    state: RenderState,
}

enum RenderState {
    Running(JoinHandle<Result<(), RenderError>>),
    Finished(Result<(), RenderError>),
}

impl PdfRenderHandle {
    /// Blocks until the render finishes. Only tooling and tests need this.
    pub fn wait(self) -> Result<(), RenderError> {
        match self.state {
            RenderState::Running(handle) => handle.join().unwrap_or(Err(RenderError::Panicked)),
            RenderState::Finished(result) => result,
        }
    }
}

/// Starts rendering `markdown_path` into `pdf_path` on a detached thread.
///
/// Failures are logged at `warn`; the returned handle may be dropped.
pub fn spawn_pdf_render(
    renderer: Arc<dyn PdfRenderer>,
    markdown: String,
    markdown_path: PathBuf,
    pdf_path: PathBuf,
) -> PdfRenderHandle {
    let spawned = thread::Builder::new()
        .name(RENDER_THREAD_NAME.to_string())
        .spawn(move || {
            let result = renderer.render(&markdown, &markdown_path, &pdf_path);
            match &result {
                Ok(()) => info!(
                    "event=pdf_render module=export status=ok path={}",
                    pdf_path.display()
                ),
                Err(err) => warn!(
                    "event=pdf_render module=export status=error path={} error={err}",
                    pdf_path.display()
                ),
            }
            result
        });

    let state = match spawned {
        Ok(handle) => RenderState::Running(handle),
        Err(err) => {
            warn!("event=pdf_render module=export status=error reason=thread_spawn error={err}");
            RenderState::Finished(Err(RenderError::Spawn(err)))
        }
    };
    PdfRenderHandle { state }
}
