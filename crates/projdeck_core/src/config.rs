//! Process configuration sourced from environment variables.
//!
//! # Responsibility
//! - Collect every tunable the core consumes into one explicit struct.
//! - Keep environment access at the edge; everything below receives values.
//!
//! # Invariants
//! - Blank values are treated as unset.
//! - Secrets are never included in `Debug` output.

use crate::export::{ExportConfig, DEFAULT_EXPORT_DIR, DEFAULT_GIST_ENDPOINT, DEFAULT_PDF_COMMAND};
use crate::logging::default_log_level;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "PROJDECK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "PROJDECK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PROJDECK_LOG_DIR";
pub const ENV_GIST_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_SIGNING_SECRET: &str = "JWT_SECRET";
pub const ENV_GIST_ENDPOINT: &str = "PROJDECK_GIST_ENDPOINT";
pub const ENV_EXPORT_DIR: &str = "PROJDECK_EXPORT_DIR";
pub const ENV_PDF_COMMAND: &str = "PROJDECK_PDF_COMMAND";

const DEFAULT_DB_FILE_NAME: &str = "projdeck.sqlite3";

/// Complete runtime configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub log_dir: Option<String>,
    /// Consumed only by the identity gate.
    pub signing_secret: Option<String>,
    pub export: ExportConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME)),
            log_level: read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(ENV_LOG_DIR),
            signing_secret: read(ENV_SIGNING_SECRET),
            export: ExportConfig {
                gist_endpoint: read(ENV_GIST_ENDPOINT)
                    .unwrap_or_else(|| DEFAULT_GIST_ENDPOINT.to_string()),
                api_token: read(ENV_GIST_TOKEN),
                output_dir: PathBuf::from(
                    read(ENV_EXPORT_DIR).unwrap_or_else(|| DEFAULT_EXPORT_DIR.to_string()),
                ),
                pdf_command: read(ENV_PDF_COMMAND)
                    .unwrap_or_else(|| DEFAULT_PDF_COMMAND.to_string()),
            },
        }
    }
}

impl Debug for AppConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("db_path", &self.db_path)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .field("signing_secret", &redacted(&self.signing_secret))
            .field("gist_endpoint", &self.export.gist_endpoint)
            .field("api_token", &redacted(&self.export.api_token))
            .field("output_dir", &self.export.output_dir)
            .field("pdf_command", &self.export.pdf_command)
            .finish()
    }
}

fn redacted(value: &Option<String>) -> &'static str {
    match value {
        Some(_) => "<set>",
        None => "<unset>",
    }
}
