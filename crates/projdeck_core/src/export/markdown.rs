//! Markdown digest synthesis for project exports.
//!
//! # Invariants
//! - Output is a pure function of the aggregate (title + resolved todo order).
//! - The summary line always reads `<completed>/<total> todos completed`.

use crate::model::project::ProjectAggregate;
use crate::model::todo::Todo;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

static UNSAFE_FILE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("valid file name regex"));

const FALLBACK_FILE_STEM: &str = "untitled";

/// Renders the export digest for one project.
pub fn render_markdown_summary(aggregate: &ProjectAggregate) -> String {
    let total = aggregate.todos.len();
    let completed = aggregate.completed_count();

    let mut out = String::new();
    let _ = writeln!(out, "# {}", aggregate.project.title);
    out.push('\n');
    let _ = writeln!(out, "Summary: {completed}/{total} todos completed");
    out.push('\n');

    out.push_str("## Pending\n");
    for todo in aggregate.todos.iter().filter(|todo| !todo.status) {
        push_item(&mut out, ' ', todo);
    }

    out.push_str("\n## Completed\n");
    for todo in aggregate.todos.iter().filter(|todo| todo.status) {
        push_item(&mut out, 'x', todo);
    }
    out
}

fn push_item(out: &mut String, mark: char, todo: &Todo) {
    let description = todo.description.trim();
    if description.is_empty() {
        let _ = writeln!(out, "- [{mark}] {}", todo.name);
    } else {
        let _ = writeln!(out, "- [{mark}] {}: {description}", todo.name);
    }
}

/// Derives a local file stem from a project title.
///
/// Path separators, reserved characters and control characters become `_`.
pub fn local_file_stem(title: &str) -> String {
    let replaced = UNSAFE_FILE_CHARS_RE.replace_all(title.trim(), "_");
    match replaced.as_ref() {
        "" | "." | ".." => FALLBACK_FILE_STEM.to_string(),
        stem => stem.to_string(),
    }
}
