//! Project repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist project documents and their ordered todo reference list.
//! - Serve owner-scoped listings split by soft-delete state.
//!
//! # Invariants
//! - `get_project` returns soft-deleted rows; only listings filter them.
//! - Listings are ordered `created_at DESC`, newest insert first on ties.
//! - A todo reference is appended at most once across all projects.

use super::{bool_to_int, parse_flag_column, parse_uuid_column, EntityKind, RepoError, RepoResult};
use crate::model::project::{Project, ProjectId};
use crate::model::todo::TodoId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    owner,
    created_at,
    is_deleted
FROM projects";

/// Owner-scoped listing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectListQuery {
    pub owner: String,
    /// `false` lists active projects, `true` lists the soft-deleted set.
    pub deleted: bool,
}

impl ProjectListQuery {
    pub fn active(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            deleted: false,
        }
    }

    pub fn deleted(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            deleted: true,
        }
    }
}

/// Repository interface for project documents.
pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;

    /// Loads one project by id, including soft-deleted rows.
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;

    /// Replaces the title and returns the refreshed project.
    fn update_title(&self, id: ProjectId, title: &str) -> RepoResult<Project>;

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>>;

    /// Flags a project as deleted. Returns `false` when no row matched.
    fn soft_delete_project(&self, id: ProjectId) -> RepoResult<bool>;

    /// Appends one todo reference to the end of the project's list.
    fn append_todo(&self, project_id: ProjectId, todo_id: TodoId) -> RepoResult<()>;

    /// Todo references in append order.
    fn list_todo_refs(&self, project_id: ProjectId) -> RepoResult<Vec<TodoId>>;

    /// Like `get_project`, but absence is a `NotFound` error.
    fn find_project(&self, id: ProjectId) -> RepoResult<Project> {
        self.get_project(id)?.ok_or(RepoError::NotFound {
            entity: EntityKind::Project,
            id,
        })
    }
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn hydrate(&self, mut project: Project) -> RepoResult<Project> {
        project.todos = self.list_todo_refs(project.uuid)?;
        Ok(project)
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        project.validate()?;

        self.conn.execute(
            "INSERT INTO projects (uuid, title, owner, created_at, is_deleted)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                project.uuid.to_string(),
                project.title.as_str(),
                project.owner.as_str(),
                project.created_at,
                bool_to_int(project.is_deleted),
            ],
        )?;

        Ok(project.uuid)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_project_row(row)),
            )
            .optional()?
            .transpose()?;

        project.map(|project| self.hydrate(project)).transpose()
    }

    fn update_title(&self, id: ProjectId, title: &str) -> RepoResult<Project> {
        let mut project = self.find_project(id)?;
        project.title = title.to_string();
        project.validate()?;

        self.conn.execute(
            "UPDATE projects SET title = ?1 WHERE uuid = ?2;",
            params![project.title.as_str(), id.to_string()],
        )?;

        Ok(project)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE owner = ?1
               AND is_deleted = ?2
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query(params![query.owner.as_str(), bool_to_int(query.deleted)])?;

        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        drop(rows);

        projects
            .into_iter()
            .map(|project| self.hydrate(project))
            .collect()
    }

    fn soft_delete_project(&self, id: ProjectId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE projects SET is_deleted = 1 WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn append_todo(&self, project_id: ProjectId, todo_id: TodoId) -> RepoResult<()> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE uuid = ?1);",
            [project_id.to_string()],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(RepoError::NotFound {
                entity: EntityKind::Project,
                id: project_id,
            });
        }

        self.conn.execute(
            "INSERT INTO project_todos (project_uuid, todo_uuid, position)
             SELECT ?1, ?2, COALESCE(MAX(position) + 1, 0)
             FROM project_todos
             WHERE project_uuid = ?1;",
            params![project_id.to_string(), todo_id.to_string()],
        )?;
        Ok(())
    }

    fn list_todo_refs(&self, project_id: ProjectId) -> RepoResult<Vec<TodoId>> {
        let mut stmt = self.conn.prepare(
            "SELECT todo_uuid
             FROM project_todos
             WHERE project_uuid = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut refs = Vec::new();
        while let Some(row) = rows.next()? {
            refs.push(parse_uuid_column(row, "todo_uuid")?);
        }
        Ok(refs)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let project = Project {
        uuid: parse_uuid_column(row, "uuid")?,
        title: row.get("title")?,
        owner: row.get("owner")?,
        created_at: row.get("created_at")?,
        is_deleted: parse_flag_column(row, "is_deleted")?,
        todos: Vec::new(),
    };
    project.validate()?;
    Ok(project)
}
