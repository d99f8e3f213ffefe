//! Todo repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist todo documents and their content/status mutations.
//! - Resolve a project's todo references into records.
//!
//! # Invariants
//! - `project_uuid` is written once and never updated.
//! - Listings resolve through the project's reference list, so a todo whose
//!   reference append never landed is not listed.

use super::{bool_to_int, parse_flag_column, parse_uuid_column, EntityKind, RepoError, RepoResult};
use crate::model::project::ProjectId;
use crate::model::todo::{Todo, TodoId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TODO_SELECT_SQL: &str = "SELECT
    t.uuid AS uuid,
    t.project_uuid AS project_uuid,
    t.name AS name,
    t.description AS description,
    t.status AS status,
    t.created_at AS created_at,
    t.updated_at AS updated_at,
    t.is_deleted AS is_deleted
FROM todos t";

/// Per-project listing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoListQuery {
    pub project: ProjectId,
    /// `false` lists active todos, `true` lists the soft-deleted set.
    pub deleted: bool,
}

/// Repository interface for todo documents.
pub trait TodoRepository {
    fn create_todo(&self, todo: &Todo) -> RepoResult<TodoId>;

    /// Loads one todo by id, including soft-deleted rows.
    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>>;

    /// Writes mutable fields (`name`, `description`, `status`, `updated_at`,
    /// `is_deleted`) of an existing todo.
    fn update_todo(&self, todo: &Todo) -> RepoResult<()>;

    /// Flags a todo as deleted. Returns `false` when no row matched.
    fn soft_delete_todo(&self, id: TodoId) -> RepoResult<bool>;

    /// Lists a project's referenced todos, newest first.
    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<Vec<Todo>>;

    /// Like `get_todo`, but absence is a `NotFound` error.
    fn find_todo(&self, id: TodoId) -> RepoResult<Todo> {
        self.get_todo(id)?.ok_or(RepoError::NotFound {
            entity: EntityKind::Todo,
            id,
        })
    }
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&self, todo: &Todo) -> RepoResult<TodoId> {
        todo.validate()?;

        self.conn.execute(
            "INSERT INTO todos (
                uuid,
                project_uuid,
                name,
                description,
                status,
                created_at,
                updated_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                todo.uuid.to_string(),
                todo.project.to_string(),
                todo.name.as_str(),
                todo.description.as_str(),
                bool_to_int(todo.status),
                todo.created_at,
                todo.updated_at,
                bool_to_int(todo.is_deleted),
            ],
        )?;

        Ok(todo.uuid)
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        self.conn
            .query_row(
                &format!("{TODO_SELECT_SQL} WHERE t.uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_todo_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn update_todo(&self, todo: &Todo) -> RepoResult<()> {
        todo.validate()?;

        let changed = self.conn.execute(
            "UPDATE todos
             SET
                name = ?1,
                description = ?2,
                status = ?3,
                updated_at = ?4,
                is_deleted = ?5
             WHERE uuid = ?6;",
            params![
                todo.name.as_str(),
                todo.description.as_str(),
                bool_to_int(todo.status),
                todo.updated_at,
                bool_to_int(todo.is_deleted),
                todo.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Todo,
                id: todo.uuid,
            });
        }
        Ok(())
    }

    fn soft_delete_todo(&self, id: TodoId) -> RepoResult<bool> {
        let mut todo = match self.get_todo(id)? {
            Some(todo) => todo,
            None => return Ok(false),
        };
        if todo.is_deleted {
            return Ok(true);
        }
        todo.soft_delete();
        self.update_todo(&todo)?;
        Ok(true)
    }

    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<Vec<Todo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TODO_SELECT_SQL}
             JOIN project_todos pt ON pt.todo_uuid = t.uuid
             WHERE pt.project_uuid = ?1
               AND t.is_deleted = ?2
             ORDER BY t.created_at DESC, pt.position DESC;"
        ))?;
        let mut rows = stmt.query(params![
            query.project.to_string(),
            bool_to_int(query.deleted)
        ])?;

        let mut todos = Vec::new();
        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }
        Ok(todos)
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let todo = Todo {
        uuid: parse_uuid_column(row, "uuid")?,
        project: parse_uuid_column(row, "project_uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: parse_flag_column(row, "status")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        is_deleted: parse_flag_column(row, "is_deleted")?,
    };
    todo.validate()?;
    Ok(todo)
}
