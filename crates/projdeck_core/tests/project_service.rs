use projdeck_core::db::open_db_in_memory;
use projdeck_core::{
    CallerIdentity, EntityKind, Project, ProjectId, ProjectListQuery, ProjectRepository,
    ProjectService, RepoError, RepoResult, ServiceError, SqliteProjectRepository,
    SqliteTodoRepository, Todo, TodoId, TodoListQuery, TodoPatch, TodoRepository,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

type SqliteService<'c> = ProjectService<SqliteProjectRepository<'c>, SqliteTodoRepository<'c>>;

fn service(conn: &Connection) -> SqliteService<'_> {
    ProjectService::new(
        SqliteProjectRepository::new(conn),
        SqliteTodoRepository::new(conn),
    )
}

fn caller(id: &str) -> CallerIdentity {
    CallerIdentity::new(id).unwrap()
}

#[test]
fn created_project_is_active_empty_and_owned_by_caller() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let project = service.create_project(&caller("u1"), "Sprint1").unwrap();

    assert!(!project.is_deleted);
    assert!(project.todos.is_empty());
    assert_eq!(project.owner, "u1");
}

#[test]
fn blank_title_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.create_project(&caller("u1"), " ").unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn sprint_scenario_reflects_todo_status() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let project = service.create_project(&caller("u1"), "Sprint1").unwrap();
    let todo = service
        .add_todo_to_project(project.uuid, "Write plan", "...")
        .unwrap();
    assert_eq!(todo.project, project.uuid);

    service.update_todo_status(todo.uuid, true).unwrap();

    let aggregate = service.get_project_by_id(project.uuid).unwrap();
    assert_eq!(aggregate.project.todos, vec![todo.uuid]);
    assert_eq!(aggregate.todos.len(), 1);
    assert!(aggregate.todos[0].status);
}

#[test]
fn soft_deleted_project_moves_from_active_to_deleted_listing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = caller("u1");

    let keep = service.create_project(&owner, "keep").unwrap();
    let drop_me = service.create_project(&owner, "drop").unwrap();

    let remaining = service.delete_project(&owner, drop_me.uuid).unwrap();
    let remaining_ids: Vec<_> = remaining.iter().map(|a| a.project.uuid).collect();
    assert_eq!(remaining_ids, vec![keep.uuid]);

    let deleted = service.list_deleted_projects(&owner).unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].project.uuid, drop_me.uuid);

    let still_fetchable = service.get_project_by_id(drop_me.uuid).unwrap();
    assert!(still_fetchable.project.is_deleted);
}

#[test]
fn deleting_unknown_project_returns_current_active_list() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = caller("u1");
    let project = service.create_project(&owner, "Sprint1").unwrap();

    let listed = service.delete_project(&owner, Uuid::new_v4()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].project.uuid, project.uuid);
}

#[test]
fn deleting_twice_changes_nothing_after_first_call() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = caller("u1");
    let project = service.create_project(&owner, "Sprint1").unwrap();
    let todo = service.add_todo_to_project(project.uuid, "t", "").unwrap();

    service.delete_project(&owner, project.uuid).unwrap();
    service.delete_project(&owner, project.uuid).unwrap();
    service.delete_todo(todo.uuid).unwrap();
    service.delete_todo(todo.uuid).unwrap();
    service.delete_todo(Uuid::new_v4()).unwrap();

    assert_eq!(service.list_deleted_projects(&owner).unwrap().len(), 1);
    assert_eq!(service.list_deleted_todos(project.uuid).unwrap().len(), 1);
}

#[test]
fn project_delete_does_not_cascade_to_todos() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = caller("u1");
    let project = service.create_project(&owner, "Sprint1").unwrap();
    let todo = service.add_todo_to_project(project.uuid, "t", "").unwrap();

    service.delete_project(&owner, project.uuid).unwrap();

    let aggregate = service.get_project_by_id(project.uuid).unwrap();
    assert_eq!(aggregate.todos.len(), 1);
    assert_eq!(aggregate.todos[0].uuid, todo.uuid);
    assert!(!aggregate.todos[0].is_deleted);
}

#[test]
fn listings_are_owner_scoped_and_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let first = service.create_project(&caller("u1"), "first").unwrap();
    let second = service.create_project(&caller("u1"), "second").unwrap();
    service.create_project(&caller("u2"), "foreign").unwrap();
    conn.execute(
        "UPDATE projects SET created_at = created_at + 10000 WHERE uuid = ?1;",
        params![first.uuid.to_string()],
    )
    .unwrap();

    let listed = service.list_projects(&caller("u1")).unwrap();
    let ids: Vec<_> = listed.iter().map(|a| a.project.uuid).collect();
    assert_eq!(ids, vec![first.uuid, second.uuid]);
}

#[test]
fn resolved_todos_skip_deleted_and_are_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project = service.create_project(&caller("u1"), "Sprint1").unwrap();

    let older = service.add_todo_to_project(project.uuid, "older", "").unwrap();
    let newer = service.add_todo_to_project(project.uuid, "newer", "").unwrap();
    let gone = service.add_todo_to_project(project.uuid, "gone", "").unwrap();
    conn.execute(
        "UPDATE todos SET created_at = 1000 WHERE uuid = ?1;",
        params![older.uuid.to_string()],
    )
    .unwrap();
    service.delete_todo(gone.uuid).unwrap();

    let aggregate = service.get_project_by_id(project.uuid).unwrap();
    let ids: Vec<_> = aggregate.todos.iter().map(|todo| todo.uuid).collect();
    assert_eq!(ids, vec![newer.uuid, older.uuid]);
    assert_eq!(aggregate.project.todos.len(), 3);
}

#[test]
fn unknown_ids_surface_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.get_project_by_id(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: EntityKind::Project, .. }));

    let err = service.update_project(Uuid::new_v4(), "x").unwrap_err();
    assert!(err.is_not_found());

    let err = service
        .add_todo_to_project(Uuid::new_v4(), "x", "")
        .unwrap_err();
    assert!(err.is_not_found());

    let err = service.update_todo_status(Uuid::new_v4(), true).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: EntityKind::Todo, .. }));

    let err = service
        .update_todo(Uuid::new_v4(), &TodoPatch::default())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn todo_can_be_added_to_soft_deleted_project() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = caller("u1");
    let project = service.create_project(&owner, "Sprint1").unwrap();
    service.delete_project(&owner, project.uuid).unwrap();

    let todo = service.add_todo_to_project(project.uuid, "late", "").unwrap();
    let aggregate = service.get_project_by_id(project.uuid).unwrap();
    assert_eq!(aggregate.project.todos, vec![todo.uuid]);
}

#[test]
fn partial_todo_update_keeps_untouched_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project = service.create_project(&caller("u1"), "Sprint1").unwrap();
    let todo = service
        .add_todo_to_project(project.uuid, "name", "description")
        .unwrap();

    let updated = service
        .update_todo(
            todo.uuid,
            &TodoPatch {
                name: None,
                description: Some("rewritten".to_string()),
            },
        )
        .unwrap();
    assert_eq!(updated.name, "name");
    assert_eq!(updated.description, "rewritten");
    assert!(updated.updated_at >= todo.updated_at);

    let err = service
        .update_todo(
            todo.uuid,
            &TodoPatch {
                name: Some(" ".to_string()),
                description: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn update_project_replaces_title() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project = service.create_project(&caller("u1"), "Old").unwrap();

    let updated = service.update_project(project.uuid, "New").unwrap();
    assert_eq!(updated.title, "New");
    assert_eq!(updated.owner, "u1");
    assert_eq!(updated.created_at, project.created_at);
}

#[test]
fn todo_mutations_refresh_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let project = service.create_project(&caller("u1"), "P").unwrap();
    let todo = service.add_todo_to_project(project.uuid, "name", "").unwrap();

    let age = |conn: &Connection| {
        conn.execute(
            "UPDATE todos SET updated_at = 5 WHERE uuid = ?1;",
            params![todo.uuid.to_string()],
        )
        .unwrap();
    };

    age(&conn);
    let completed = service.update_todo_status(todo.uuid, true).unwrap();
    assert!(completed.updated_at > 5);

    age(&conn);
    let patched = service
        .update_todo(
            todo.uuid,
            &TodoPatch {
                name: None,
                description: Some("details".to_string()),
            },
        )
        .unwrap();
    assert!(patched.updated_at > 5);

    let stored = SqliteTodoRepository::new(&conn)
        .find_todo(todo.uuid)
        .unwrap();
    assert_eq!(stored.updated_at, patched.updated_at);
}

struct FailingAppend<'c> {
    inner: SqliteProjectRepository<'c>,
}

impl ProjectRepository for FailingAppend<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        self.inner.create_project(project)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.inner.get_project(id)
    }

    fn update_title(&self, id: ProjectId, title: &str) -> RepoResult<Project> {
        self.inner.update_title(id, title)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        self.inner.list_projects(query)
    }

    fn soft_delete_project(&self, id: ProjectId) -> RepoResult<bool> {
        self.inner.soft_delete_project(id)
    }

    fn append_todo(&self, _project_id: ProjectId, _todo_id: TodoId) -> RepoResult<()> {
        Err(RepoError::InvalidData("injected append failure".to_string()))
    }

    fn list_todo_refs(&self, project_id: ProjectId) -> RepoResult<Vec<TodoId>> {
        self.inner.list_todo_refs(project_id)
    }
}

struct FailingTodoWrite<'c> {
    inner: SqliteTodoRepository<'c>,
}

impl TodoRepository for FailingTodoWrite<'_> {
    fn create_todo(&self, _todo: &Todo) -> RepoResult<TodoId> {
        Err(RepoError::InvalidData("injected todo write failure".to_string()))
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        self.inner.get_todo(id)
    }

    fn update_todo(&self, todo: &Todo) -> RepoResult<()> {
        self.inner.update_todo(todo)
    }

    fn soft_delete_todo(&self, id: TodoId) -> RepoResult<bool> {
        self.inner.soft_delete_todo(id)
    }

    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<Vec<Todo>> {
        self.inner.list_todos(query)
    }
}

#[test]
fn failed_project_append_reports_internal_and_leaves_todo_orphaned() {
    let conn = open_db_in_memory().unwrap();
    let service = ProjectService::new(
        FailingAppend {
            inner: SqliteProjectRepository::new(&conn),
        },
        SqliteTodoRepository::new(&conn),
    );
    let project = service.create_project(&caller("u1"), "Sprint1").unwrap();

    let err = service
        .add_todo_to_project(project.uuid, "Write plan", "")
        .unwrap_err();
    match &err {
        ServiceError::Internal { message } => {
            assert!(message.contains("project reference append failed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let orphans: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM todos WHERE project_uuid = ?1;",
            params![project.uuid.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 1);
    let aggregate = service.get_project_by_id(project.uuid).unwrap();
    assert!(aggregate.project.todos.is_empty());
    assert!(aggregate.todos.is_empty());
}

#[test]
fn failed_todo_write_reports_internal_and_skips_append() {
    let conn = open_db_in_memory().unwrap();
    let service = ProjectService::new(
        SqliteProjectRepository::new(&conn),
        FailingTodoWrite {
            inner: SqliteTodoRepository::new(&conn),
        },
    );
    let project = service.create_project(&caller("u1"), "Sprint1").unwrap();

    let err = service
        .add_todo_to_project(project.uuid, "Write plan", "")
        .unwrap_err();
    assert!(matches!(err, ServiceError::Internal { .. }));
    assert_eq!(err.code(), "internal_error");

    let aggregate = service.get_project_by_id(project.uuid).unwrap();
    assert!(aggregate.project.todos.is_empty());
}
