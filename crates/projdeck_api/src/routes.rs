//! Route table for the project/todo REST surface.
//!
//! # Invariants
//! - Literal path segments win over `:param` segments at the same position.
//! - Path parameters are returned raw; id parsing happens in the handlers.

/// One resolved route with its path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    CreateProject { user_id: String },
    UpdateProject { project_id: String },
    DeleteProject { project_id: String },
    ListProjects { user_id: String },
    GetProjectById { project_id: String },
    AddTodo { project_id: String },
    UpdateTodoStatus { todo_id: String },
    UpdateTodo { todo_id: String },
    DeleteTodo { todo_id: String },
    ExportProject { project_id: String },
    ListDeletedProjects { user_id: String },
    ListDeletedTodos { project_id: String },
}

impl Route {
    /// Resolves `method` + `path`; a query string is ignored.
    pub fn parse(method: &str, path: &str) -> Option<Self> {
        let path = path.split('?').next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let method = method.trim().to_ascii_uppercase();

        let route = match (method.as_str(), segments.as_slice()) {
            ("GET", ["projects", "projectsbyid", id]) => Route::GetProjectById {
                project_id: id.to_string(),
            },
            ("GET", ["projects", "get_deleted_project", user]) => Route::ListDeletedProjects {
                user_id: user.to_string(),
            },
            ("GET", ["projects", "get_deleted", id]) => Route::ListDeletedTodos {
                project_id: id.to_string(),
            },
            ("GET", ["projects", id, "export"]) => Route::ExportProject {
                project_id: id.to_string(),
            },
            ("GET", ["projects", user]) => Route::ListProjects {
                user_id: user.to_string(),
            },
            ("POST", ["projects", id, "todos"]) => Route::AddTodo {
                project_id: id.to_string(),
            },
            ("POST", ["projects", user]) => Route::CreateProject {
                user_id: user.to_string(),
            },
            ("PUT", ["projects", "updateproject", id]) => Route::UpdateProject {
                project_id: id.to_string(),
            },
            ("PUT", ["projects", "todos", id]) => Route::UpdateTodoStatus {
                todo_id: id.to_string(),
            },
            ("PUT", ["projects", "update", id]) => Route::UpdateTodo {
                todo_id: id.to_string(),
            },
            ("DELETE", ["projects", "deleteproject", id]) => Route::DeleteProject {
                project_id: id.to_string(),
            },
            ("DELETE", ["projects", "todos", id]) => Route::DeleteTodo {
                todo_id: id.to_string(),
            },
            _ => return None,
        };
        Some(route)
    }

    /// Stable name used in request logs.
    pub fn name(&self) -> &'static str {
        match self {
            Route::CreateProject { .. } => "create_project",
            Route::UpdateProject { .. } => "update_project",
            Route::DeleteProject { .. } => "delete_project",
            Route::ListProjects { .. } => "list_projects",
            Route::GetProjectById { .. } => "get_project_by_id",
            Route::AddTodo { .. } => "add_todo",
            Route::UpdateTodoStatus { .. } => "update_todo_status",
            Route::UpdateTodo { .. } => "update_todo",
            Route::DeleteTodo { .. } => "delete_todo",
            Route::ExportProject { .. } => "export_project",
            Route::ListDeletedProjects { .. } => "list_deleted_projects",
            Route::ListDeletedTodos { .. } => "list_deleted_todos",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Route;

    #[test]
    fn literal_segments_win_over_params() {
        assert_eq!(
            Route::parse("GET", "/projects/projectsbyid/abc"),
            Some(Route::GetProjectById {
                project_id: "abc".to_string()
            })
        );
        assert_eq!(
            Route::parse("GET", "/projects/get_deleted_project/u1"),
            Some(Route::ListDeletedProjects {
                user_id: "u1".to_string()
            })
        );
        assert_eq!(
            Route::parse("GET", "/projects/get_deleted/p1"),
            Some(Route::ListDeletedTodos {
                project_id: "p1".to_string()
            })
        );
    }

    #[test]
    fn same_path_dispatches_on_method() {
        assert_eq!(
            Route::parse("post", "/projects/u1"),
            Some(Route::CreateProject {
                user_id: "u1".to_string()
            })
        );
        assert_eq!(
            Route::parse("GET", "/projects/u1/"),
            Some(Route::ListProjects {
                user_id: "u1".to_string()
            })
        );
        assert_eq!(
            Route::parse("PUT", "/projects/todos/t1"),
            Some(Route::UpdateTodoStatus {
                todo_id: "t1".to_string()
            })
        );
        assert_eq!(
            Route::parse("DELETE", "/projects/todos/t1"),
            Some(Route::DeleteTodo {
                todo_id: "t1".to_string()
            })
        );
    }

    #[test]
    fn export_and_add_todo_use_trailing_segment() {
        assert_eq!(
            Route::parse("GET", "/projects/p1/export?format=md"),
            Some(Route::ExportProject {
                project_id: "p1".to_string()
            })
        );
        assert_eq!(
            Route::parse("POST", "/projects/p1/todos"),
            Some(Route::AddTodo {
                project_id: "p1".to_string()
            })
        );
    }

    #[test]
    fn unknown_routes_do_not_resolve() {
        assert_eq!(Route::parse("PATCH", "/projects/u1"), None);
        assert_eq!(Route::parse("GET", "/todos/t1"), None);
        assert_eq!(Route::parse("GET", "/"), None);
    }
}
