//! Use-case API for the REST surface.
//!
//! # Responsibility
//! - Marshal route parameters and JSON bodies into core service calls.
//! - Verify the bearer credential before any project/todo operation.
//! - Translate service errors into status codes and `{success, ...}` envelopes.
//!
//! # Invariants
//! - Handlers never panic; every outcome is an `ApiResponse`.
//! - Owner-scoped routes act on the verified identity only.
//! - Project-id scoped routes do not check project ownership.
//! - One store connection serves all requests; it is locked for the whole
//!   handler, so requests sharing a `ProjdeckApi` run one at a time at the
//!   store. Hosts wanting parallel store access build one instance per
//!   worker over the same database file.

use crate::routes::Route;
use log::{error, info, warn};
use projdeck_core::db::open_db;
use projdeck_core::{
    init_logging, AppConfig, CallerIdentity, CommandPdfRenderer, ExportPipeline, GistPublisher,
    HttpGistPublisher, IdentityGate, Project, ProjectAggregate, ProjectService, ServiceError,
    SharedSecretGate, SqliteProjectRepository, SqliteTodoRepository, TodoPatch,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type SqliteService<'c> = ProjectService<SqliteProjectRepository<'c>, SqliteTodoRepository<'c>>;

/// Inbound request as seen by the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Raw JSON body; empty for body-less routes.
    pub body: String,
}

impl ApiRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body.to_string();
        self
    }
}

/// Status code plus JSON envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(status: u16, key: &str, value: Value) -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(true));
        body.insert(key.to_string(), value);
        Self {
            status,
            body: Value::Object(body),
        }
    }

    fn failure(status: u16, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({
                "success": false,
                "error": code,
                "message": message.into(),
            }),
        }
    }

    fn from_service_error(err: &ServiceError) -> Self {
        let status = match err {
            ServiceError::NotFound { .. } => 404,
            ServiceError::Validation(_) => 400,
            ServiceError::ExternalService { .. } | ServiceError::Internal { .. } => 500,
        };
        Self::failure(status, err.code(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.body["success"] == Value::Bool(true)
    }
}

#[derive(Debug, Deserialize)]
struct TitleBody {
    title: String,
}

#[derive(Debug, Deserialize)]
struct AddTodoBody {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: bool,
}

/// REST boundary over one store connection.
///
/// `Sync` whenever the gate and publisher are, so a host can share it
/// across request threads.
pub struct ProjdeckApi<G: IdentityGate, P: GistPublisher> {
    conn: Mutex<Connection>,
    gate: G,
    export: ExportPipeline<P>,
}

impl ProjdeckApi<SharedSecretGate, HttpGistPublisher> {
    /// Builds the production boundary from process configuration.
    ///
    /// Starts file logging when a log directory is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        if let Some(log_dir) = config.log_dir.as_deref() {
            init_logging(&config.log_level, log_dir)?;
        }

        let conn = open_db(&config.db_path).map_err(|err| format!("open store failed: {err}"))?;
        let publisher = HttpGistPublisher::new(
            config.export.gist_endpoint.clone(),
            config.export.api_token.clone(),
        );
        let renderer = Arc::new(CommandPdfRenderer::new(config.export.pdf_command.clone()));

        Ok(Self::new(
            conn,
            SharedSecretGate::new(config.signing_secret.clone()),
            ExportPipeline::new(config.export.clone(), publisher, renderer),
        ))
    }
}

impl<G: IdentityGate, P: GistPublisher> ProjdeckApi<G, P> {
    pub fn new(conn: Connection, gate: G, export: ExportPipeline<P>) -> Self {
        Self {
            conn: Mutex::new(conn),
            gate,
            export,
        }
    }

    pub fn export_pipeline(&self) -> &ExportPipeline<P> {
        &self.export
    }

    /// Dispatches one request.
    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let Some(route) = Route::parse(&request.method, &request.path) else {
            return ApiResponse::failure(404, "route_not_found", "Cannot resolve route");
        };

        let caller = match self.authorize(request.authorization.as_deref()) {
            Ok(caller) => caller,
            Err(response) => return response,
        };

        let response = self.dispatch(&caller, &route, request.body.as_str());
        info!(
            "event=api_request module=api route={} status={}",
            route.name(),
            response.status
        );
        response
    }

    fn authorize(&self, authorization: Option<&str>) -> Result<CallerIdentity, ApiResponse> {
        self.gate
            .verify(authorization.unwrap_or_default())
            .map_err(|err| {
                warn!("event=api_auth module=api status=error error={err}");
                ApiResponse::failure(401, "unauthorized", "Unauthorized")
            })
    }

    fn dispatch(&self, caller: &CallerIdentity, route: &Route, body: &str) -> ApiResponse {
        let Ok(conn) = self.conn.lock() else {
            error!(
                "event=api_request module=api status=error route={} error=store_lock_poisoned",
                route.name()
            );
            return ApiResponse::failure(500, "internal_error", "Store unavailable");
        };
        let service = sqlite_service(&conn);
        match route {
            Route::CreateProject { user_id } => {
                if let Err(response) = ensure_same_user(caller, user_id) {
                    return response;
                }
                let input: TitleBody = match parse_body(body) {
                    Ok(input) => input,
                    Err(response) => return response,
                };
                respond(201, "project", service.create_project(caller, input.title), |p| {
                    project_view(&p)
                })
            }
            Route::UpdateProject { project_id } => {
                let Some(project_id) = parse_id(project_id) else {
                    return project_not_found();
                };
                let input: TitleBody = match parse_body(body) {
                    Ok(input) => input,
                    Err(response) => return response,
                };
                respond(
                    200,
                    "project",
                    service.update_project(project_id, input.title),
                    |p| project_view(&p),
                )
            }
            Route::DeleteProject { project_id } => {
                let result = match parse_id(project_id) {
                    Some(project_id) => service.delete_project(caller, project_id),
                    None => service.list_projects(caller),
                };
                respond(200, "projects", result, |list| aggregates_view(&list))
            }
            Route::ListProjects { user_id } => {
                if let Err(response) = ensure_same_user(caller, user_id) {
                    return response;
                }
                respond(200, "projects", service.list_projects(caller), |list| {
                    aggregates_view(&list)
                })
            }
            Route::ListDeletedProjects { user_id } => {
                if let Err(response) = ensure_same_user(caller, user_id) {
                    return response;
                }
                respond(
                    200,
                    "projects",
                    service.list_deleted_projects(caller),
                    |list| aggregates_view(&list),
                )
            }
            Route::GetProjectById { project_id } => {
                let Some(project_id) = parse_id(project_id) else {
                    return project_not_found();
                };
                respond(200, "project", service.get_project_by_id(project_id), |a| {
                    a.json_view()
                })
            }
            Route::AddTodo { project_id } => {
                let Some(project_id) = parse_id(project_id) else {
                    return project_not_found();
                };
                let input: AddTodoBody = match parse_body(body) {
                    Ok(input) => input,
                    Err(response) => return response,
                };
                respond(
                    201,
                    "todo",
                    service.add_todo_to_project(project_id, input.name, input.description),
                    to_value,
                )
            }
            Route::UpdateTodoStatus { todo_id } => {
                let Some(todo_id) = parse_id(todo_id) else {
                    return todo_not_found(todo_id);
                };
                let input: StatusBody = match parse_body(body) {
                    Ok(input) => input,
                    Err(response) => return response,
                };
                respond(
                    200,
                    "todo",
                    service.update_todo_status(todo_id, input.status),
                    to_value,
                )
            }
            Route::UpdateTodo { todo_id } => {
                let Some(todo_id) = parse_id(todo_id) else {
                    return todo_not_found(todo_id);
                };
                let patch: TodoPatch = match parse_body(body) {
                    Ok(patch) => patch,
                    Err(response) => return response,
                };
                respond(
                    200,
                    "updatedTodo",
                    service.update_todo(todo_id, &patch),
                    to_value,
                )
            }
            Route::DeleteTodo { todo_id } => {
                if let Some(todo_id) = parse_id(todo_id) {
                    if let Err(err) = service.delete_todo(todo_id) {
                        return ApiResponse::from_service_error(&err);
                    }
                }
                ApiResponse {
                    status: 200,
                    body: json!({ "success": true }),
                }
            }
            Route::ListDeletedTodos { project_id } => {
                let Some(project_id) = parse_id(project_id) else {
                    return project_not_found();
                };
                respond(
                    200,
                    "todos",
                    service.list_deleted_todos(project_id),
                    to_value,
                )
            }
            Route::ExportProject { project_id } => {
                let Some(project_id) = parse_id(project_id) else {
                    return project_not_found();
                };
                respond(
                    200,
                    "gistUrl",
                    self.export.export_project_summary(&service, project_id),
                    |receipt| Value::String(receipt.gist_url),
                )
            }
        }
    }
}

fn sqlite_service(conn: &Connection) -> SqliteService<'_> {
    ProjectService::new(
        SqliteProjectRepository::new(conn),
        SqliteTodoRepository::new(conn),
    )
}

fn respond<T>(
    status: u16,
    key: &str,
    result: Result<T, ServiceError>,
    view: impl FnOnce(T) -> Value,
) -> ApiResponse {
    match result {
        Ok(value) => ApiResponse::ok(status, key, view(value)),
        Err(err) => ApiResponse::from_service_error(&err),
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ApiResponse> {
    serde_json::from_str(body)
        .map_err(|err| ApiResponse::failure(400, "validation_error", format!("invalid body: {err}")))
}

fn parse_id(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value.trim()).ok()
}

fn ensure_same_user(caller: &CallerIdentity, user_id: &str) -> Result<(), ApiResponse> {
    if caller.as_str() == user_id.trim() {
        return Ok(());
    }
    Err(ApiResponse::failure(
        403,
        "forbidden",
        "Route user does not match the authenticated caller",
    ))
}

fn project_not_found() -> ApiResponse {
    ApiResponse::failure(404, "not_found", "Project not found")
}

fn todo_not_found(raw_id: &str) -> ApiResponse {
    ApiResponse::failure(404, "not_found", format!("Todo with ID {raw_id} not found"))
}

fn to_value<T: serde::Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn project_view(project: &Project) -> Value {
    to_value(project)
}

fn aggregates_view(aggregates: &[ProjectAggregate]) -> Value {
    Value::Array(aggregates.iter().map(ProjectAggregate::json_view).collect())
}
