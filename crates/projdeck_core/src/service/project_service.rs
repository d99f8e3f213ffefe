//! Project/todo aggregate service.
//!
//! # Responsibility
//! - Provide the project and todo use cases on top of the repositories.
//! - Scope owner-level listings and creation by the verified caller.
//! - Run the two-step todo attach and report a partial write loudly.
//!
//! # Invariants
//! - New projects start active with an empty todo list.
//! - A todo is written before its project reference; a failure between the
//!   two writes is surfaced as `Internal` and never compensated here.
//! - Deleting a missing project is not an error; deleting a project never
//!   touches its todos.
//! - Project-id scoped operations do not check the caller owns the project.

use super::{ServiceError, ServiceResult};
use crate::identity::CallerIdentity;
use crate::model::project::{Project, ProjectAggregate, ProjectId};
use crate::model::todo::{Todo, TodoId, TodoPatch};
use crate::repo::project_repo::{ProjectListQuery, ProjectRepository};
use crate::repo::todo_repo::{TodoListQuery, TodoRepository};
use log::{error, info};

/// Use-case facade over project and todo repositories.
pub struct ProjectService<P: ProjectRepository, T: TodoRepository> {
    projects: P,
    todos: T,
}

impl<P: ProjectRepository, T: TodoRepository> ProjectService<P, T> {
    pub fn new(projects: P, todos: T) -> Self {
        Self { projects, todos }
    }

    /// Creates an active project owned by `caller`.
    pub fn create_project(
        &self,
        caller: &CallerIdentity,
        title: impl Into<String>,
    ) -> ServiceResult<Project> {
        let project = Project::new(title, caller.as_str());
        self.projects
            .create_project(&project)
            .map_err(|err| ServiceError::from_repo("creating project", err))?;

        info!(
            "event=project_create module=service status=ok project_id={}",
            project.uuid
        );
        Ok(project)
    }

    /// Replaces a project's title.
    pub fn update_project(
        &self,
        project_id: ProjectId,
        title: impl Into<String>,
    ) -> ServiceResult<Project> {
        let title = title.into();
        let project = self
            .projects
            .update_title(project_id, title.as_str())
            .map_err(|err| ServiceError::from_repo("updating project", err))?;

        info!("event=project_update module=service status=ok project_id={project_id}");
        Ok(project)
    }

    /// Soft-deletes a project and returns the caller's remaining active list.
    ///
    /// A missing id is logged and otherwise ignored.
    pub fn delete_project(
        &self,
        caller: &CallerIdentity,
        project_id: ProjectId,
    ) -> ServiceResult<Vec<ProjectAggregate>> {
        let matched = self
            .projects
            .soft_delete_project(project_id)
            .map_err(|err| ServiceError::from_repo("deleting project", err))?;

        info!(
            "event=project_delete module=service status=ok project_id={project_id} matched={matched}"
        );
        self.list_projects(caller)
    }

    /// Lists the caller's active projects, newest first, todos resolved.
    pub fn list_projects(&self, caller: &CallerIdentity) -> ServiceResult<Vec<ProjectAggregate>> {
        self.list_scoped(ProjectListQuery::active(caller.as_str()))
    }

    /// Lists the caller's soft-deleted projects, newest first, todos resolved.
    pub fn list_deleted_projects(
        &self,
        caller: &CallerIdentity,
    ) -> ServiceResult<Vec<ProjectAggregate>> {
        self.list_scoped(ProjectListQuery::deleted(caller.as_str()))
    }

    /// Resolves one project with its active todos, newest first.
    ///
    /// Soft-deleted projects are returned; only an unknown id is `NotFound`.
    pub fn get_project_by_id(&self, project_id: ProjectId) -> ServiceResult<ProjectAggregate> {
        let project = self
            .projects
            .find_project(project_id)
            .map_err(|err| ServiceError::from_repo("retrieving project", err))?;
        self.resolve(project)
    }

    /// Creates a todo and appends it to the project's reference list.
    pub fn add_todo_to_project(
        &self,
        project_id: ProjectId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> ServiceResult<Todo> {
        let project = self
            .projects
            .find_project(project_id)
            .map_err(|err| ServiceError::from_repo("adding todo to project", err))?;

        let todo = Todo::new(project.uuid, name, description);
        todo.validate()
            .map_err(|err| ServiceError::Validation(err.to_string()))?;

        if let Err(err) = self.todos.create_todo(&todo) {
            error!(
                "event=todo_attach module=service status=error step=todo_write project_id={project_id} todo_id={} error={err}",
                todo.uuid
            );
            return Err(ServiceError::internal(format!(
                "Error adding todo to project: todo write failed: {err}"
            )));
        }

        if let Err(err) = self.projects.append_todo(project.uuid, todo.uuid) {
            error!(
                "event=todo_attach module=service status=partial step=project_append project_id={project_id} todo_id={} error={err}",
                todo.uuid
            );
            return Err(ServiceError::internal(format!(
                "Error adding todo to project: todo {} stored but project reference append failed: {err}",
                todo.uuid
            )));
        }

        info!(
            "event=todo_attach module=service status=ok project_id={project_id} todo_id={}",
            todo.uuid
        );
        Ok(todo)
    }

    /// Sets a todo's completion flag.
    pub fn update_todo_status(&self, todo_id: TodoId, status: bool) -> ServiceResult<Todo> {
        let mut todo = self
            .todos
            .find_todo(todo_id)
            .map_err(|err| ServiceError::from_repo("updating todo status", err))?;
        todo.set_status(status);
        self.todos
            .update_todo(&todo)
            .map_err(|err| ServiceError::from_repo("updating todo status", err))?;

        info!("event=todo_status module=service status=ok todo_id={todo_id} completed={status}");
        Ok(todo)
    }

    /// Applies a partial name/description update.
    pub fn update_todo(&self, todo_id: TodoId, patch: &TodoPatch) -> ServiceResult<Todo> {
        let mut todo = self
            .todos
            .find_todo(todo_id)
            .map_err(|err| ServiceError::from_repo("updating todo", err))?;
        todo.apply_patch(patch);
        self.todos
            .update_todo(&todo)
            .map_err(|err| ServiceError::from_repo("updating todo", err))?;

        info!("event=todo_update module=service status=ok todo_id={todo_id}");
        Ok(todo)
    }

    /// Soft-deletes a todo. Unknown ids succeed as well.
    pub fn delete_todo(&self, todo_id: TodoId) -> ServiceResult<()> {
        let matched = self
            .todos
            .soft_delete_todo(todo_id)
            .map_err(|err| ServiceError::from_repo("deleting todo", err))?;

        info!("event=todo_delete module=service status=ok todo_id={todo_id} matched={matched}");
        Ok(())
    }

    /// Lists a project's soft-deleted todos, newest first.
    pub fn list_deleted_todos(&self, project_id: ProjectId) -> ServiceResult<Vec<Todo>> {
        self.todos
            .list_todos(&TodoListQuery {
                project: project_id,
                deleted: true,
            })
            .map_err(|err| ServiceError::from_repo("retrieving deleted todos", err))
    }

    fn list_scoped(&self, query: ProjectListQuery) -> ServiceResult<Vec<ProjectAggregate>> {
        self.projects
            .list_projects(&query)
            .map_err(|err| ServiceError::from_repo("retrieving projects", err))?
            .into_iter()
            .map(|project| self.resolve(project))
            .collect()
    }

    fn resolve(&self, project: Project) -> ServiceResult<ProjectAggregate> {
        let todos = self
            .todos
            .list_todos(&TodoListQuery {
                project: project.uuid,
                deleted: false,
            })
            .map_err(|err| ServiceError::from_repo("resolving project todos", err))?;
        Ok(ProjectAggregate { project, todos })
    }
}
