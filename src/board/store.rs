use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::api::RemoteApi;
use super::events::{StoreEvent, broadcast_event, event_channel};
use super::models::*;
use super::transitions::{self, Placement, Transition};
use crate::errors::BoardError;

/// Shared handle to the project collection.
///
/// Cloning the handle shares the same state. Every mutation takes the lock
/// exactly once, so a read-then-write never interleaves with another
/// mutation; the lock is never held across a network call. After the lock
/// is released the mutation is announced on the event channel.
///
/// Project edits and all task mutations are local to this process until a
/// caller explicitly pushes them with [`ProjectStore::persist_project`].
/// A later [`ProjectStore::load_projects`] replaces unpersisted edits with
/// the server's copy.
#[derive(Clone)]
pub struct ProjectStore {
    state: Arc<Mutex<Vec<Project>>>,
    events: broadcast::Sender<StoreEvent>,
    api: Arc<dyn RemoteApi>,
}

impl ProjectStore {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self::with_projects(api, Vec::new())
    }

    /// Seed the store with an initial project list.
    pub fn with_projects(api: Arc<dyn RemoteApi>, mut projects: Vec<Project>) -> Self {
        projects.iter_mut().for_each(Project::dedupe_members);
        Self {
            state: Arc::new(Mutex::new(projects)),
            events: event_channel(),
            api,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut Vec<Project>) -> R) -> Result<R, BoardError> {
        let mut guard = self.state.lock().map_err(|_| BoardError::LockPoisoned)?;
        Ok(f(&mut guard))
    }

    fn with_project<R>(
        &self,
        project_id: &str,
        f: impl FnOnce(&mut Project) -> R,
    ) -> Result<Option<R>, BoardError> {
        self.with_state(|projects| projects.iter_mut().find(|p| p.id == project_id).map(f))
    }

    fn emit(&self, event: StoreEvent) {
        broadcast_event(&self.events, event);
    }

    // ── Reads ─────────────────────────────────────────────────────────

    pub fn projects(&self) -> Result<Vec<Project>, BoardError> {
        self.with_state(|projects| projects.clone())
    }

    pub fn project(&self, project_id: &str) -> Result<Option<Project>, BoardError> {
        self.with_state(|projects| projects.iter().find(|p| p.id == project_id).cloned())
    }

    pub fn task(&self, project_id: &str, task_id: &str) -> Result<Option<Task>, BoardError> {
        self.with_state(|projects| {
            projects
                .iter()
                .find(|p| p.id == project_id)
                .and_then(|p| p.task(task_id))
                .cloned()
        })
    }

    pub fn board(&self, project_id: &str) -> Result<Option<BoardView>, BoardError> {
        self.with_state(|projects| {
            projects
                .iter()
                .find(|p| p.id == project_id)
                .map(transitions::board_view)
        })
    }

    // ── Remote-backed operations ──────────────────────────────────────

    /// Replace local state with the server's project list.
    pub async fn load_projects(&self) -> Result<usize, BoardError> {
        let mut fetched = match self.api.fetch_projects().await {
            Ok(projects) => projects,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch projects");
                return Err(e.into());
            }
        };
        fetched.iter_mut().for_each(Project::dedupe_members);
        let count = fetched.len();
        self.with_state(|projects| *projects = fetched)?;
        tracing::info!(count, "loaded projects from server");
        self.emit(StoreEvent::ProjectsLoaded { count });
        Ok(count)
    }

    /// Create a project on the server and append the server's copy locally.
    /// Nothing is inserted before the server answers, so a failure leaves
    /// the store untouched.
    pub async fn add_project(&self, mut new: NewProject) -> Result<Project, BoardError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(BoardError::blank("name"));
        }
        new.name = name.to_string();
        new.description = new.description.filter(|d| !d.trim().is_empty());

        let mut project = match self.api.create_project(new).await {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!(error = %e, "failed to create project");
                return Err(e.into());
            }
        };
        project.dedupe_members();

        let stored = project.clone();
        self.with_state(move |projects| {
            // A concurrent load may already have brought this project in.
            match projects.iter_mut().find(|p| p.id == stored.id) {
                Some(existing) => *existing = stored,
                None => projects.push(stored),
            }
        })?;
        tracing::info!(project_id = %project.id, name = %project.name, "created project");
        self.emit(StoreEvent::ProjectCreated {
            project: project.clone(),
        });
        Ok(project)
    }

    /// Push the local copy of a project to the server and adopt the
    /// server's answer. `Ok(None)` when the project is not known locally.
    pub async fn persist_project(&self, project_id: &str) -> Result<Option<Project>, BoardError> {
        let Some(local) = self.project(project_id)? else {
            return Ok(None);
        };
        let mut saved = match self.api.update_project(&local).await {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!(project_id, error = %e, "failed to persist project");
                return Err(e.into());
            }
        };
        saved.dedupe_members();
        let stored = saved.clone();
        self.with_project(project_id, move |p| *p = stored)?;
        tracing::info!(project_id, "persisted project");
        self.emit(StoreEvent::ProjectPersisted {
            project_id: project_id.to_string(),
        });
        Ok(Some(saved))
    }

    /// Delete a project on the server, then drop it locally.
    pub async fn persist_project_deletion(&self, project_id: &str) -> Result<(), BoardError> {
        if let Err(e) = self.api.delete_project(project_id).await {
            tracing::warn!(project_id, error = %e, "failed to delete project on server");
            return Err(e.into());
        }
        tracing::info!(project_id, "deleted project on server");
        self.delete_project(project_id)?;
        Ok(())
    }

    // ── Local project mutations ───────────────────────────────────────

    pub fn update_project(
        &self,
        project_id: &str,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, BoardError> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(BoardError::blank("name"));
        }
        let updated = self.with_project(project_id, |p| {
            patch.apply(p);
            p.clone()
        })?;
        match &updated {
            Some(project) => {
                tracing::debug!(project_id, "updated project locally");
                self.emit(StoreEvent::ProjectUpdated {
                    project: project.clone(),
                });
            }
            None => tracing::debug!(project_id, "update_project: unknown project"),
        }
        Ok(updated)
    }

    /// Remove a project locally. Returns whether anything was removed.
    pub fn delete_project(&self, project_id: &str) -> Result<bool, BoardError> {
        let removed = self.with_state(|projects| {
            let before = projects.len();
            projects.retain(|p| p.id != project_id);
            projects.len() != before
        })?;
        if removed {
            tracing::debug!(project_id, "deleted project locally");
            self.emit(StoreEvent::ProjectDeleted {
                project_id: project_id.to_string(),
            });
        }
        Ok(removed)
    }

    // ── Local task mutations ──────────────────────────────────────────

    /// Append a task with a fresh id. The status defaults to `todo` when
    /// the caller leaves it unset.
    pub fn add_task(&self, project_id: &str, new: NewTask) -> Result<Option<Task>, BoardError> {
        if new.title.trim().is_empty() {
            return Err(BoardError::blank("title"));
        }
        if let Some(status) = &new.status {
            BoardError::check_status(status)?;
        }
        let created = self.with_project(project_id, |p| {
            let mut id = Uuid::new_v4().to_string();
            while p.task(&id).is_some() {
                id = Uuid::new_v4().to_string();
            }
            let task = Task::from_new(new, id, Utc::now());
            p.tasks.push(task.clone());
            task
        })?;
        match &created {
            Some(task) => {
                tracing::debug!(project_id, task_id = %task.id, status = %task.status, "added task");
                self.emit(StoreEvent::TaskCreated {
                    project_id: project_id.to_string(),
                    task: task.clone(),
                });
            }
            None => tracing::debug!(project_id, "add_task: unknown project"),
        }
        Ok(created)
    }

    /// Merge `patch` into a task. Unknown project or task ids are a silent
    /// no-op (`Ok(None)`).
    pub fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<Option<Task>, BoardError> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(BoardError::blank("title"));
        }
        if let Some(status) = &patch.status {
            BoardError::check_status(status)?;
        }
        let updated = self
            .with_project(project_id, |p| {
                p.task_mut(task_id).map(|task| {
                    patch.apply(task);
                    task.clone()
                })
            })?
            .flatten();
        if let Some(task) = &updated {
            if !patch.is_empty() {
                tracing::debug!(project_id, task_id, "updated task");
                self.emit(StoreEvent::TaskUpdated {
                    project_id: project_id.to_string(),
                    task: task.clone(),
                });
            }
        }
        Ok(updated)
    }

    /// Remove a task. Idempotent; returns whether anything was removed.
    pub fn delete_task(&self, project_id: &str, task_id: &str) -> Result<bool, BoardError> {
        let removed = self
            .with_project(project_id, |p| {
                let before = p.tasks.len();
                p.tasks.retain(|t| t.id != task_id);
                p.tasks.len() != before
            })?
            .unwrap_or(false);
        if removed {
            tracing::debug!(project_id, task_id, "deleted task");
            self.emit(StoreEvent::TaskDeleted {
                project_id: project_id.to_string(),
                task_id: task_id.to_string(),
            });
        }
        Ok(removed)
    }

    /// Set a task's status and nothing else. Any column may move to any
    /// other; a status outside the board columns is rejected.
    pub fn move_task_to_status(
        &self,
        project_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Option<Transition>, BoardError> {
        BoardError::check_status(&status)?;
        let transition = self
            .with_project(project_id, |p| {
                p.task_mut(task_id).map(|task| {
                    let transition = transitions::plan_transition(task, status);
                    task.status = transition.to.clone();
                    transition
                })
            })?
            .flatten();
        if let Some(t) = &transition {
            if !t.is_noop() {
                tracing::debug!(project_id, task_id, from = %t.from, to = %t.to, "moved task");
                self.emit(StoreEvent::TaskMoved {
                    project_id: project_id.to_string(),
                    task_id: task_id.to_string(),
                    from: t.from.clone(),
                    to: t.to.clone(),
                });
            }
        }
        Ok(transition)
    }

    /// Move the task at `source_index` to `destination_index`. Both indices
    /// address the project's full task array, not a status column; use
    /// [`transitions::column_to_global_index`] or
    /// [`ProjectStore::reorder_task`] when starting from a column position.
    pub fn reorder_tasks(
        &self,
        project_id: &str,
        source_index: usize,
        destination_index: usize,
    ) -> Result<bool, BoardError> {
        let moved = self
            .with_project(project_id, |p| {
                transitions::move_index(&mut p.tasks, source_index, destination_index)
            })?
            .unwrap_or(false);
        if moved {
            self.emit_reordered(project_id, source_index, destination_index);
        }
        Ok(moved)
    }

    /// Identity-based reorder: place `task_id` relative to another task.
    pub fn reorder_task(
        &self,
        project_id: &str,
        task_id: &str,
        placement: &Placement,
    ) -> Result<bool, BoardError> {
        let moved = self
            .with_project(project_id, |p| {
                transitions::resolve_placement(&p.tasks, task_id, placement).filter(
                    |&(from, to)| transitions::move_index(&mut p.tasks, from, to),
                )
            })?
            .flatten();
        match moved {
            Some((from, to)) => {
                self.emit_reordered(project_id, from, to);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Move `task_id` to `destination_index` within its current status
    /// column, leaving tasks of other columns where they are. Resolution
    /// and the move happen under one lock.
    pub fn reorder_within_column(
        &self,
        project_id: &str,
        task_id: &str,
        destination_index: usize,
    ) -> Result<bool, BoardError> {
        let moved = self
            .with_project(project_id, |p| {
                let status = p.task(task_id)?.status.clone();
                let placement =
                    transitions::column_placement(&p.tasks, task_id, &status, destination_index)?;
                transitions::resolve_placement(&p.tasks, task_id, &placement)
                    .filter(|&(from, to)| transitions::move_index(&mut p.tasks, from, to))
            })?
            .flatten();
        match moved {
            Some((from, to)) => {
                self.emit_reordered(project_id, from, to);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn emit_reordered(&self, project_id: &str, from_index: usize, to_index: usize) {
        tracing::debug!(project_id, from_index, to_index, "reordered tasks");
        self.emit(StoreEvent::TasksReordered {
            project_id: project_id.to_string(),
            from_index,
            to_index,
        });
    }
}
