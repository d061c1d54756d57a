use serde::Serialize;
use tokio::sync::broadcast;

use super::models::*;

/// Capacity of the store's event channel. Slow subscribers lag and skip
/// ahead rather than blocking mutations.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

// ── Store event types ────────────────────────────────────────────────

/// Notification emitted after every successful store mutation so that
/// dependent views (board, dashboard) know to recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum StoreEvent {
    ProjectsLoaded {
        count: usize,
    },
    ProjectCreated {
        project: Project,
    },
    ProjectUpdated {
        project: Project,
    },
    ProjectDeleted {
        project_id: ProjectId,
    },
    ProjectPersisted {
        project_id: ProjectId,
    },
    TaskCreated {
        project_id: ProjectId,
        task: Task,
    },
    TaskUpdated {
        project_id: ProjectId,
        task: Task,
    },
    TaskMoved {
        project_id: ProjectId,
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
    TaskDeleted {
        project_id: ProjectId,
        task_id: TaskId,
    },
    TasksReordered {
        project_id: ProjectId,
        from_index: usize,
        to_index: usize,
    },
}

impl StoreEvent {
    pub fn project_id(&self) -> Option<&str> {
        match self {
            StoreEvent::ProjectsLoaded { .. } => None,
            StoreEvent::ProjectCreated { project } | StoreEvent::ProjectUpdated { project } => {
                Some(project.id.as_str())
            }
            StoreEvent::ProjectDeleted { project_id }
            | StoreEvent::ProjectPersisted { project_id }
            | StoreEvent::TaskCreated { project_id, .. }
            | StoreEvent::TaskUpdated { project_id, .. }
            | StoreEvent::TaskMoved { project_id, .. }
            | StoreEvent::TaskDeleted { project_id, .. }
            | StoreEvent::TasksReordered { project_id, .. } => Some(project_id.as_str()),
        }
    }
}

pub fn event_channel() -> broadcast::Sender<StoreEvent> {
    let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    tx
}

pub fn broadcast_event(tx: &broadcast::Sender<StoreEvent>, event: StoreEvent) {
    // No subscribers is the normal headless case.
    if tx.send(event).is_err() {
        tracing::trace!("store event dropped: no subscribers");
    }
}

// ── Tests ────────────────────────────────────────────────────────────
