//! Drag-and-drop controller for one project's board.
//!
//! The controller is an explicit two-state machine. Entering `Dragging`
//! locks page scrolling through a [`ScrollLock`], and every exit from it
//! (drop, cancel, or the controller being dropped) unlocks it again.

use super::models::{BoardView, NewTask, ProjectId, Task, TaskId, TaskStatus};
use super::store::ProjectStore;
use super::transitions::Transition;
use crate::errors::BoardError;

/// Enter/exit action for the dragging state.
pub trait ScrollLock {
    fn lock(&mut self);
    fn unlock(&mut self);
}

/// Scroll lock for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScrollLock;

impl ScrollLock for NoopScrollLock {
    fn lock(&mut self) {}
    fn unlock(&mut self) {}
}

/// A position on the board: a column and an index within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSlot {
    pub column: TaskStatus,
    pub index: usize,
}

impl BoardSlot {
    pub fn new(column: TaskStatus, index: usize) -> Self {
        Self { column, index }
    }

    /// Build a slot from a droppable id such as `"in-progress"`. Unknown
    /// column ids yield `None`.
    pub fn from_droppable(droppable_id: &str, index: usize) -> Option<Self> {
        let column: TaskStatus = droppable_id.parse().ok()?;
        Some(Self { column, index })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging { task_id: TaskId, source: BoardSlot },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// `end_drag` was called with no drag in progress.
    Ignored,
    /// Dropped outside any column.
    Cancelled,
    /// Dropped on another column; only the status changed.
    Moved(Transition),
    /// Dropped at a new position within the same column.
    Reordered { task_id: TaskId, to_index: usize },
    /// Dropped where it started.
    Unchanged,
    /// The dragged task vanished from the store mid-drag.
    TaskMissing,
}

pub struct KanbanBoard<L: ScrollLock = NoopScrollLock> {
    store: ProjectStore,
    project_id: ProjectId,
    state: DragState,
    active_column: Option<TaskStatus>,
    scroll: L,
}

impl KanbanBoard<NoopScrollLock> {
    pub fn new(store: ProjectStore, project_id: impl Into<ProjectId>) -> Self {
        Self::with_scroll_lock(store, project_id, NoopScrollLock)
    }
}

impl<L: ScrollLock> KanbanBoard<L> {
    pub fn with_scroll_lock(store: ProjectStore, project_id: impl Into<ProjectId>, scroll: L) -> Self {
        Self {
            store,
            project_id: project_id.into(),
            state: DragState::Idle,
            active_column: None,
            scroll,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn active_column(&self) -> Option<&TaskStatus> {
        self.active_column.as_ref()
    }

    pub fn set_active_column(&mut self, column: Option<TaskStatus>) {
        self.active_column = column;
    }

    pub fn columns(&self) -> Result<Option<BoardView>, BoardError> {
        self.store.board(&self.project_id)
    }

    /// Add a task to this board. When a column is active the task lands
    /// there, overriding any status on `new`.
    pub fn add_task(&self, mut new: NewTask) -> Result<Option<Task>, BoardError> {
        if let Some(column) = &self.active_column {
            new.status = Some(column.clone());
        }
        self.store.add_task(&self.project_id, new)
    }

    pub fn begin_drag(&mut self, task_id: &str, source: BoardSlot) -> Result<(), BoardError> {
        if let DragState::Dragging { task_id: current, .. } = &self.state {
            return Err(BoardError::DragInProgress {
                task_id: current.clone(),
            });
        }
        tracing::debug!(project_id = %self.project_id, task_id, column = %source.column, "drag started");
        self.state = DragState::Dragging {
            task_id: task_id.to_string(),
            source,
        };
        self.scroll.lock();
        Ok(())
    }

    /// Finish the current drag. The board is back in `Idle` with scrolling
    /// unlocked whatever the outcome, including on error.
    pub fn end_drag(&mut self, destination: Option<BoardSlot>) -> Result<DropOutcome, BoardError> {
        let DragState::Dragging { task_id, source } =
            std::mem::replace(&mut self.state, DragState::Idle)
        else {
            return Ok(DropOutcome::Ignored);
        };
        self.scroll.unlock();

        let Some(destination) = destination else {
            tracing::debug!(task_id = %task_id, "drag cancelled");
            return Ok(DropOutcome::Cancelled);
        };
        if !destination.column.is_column() {
            tracing::debug!(task_id = %task_id, column = %destination.column, "drop outside board columns");
            return Ok(DropOutcome::Cancelled);
        }

        if destination.column != source.column {
            let outcome = self
                .store
                .move_task_to_status(&self.project_id, &task_id, destination.column)?
                .map_or(DropOutcome::TaskMissing, DropOutcome::Moved);
            return Ok(outcome);
        }

        if destination.index == source.index {
            return Ok(DropOutcome::Unchanged);
        }
        if self.store.task(&self.project_id, &task_id)?.is_none() {
            return Ok(DropOutcome::TaskMissing);
        }
        let moved = self
            .store
            .reorder_within_column(&self.project_id, &task_id, destination.index)?;
        Ok(if moved {
            DropOutcome::Reordered {
                task_id,
                to_index: destination.index,
            }
        } else {
            DropOutcome::Unchanged
        })
    }
}

impl<L: ScrollLock> Drop for KanbanBoard<L> {
    fn drop(&mut self) {
        if self.is_dragging() {
            self.scroll.unlock();
        }
    }
}
