//! Task transition engine.
//!
//! Pure helpers over a project's task list: partitioning into the four board
//! columns, planning status moves, and translating reorders between
//! column-local positions and positions in the full task array. Nothing here
//! touches the store; callers apply the results under the store lock.
//!
//! Columns are views over one flat `Vec<Task>`. A column index is therefore
//! never a valid index into the task array unless it has been translated
//! with [`column_to_global_index`].

use super::models::{BoardView, ColumnView, Project, Task, TaskId, TaskStatus};

/// Tasks grouped by board column, each group in task-array order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StatusBuckets<'a> {
    pub todo: Vec<&'a Task>,
    pub in_progress: Vec<&'a Task>,
    pub review: Vec<&'a Task>,
    pub done: Vec<&'a Task>,
}

impl<'a> StatusBuckets<'a> {
    /// The bucket for `status`; always empty for non-column statuses.
    pub fn bucket(&self, status: &TaskStatus) -> &[&'a Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Review => &self.review,
            TaskStatus::Done => &self.done,
            TaskStatus::Other(_) => &[],
        }
    }

    fn bucket_mut(&mut self, status: &TaskStatus) -> Option<&mut Vec<&'a Task>> {
        match status {
            TaskStatus::Todo => Some(&mut self.todo),
            TaskStatus::InProgress => Some(&mut self.in_progress),
            TaskStatus::Review => Some(&mut self.review),
            TaskStatus::Done => Some(&mut self.done),
            TaskStatus::Other(_) => None,
        }
    }

    /// Number of tasks across all four buckets.
    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.review.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buckets in column display order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskStatus, &[&'a Task])> + '_ {
        TaskStatus::COLUMNS
            .into_iter()
            .map(move |status| {
                let tasks = self.bucket(&status);
                (status, tasks)
            })
    }
}

/// Stable partition of `tasks` into the four columns. Tasks whose status is
/// not a board column are left out.
pub fn partition(tasks: &[Task]) -> StatusBuckets<'_> {
    let mut buckets = StatusBuckets::default();
    for task in tasks {
        if let Some(bucket) = buckets.bucket_mut(&task.status) {
            bucket.push(task);
        }
    }
    buckets
}

pub fn tasks_with_status<'a>(tasks: &'a [Task], status: &TaskStatus) -> Vec<&'a Task> {
    if !status.is_column() {
        return Vec::new();
    }
    tasks.iter().filter(|t| &t.status == status).collect()
}

pub fn board_view(project: &Project) -> BoardView {
    let buckets = partition(&project.tasks);
    BoardView {
        project_id: project.id.clone(),
        project_name: project.name.clone(),
        columns: buckets
            .iter()
            .map(|(status, tasks)| ColumnView {
                status,
                tasks: tasks.iter().map(|t| (*t).clone()).collect(),
            })
            .collect(),
    }
}

// ── Status transitions ────────────────────────────────────────────────

/// Effect of moving one task to a new status. There are no workflow rules:
/// every status may move to every other status, including backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub task_id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

impl Transition {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

pub fn plan_transition(task: &Task, to: TaskStatus) -> Transition {
    Transition {
        task_id: task.id.clone(),
        from: task.status.clone(),
        to,
    }
}

// ── Reordering ────────────────────────────────────────────────────────

/// Where a task should land relative to the other tasks of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Start,
    End,
    Before(TaskId),
    After(TaskId),
}

/// Position in the full task array of the `column_index`-th task in `status`.
pub fn column_to_global_index(
    tasks: &[Task],
    status: &TaskStatus,
    column_index: usize,
) -> Option<usize> {
    if !status.is_column() {
        return None;
    }
    tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| &t.status == status)
        .nth(column_index)
        .map(|(i, _)| i)
}

/// Column position of the task stored at `global_index`.
pub fn global_to_column_index(tasks: &[Task], global_index: usize) -> Option<(TaskStatus, usize)> {
    let task = tasks.get(global_index)?;
    if !task.status.is_column() {
        return None;
    }
    let column_index = tasks[..global_index]
        .iter()
        .filter(|t| t.status == task.status)
        .count();
    Some((task.status.clone(), column_index))
}

/// Remove the item at `from` and reinsert it at `to`. Returns false (and
/// leaves `items` untouched) when `from == to` or either index is out of
/// range.
pub fn move_index<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

/// Translate an identity-based placement into a `(from, to)` pair for
/// [`move_index`]. `None` when the task or anchor is unknown, or when the
/// task is its own anchor.
pub fn resolve_placement(
    tasks: &[Task],
    task_id: &str,
    placement: &Placement,
) -> Option<(usize, usize)> {
    let from = tasks.iter().position(|t| t.id == task_id)?;
    let anchor_after_removal = |anchor: &str| -> Option<usize> {
        if anchor == task_id {
            return None;
        }
        let idx = tasks.iter().position(|t| t.id == anchor)?;
        Some(if idx > from { idx - 1 } else { idx })
    };
    let to = match placement {
        Placement::Start => 0,
        Placement::End => tasks.len() - 1,
        Placement::Before(anchor) => anchor_after_removal(anchor)?,
        Placement::After(anchor) => anchor_after_removal(anchor)? + 1,
    };
    Some((from, to))
}

/// Placement that puts `task_id` at `destination_index` within its own
/// status column, expressed relative to its column neighbours so that
/// tasks in other columns keep their positions.
pub fn column_placement(
    tasks: &[Task],
    task_id: &str,
    status: &TaskStatus,
    destination_index: usize,
) -> Option<Placement> {
    let others: Vec<&Task> = tasks_with_status(tasks, status)
        .into_iter()
        .filter(|t| t.id != task_id)
        .collect();
    if others.is_empty() {
        return None;
    }
    match others.get(destination_index) {
        Some(anchor) => Some(Placement::Before(anchor.id.clone())),
        None => others.last().map(|last| Placement::After(last.id.clone())),
    }
}
