//! Read-only statistics for the project detail page and the dashboard.
//! Computed from a snapshot on every call.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::models::{Priority, Project, ProjectId, TaskStatus, UserId};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub review: usize,
    pub done: usize,
    /// Tasks whose status is not one of the board columns.
    pub other: usize,
}

impl StatusCounts {
    fn record(&mut self, status: &TaskStatus) {
        match status {
            TaskStatus::Todo => self.todo += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Review => self.review += 1,
            TaskStatus::Done => self.done += 1,
            TaskStatus::Other(_) => self.other += 1,
        }
    }

    pub fn get(&self, status: &TaskStatus) -> usize {
        match status {
            TaskStatus::Todo => self.todo,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Review => self.review,
            TaskStatus::Done => self.done,
            TaskStatus::Other(_) => self.other,
        }
    }

    fn merge(&mut self, other: &StatusCounts) {
        self.todo += other.todo;
        self.in_progress += other.in_progress;
        self.review += other.review;
        self.done += other.done;
        self.other += other.other;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PriorityCounts {
    fn record(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
        }
    }

    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
        }
    }

    fn merge(&mut self, other: &PriorityCounts) {
        self.low += other.low;
        self.medium += other.medium;
        self.high += other.high;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub project_id: ProjectId,
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    pub overdue: usize,
    pub unassigned: usize,
    pub members: usize,
}

impl ProjectStats {
    pub fn compute(project: &Project, today: NaiveDate) -> Self {
        let mut by_status = StatusCounts::default();
        let mut by_priority = PriorityCounts::default();
        let mut overdue = 0;
        let mut unassigned = 0;
        for task in &project.tasks {
            by_status.record(&task.status);
            by_priority.record(task.priority);
            if task.is_overdue(today) {
                overdue += 1;
            }
            if task.assignees.is_empty() {
                unassigned += 1;
            }
        }
        Self {
            project_id: project.id.clone(),
            total: project.tasks.len(),
            by_status,
            by_priority,
            overdue,
            unassigned,
            members: project.project_members.len(),
        }
    }

    /// Share of tasks that are done, in `0.0..=1.0`. An empty project is 0.
    pub fn completion(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.by_status.done as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub projects: usize,
    pub total_tasks: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    pub overdue: usize,
    /// Open (not done) tasks per assignee id.
    pub open_by_assignee: BTreeMap<UserId, usize>,
}

impl DashboardSummary {
    pub fn compute(projects: &[Project], today: NaiveDate) -> Self {
        let mut summary = Self {
            projects: projects.len(),
            ..Self::default()
        };
        for project in projects {
            let stats = ProjectStats::compute(project, today);
            summary.total_tasks += stats.total;
            summary.by_status.merge(&stats.by_status);
            summary.by_priority.merge(&stats.by_priority);
            summary.overdue += stats.overdue;
            for task in project.tasks.iter().filter(|t| t.status != TaskStatus::Done) {
                for user in &task.assignees {
                    *summary.open_by_assignee.entry(user.id.clone()).or_default() += 1;
                }
            }
        }
        summary
    }

    pub fn completion(&self) -> f64 {
        if self.total_tasks == 0 {
            0.0
        } else {
            self.by_status.done as f64 / self.total_tasks as f64
        }
    }
}
