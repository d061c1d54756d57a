use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type UserId = String;
pub type ProjectId = String;
pub type TaskId = String;
pub type MessageId = String;

/// Backend ids arrive as either JSON strings or integers.
fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Patch fields: a present key, even `null`, is `Some`; only a missing key
/// (via `#[serde(default)]`) leaves the field untouched.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn present_due_date<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    de_due_date(deserializer).map(Some)
}

/// Accepts `YYYY-MM-DD`, an RFC 3339 timestamp, an empty string or null.
fn de_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.with_timezone(&Utc).date_naive()))
        .map_err(|e| D::Error::custom(format!("invalid due_date '{}': {}", raw, e)))
}

// ── Users and members ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "de_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_roles: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suspended: bool,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role) || self.user_roles.iter().any(|r| r == role)
    }
}

fn default_access_role() -> String {
    "member".to_string()
}

/// A user's membership in one project. `user` is a copy taken when the
/// member was assigned; later profile edits do not flow into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    #[serde(default = "default_access_role")]
    pub access_role: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn snapshot(user: &User, access_role: &str) -> Self {
        Self {
            user: user.clone(),
            access_role: access_role.to_string(),
            created_at: Utc::now(),
        }
    }
}

// ── Task status and priority ──────────────────────────────────────────

/// Workflow state of a task, doubling as the board column it renders in.
///
/// Values outside the four board columns are kept verbatim in `Other` so a
/// project coming back from the server never fails to decode; such tasks
/// are excluded from every column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
    Other(String),
}

impl TaskStatus {
    /// Board columns in display order.
    pub const COLUMNS: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Review => "Review",
            Self::Done => "Done",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_column(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Lenient mapping used for wire data: unknown strings become `Other`.
    pub fn from_wire(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| Self::Other(s.to_string()))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "de_id")]
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignees: Vec<User>,
    #[serde(rename = "createdAt", alias = "created_at", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_due_date"
    )]
    pub due_date: Option<NaiveDate>,
}

impl Task {
    pub(crate) fn from_new(new: NewTask, id: TaskId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            status: new.status.unwrap_or_default(),
            priority: new.priority,
            assignees: new.assignees,
            created_at,
            due_date: new.due_date,
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| due < today)
    }

    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignees.iter().any(|u| u.id == user_id)
    }
}

/// A task as supplied by a caller, before the store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default, deserialize_with = "de_due_date")]
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_assignee(mut self, user: &User) -> Self {
        self.assignees.push(user.clone());
        self
    }
}

/// Partial task update. Unset fields are left untouched; `id` and
/// `created_at` cannot be patched. In JSON an explicit `null` clears
/// `description` or `due_date`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignees: Option<Vec<User>>,
    #[serde(default, deserialize_with = "present_due_date")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = &self.status {
            task.status = status.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assignees) = &self.assignees {
            task.assignees = assignees.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

// ── Projects ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "de_id")]
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "createdAt", alias = "created_at", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Project {
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub(crate) fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.project_members.iter().any(|m| m.user.id == user_id)
    }

    /// Drop repeated members, keeping the first entry per `user.id`.
    pub(crate) fn dedupe_members(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.project_members.retain(|m| seen.insert(m.user.id.clone()));
    }
}

/// Input for creating a project on the server.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub member_ids: Vec<UserId>,
    pub image: Option<ImageUpload>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Raw image bytes attached to a project-creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Partial project update applied locally.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
    #[serde(default)]
    pub project_members: Option<Vec<Member>>,
}

impl ProjectPatch {
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(image) = &self.image {
            project.image = image.clone();
        }
        if let Some(members) = &self.project_members {
            project.project_members = members.clone();
            project.dedupe_members();
        }
    }
}

// ── Chat ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    #[serde(rename = "projectId")]
    pub project_id: ProjectId,
    pub message: String,
    pub sender: String,
    pub timestamp: DateTime<Utc>,
}

// ── View types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub project_id: ProjectId,
    pub project_name: String,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnView {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: format!("User {}", id),
            email: format!("{}@example.com", id),
            profile_pic: None,
            role: None,
            user_roles: vec![],
            suspended: false,
        }
    }

    #[test]
    fn test_status_round_trips_board_values() {
        for status in TaskStatus::COLUMNS {
            let json = serde_json::to_string(&status).unwrap();
            let back: TaskStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
    }

    #[test]
    fn test_unknown_status_is_kept_as_other() {
        let status: TaskStatus = serde_json::from_str("\"blocked\"").unwrap();
        assert_eq!(status, TaskStatus::Other("blocked".to_string()));
        assert!(!status.is_column());
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"blocked\"");
    }

    #[test]
    fn test_status_from_str_rejects_unknown() {
        assert!("blocked".parse::<TaskStatus>().is_err());
        assert_eq!("review".parse::<TaskStatus>(), Ok(TaskStatus::Review));
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert!(err.contains("Invalid priority"));
    }

    #[test]
    fn test_project_deserializes_backend_shape() {
        let json = serde_json::json!({
            "id": 17,
            "name": "Website",
            "description": null,
            "createdAt": "2024-03-01T10:00:00Z",
            "tasks": [{
                "id": "t1",
                "title": "Fix bug",
                "status": "todo",
                "priority": "high",
                "assignees": null,
                "createdAt": "2024-03-02T10:00:00Z",
                "due_date": "2024-03-10T00:00:00.000Z"
            }],
            "project_members": [{
                "user": {"id": 3, "name": "Ana", "email": "ana@example.com", "suspended": null},
                "access_role": "owner",
                "created_at": "2024-03-01T10:00:00Z"
            }]
        });
        let project: Project = serde_json::from_value(json).unwrap();
        assert_eq!(project.id, "17");
        assert_eq!(project.tasks.len(), 1);
        assert!(project.tasks[0].assignees.is_empty());
        assert_eq!(
            project.tasks[0].due_date,
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
        assert_eq!(project.project_members[0].user.id, "3");
        assert!(!project.project_members[0].user.suspended);
        assert!(project.image.is_none());
    }

    #[test]
    fn test_task_serializes_created_at_in_camel_case() {
        let task = Task::from_new(NewTask::new("Write docs"), "t9".into(), Utc::now());
        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("due_date").is_none());
        assert_eq!(value["status"], "todo");
        assert_eq!(value["priority"], "medium");
    }

    #[test]
    fn test_empty_task_patch_changes_nothing() {
        let mut task = Task::from_new(
            NewTask::new("Ship").with_priority(Priority::High),
            "t1".into(),
            Utc::now(),
        );
        let before = task.clone();
        let patch = TaskPatch::default();
        assert!(patch.is_empty());
        patch.apply(&mut task);
        assert_eq!(task, before);
    }

    #[test]
    fn test_task_patch_only_touches_set_fields() {
        let mut task = Task::from_new(
            NewTask::new("Ship")
                .with_description("release notes")
                .with_priority(Priority::Low),
            "t1".into(),
            Utc::now(),
        );
        let patch = TaskPatch {
            priority: Some(Priority::High),
            description: Some(None),
            ..TaskPatch::default()
        };
        patch.apply(&mut task);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.description, None);
        assert_eq!(task.title, "Ship");
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn test_project_patch_dedupes_members() {
        let mut project = Project {
            id: "p1".into(),
            name: "Alpha".into(),
            description: None,
            created_at: Utc::now(),
            tasks: vec![],
            project_members: vec![],
            image: None,
        };
        let ana = user("1");
        let patch = ProjectPatch {
            project_members: Some(vec![
                Member::snapshot(&ana, "owner"),
                Member::snapshot(&ana, "viewer"),
                Member::snapshot(&user("2"), "member"),
            ]),
            ..ProjectPatch::default()
        };
        patch.apply(&mut project);
        assert_eq!(project.project_members.len(), 2);
        assert_eq!(project.project_members[0].access_role, "owner");
    }

    #[test]
    fn test_task_patch_json_null_clears_and_missing_keeps() -> anyhow::Result<()> {
        let mut task = Task::from_new(
            NewTask::new("Ship")
                .with_description("release notes")
                .with_due_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
            "t1".into(),
            Utc::now(),
        );

        let keep: TaskPatch = serde_json::from_str(r#"{"title": "Ship v2"}"#)?;
        assert_eq!(keep.description, None);
        assert_eq!(keep.due_date, None);
        keep.apply(&mut task);
        assert_eq!(task.description.as_deref(), Some("release notes"));
        assert!(task.due_date.is_some());

        let clear: TaskPatch = serde_json::from_str(r#"{"description": null, "due_date": null}"#)?;
        assert_eq!(clear.description, Some(None));
        assert_eq!(clear.due_date, Some(None));
        clear.apply(&mut task);
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.title, "Ship v2");

        let set: TaskPatch = serde_json::from_str(r#"{"due_date": "2024-06-02"}"#)?;
        assert_eq!(set.due_date, Some(NaiveDate::from_ymd_opt(2024, 6, 2)));
        Ok(())
    }

    #[test]
    fn test_project_patch_json_null_clears_image() -> anyhow::Result<()> {
        let mut project = Project {
            id: "p1".into(),
            name: "Alpha".into(),
            description: Some("first".into()),
            created_at: Utc::now(),
            tasks: vec![],
            project_members: vec![],
            image: Some("/uploads/logo.png".into()),
        };
        let patch: ProjectPatch = serde_json::from_str(r#"{"image": null}"#)?;
        assert_eq!(patch.image, Some(None));
        assert_eq!(patch.description, None);
        patch.apply(&mut project);
        assert_eq!(project.image, None);
        assert_eq!(project.description.as_deref(), Some("first"));
        Ok(())
    }

    #[test]
    fn test_member_snapshot_does_not_follow_user_edits() {
        let mut ana = user("1");
        let member = Member::snapshot(&ana, "member");
        ana.name = "Ana Renamed".to_string();
        assert_eq!(member.user.name, "User 1");
    }

    #[test]
    fn test_overdue_ignores_done_tasks() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 5, 9).unwrap();
        let mut task = Task::from_new(
            NewTask::new("Late").with_due_date(yesterday),
            "t1".into(),
            Utc::now(),
        );
        assert!(task.is_overdue(today));
        task.status = TaskStatus::Done;
        assert!(!task.is_overdue(today));
    }

    #[test]
    fn test_user_roles() {
        let mut u = user("1");
        u.user_roles = vec!["admin".to_string()];
        assert!(u.has_role("admin"));
        assert!(!u.has_role("owner"));
    }
}
