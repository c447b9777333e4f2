/// Task model for the kanban board
///
/// Tasks move between three fixed columns. Status changes arrive either from
/// the edit modal or from a drag-and-drop onto another column.
///
/// # Board Columns
///
/// ```text
/// todo ⇄ doing ⇄ done
/// ```
///
/// Any column may be reached from any other; the board only rejects drop
/// targets that are not one of the three column ids.
///
/// # Wire Format
///
/// ```json
/// {
///   "id": "1718000000000",
///   "title": "Design landing page",
///   "description": "Create mockups for new product page",
///   "status": "todo",
///   "priority": "high",
///   "assignee_id": "2",
///   "assignee_name": "Jane Smith",
///   "due_date": "2024-01-20",
///   "created_at": "2024-01-10T09:00:00Z"
/// }
/// ```
///
/// # Example
///
/// ```
/// use pulsehq_shared::models::task::{Task, TaskPatch, TaskStatus};
///
/// let mut task = Task::new("1", "Ship release");
/// assert_eq!(task.status, TaskStatus::Todo);
///
/// task.apply_patch(&TaskPatch {
///     status: Some(TaskStatus::Doing),
///     ..Default::default()
/// });
/// assert_eq!(task.status, TaskStatus::Doing);
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Kanban column a task currently sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Todo,

    /// In progress
    #[serde(alias = "in-progress")]
    Doing,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Every column, in board order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::Doing, TaskStatus::Done];

    /// Converts status to its column id
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
        }
    }

    /// Column heading shown on the board
    pub fn title(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To-Do",
            TaskStatus::Doing => "Doing",
            TaskStatus::Done => "Done",
        }
    }

    /// Parses a column id; `None` for anything outside the board
    pub fn from_column_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == id)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task model representing one card on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Client-generated id (see [`crate::models::generate_id`])
    pub id: String,

    /// Card title
    pub title: String,

    /// Optional longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current column
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority badge
    #[serde(default)]
    pub priority: TaskPriority,

    /// Assigned team member (None means unassigned)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    /// Denormalized assignee display name
    #[serde(default, alias = "assignee", skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,

    /// Optional due date
    #[serde(
        default,
        alias = "dueDate",
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,

    /// When the task was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Partial update for a task
///
/// Only `Some` fields are merged. Clearable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Option<String>>,
    pub assignee_name: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    /// Patch that only moves the task to another column
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Task {
    /// Creates an unassigned task in the `todo` column
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assignee_id: None,
            assignee_name: None,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    /// Whether nobody is assigned
    pub fn is_unassigned(&self) -> bool {
        self.assignee_id.is_none()
    }

    /// Shallow-merges a patch into this task
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(assignee_id) = &patch.assignee_id {
            self.assignee_id = assignee_id.clone();
        }
        if let Some(assignee_name) = &patch.assignee_name {
            self.assignee_name = assignee_name.clone();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
    }
}

/// Older snapshots store an unset due date as an empty string
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
