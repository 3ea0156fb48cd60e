use std::{fmt, str::FromStr};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::error::{Result, TrackerError};

/// Client-chosen task identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    #[serde(alias = "in_progress", alias = "inprogress")]
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl FromStr for TaskStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" | "in_progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(TrackerError::validation(format!("unknown status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: i64,
    pub task_id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub estimated_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub estimated_time: Option<String>,
    pub labels: Vec<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewSubtask {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<NewSubtask>,
}

/// Full replacement of a task's fields and subtasks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub subtasks: Vec<NewSubtask>,
}

/// A task row ready to be written, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub estimated_time: Option<String>,
    pub labels: Vec<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub subtasks: Vec<NewSubtask>,
}

impl CreateTask {
    pub fn into_record(self, now: &str) -> Result<TaskRecord> {
        validate_titles(&self.title, &self.subtasks)?;
        let completed_at = if self.status.is_done() {
            Some(self.completed_at.unwrap_or_else(|| now.to_string()))
        } else {
            None
        };
        Ok(TaskRecord {
            id: self.id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            status: self.status,
            estimated_time: self.estimated_time,
            labels: self.labels.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_else(|| now.to_string()),
            completed_at,
            subtasks: self.subtasks,
        })
    }
}

impl UpdateTask {
    pub fn validate(&self) -> Result<()> {
        validate_titles(&self.title, &self.subtasks)
    }
}

fn validate_titles(title: &str, subtasks: &[NewSubtask]) -> Result<()> {
    if title.trim().is_empty() {
        return Err(TrackerError::validation("title must not be empty"));
    }
    if let Some(st) = subtasks.iter().find(|st| st.title.trim().is_empty()) {
        return Err(TrackerError::validation(format!("subtask {} has an empty title", st.id)));
    }
    Ok(())
}

/// Completion timestamp a task carries after an update to `status`.
///
/// Stamped on the transition into `done`, kept while the task stays done,
/// cleared once it leaves `done`.
pub fn completion_after_update(previous: Option<&str>, status: TaskStatus, now: &str) -> Option<String> {
    if !status.is_done() {
        return None;
    }
    Some(previous.unwrap_or(now).to_string())
}

/// Current UTC time in the format the frontend produces (`2024-01-01T09:30:00.000Z`).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
