//! Completed-task history grouped by calendar month.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::task::{Subtask, Task, TaskId};

pub const UNKNOWN_MONTH_KEY: &str = "unknown";
pub const UNKNOWN_MONTH_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTask {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub labels: Vec<String>,
    /// Completion time, or creation time when no completion was recorded.
    pub completed_at: String,
    pub created_at: String,
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthBucket {
    pub month: String,
    pub count: usize,
    pub tasks: Vec<CompletedTask>,
}

/// Month key (`YYYY-MM` or `unknown`) to bucket.
pub type TaskHistory = BTreeMap<String, MonthBucket>;

/// Parses the timestamp shapes clients have stored over time.
///
/// Offsets are kept as written, so a task finished at `2024-01-31T23:30:00-05:00`
/// lands in January. Values without an offset are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))?;
    Some(naive.and_utc().fixed_offset())
}

/// Groups done tasks by the month of their local completion time, most recent
/// instant first within each bucket.
pub fn group_by_month(tasks: Vec<Task>) -> TaskHistory {
    let mut done: Vec<(Option<DateTime<FixedOffset>>, Task)> = tasks
        .into_iter()
        .filter(|t| t.status.is_done())
        .map(|t| {
            let when = parse_timestamp(t.completed_at.as_deref().unwrap_or(&t.created_at));
            (when, t)
        })
        .collect();
    // compares instants; unparsable timestamps sort last
    done.sort_by(|(a, _), (b, _)| b.cmp(a));

    let mut history = TaskHistory::new();
    for (when, task) in done {
        let (key, label) = match when {
            Some(dt) => {
                let local = dt.naive_local();
                (local.format("%Y-%m").to_string(), local.format("%B %Y").to_string())
            }
            None => (UNKNOWN_MONTH_KEY.to_string(), UNKNOWN_MONTH_LABEL.to_string()),
        };
        let bucket = history.entry(key).or_insert_with(|| MonthBucket {
            month: label,
            count: 0,
            tasks: Vec::new(),
        });
        bucket.count += 1;
        bucket.tasks.push(CompletedTask {
            id: task.id,
            title: task.title,
            description: task.description,
            estimated_time: task.estimated_time,
            labels: task.labels,
            completed_at: task.completed_at.unwrap_or_else(|| task.created_at.clone()),
            created_at: task.created_at,
            subtasks: task.subtasks,
        });
    }
    history
}
