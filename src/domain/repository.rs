use async_trait::async_trait;

use super::error::Result;
use super::habit::{Habit, HistoryEntry, UpdateHabit};
use super::task::{Task, TaskId, TaskRecord, UpdateTask};

#[async_trait]
pub trait TaskRepository: Send + Sync + 'static {
    /// All tasks, newest first, with subtasks in submitted order.
    async fn list(&self) -> Result<Vec<Task>>;
    async fn list_done(&self) -> Result<Vec<Task>>;
    async fn create(&self, record: TaskRecord) -> Result<()>;
    /// Overwrites the task and its subtasks. Fails with `NotFound` for unknown ids.
    async fn replace(&self, id: TaskId, input: UpdateTask, now: &str) -> Result<()>;
    /// Removes the task and its subtasks. Unknown ids are a no-op.
    async fn delete(&self, id: TaskId) -> Result<()>;
}

#[async_trait]
pub trait HabitRepository: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<Habit>>;
    /// Makes the stored habit set exactly `habits`.
    async fn replace_all(&self, habits: Vec<Habit>) -> Result<()>;
    /// Unknown ids are a no-op.
    async fn update(&self, id: i64, input: UpdateHabit) -> Result<()>;
    async fn history(&self) -> Result<Vec<HistoryEntry>>;
    /// Makes the stored history exactly `entries`.
    async fn replace_history(&self, entries: Vec<HistoryEntry>) -> Result<()>;
    async fn mark_completed(&self, habit_id: i64, date: &str) -> Result<()>;
    async fn unmark_completed(&self, habit_id: i64, date: &str) -> Result<()>;
}
