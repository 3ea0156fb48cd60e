use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};

use crate::domain::{
    error::{Result, TrackerError},
    repository::TaskRepository,
    task::{completion_after_update, NewSubtask, Subtask, Task, TaskId, TaskRecord, TaskStatus, UpdateTask},
};

const TASK_COLUMNS: &str = "id, title, description, status, CAST(estimated_time AS TEXT) AS estimated_time, \
                            labels, CAST(created_at AS TEXT) AS created_at, completed_at";

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load(&self, sql: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        let mut subtasks = self.subtasks_by_task().await?;
        rows.into_iter()
            .map(|row| -> Result<Task> {
                let mut task = row_to_task(&row)?;
                task.subtasks = subtasks.remove(&task.id.0).unwrap_or_default();
                Ok(task)
            })
            .collect()
    }

    async fn subtasks_by_task(&self) -> Result<HashMap<i64, Vec<Subtask>>> {
        let rows = sqlx::query(
            "SELECT id, task_id, title, status, CAST(estimated_time AS TEXT) AS estimated_time
             FROM subtasks ORDER BY task_id, position, rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut grouped: HashMap<i64, Vec<Subtask>> = HashMap::new();
        for row in rows {
            let subtask = row_to_subtask(&row)?;
            grouped.entry(subtask.task_id.0).or_default().push(subtask);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn list(&self) -> Result<Vec<Task>> {
        self.load(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC")).await
    }

    async fn list_done(&self) -> Result<Vec<Task>> {
        self.load(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE status = 'done'
             ORDER BY COALESCE(completed_at, created_at) DESC"
        ))
        .await
    }

    async fn create(&self, record: TaskRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO tasks (id, title, description, status, estimated_time, labels, created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(record.id.0)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.status.as_str())
        .bind(&record.estimated_time)
        .bind(serde_json::to_string(&record.labels)?)
        .bind(&record.created_at)
        .bind(&record.completed_at)
        .execute(&mut *tx)
        .await?;
        insert_subtasks(&mut *tx, record.id, &record.subtasks).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace(&self, id: TaskId, input: UpdateTask, now: &str) -> Result<()> {
        // first statement must write: the transaction takes the write lock before any read
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE tasks SET title = ?2, description = ?3, status = ?4, estimated_time = ?5, labels = ?6
             WHERE id = ?1",
        )
        .bind(id.0)
        .bind(&input.title)
        .bind(input.description.as_deref().unwrap_or_default())
        .bind(input.status.as_str())
        .bind(&input.estimated_time)
        .bind(serde_json::to_string(input.labels.as_deref().unwrap_or_default())?)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(TrackerError::NotFound { entity: "task", id: id.0 });
        }

        let previous: Option<String> = sqlx::query_scalar("SELECT completed_at FROM tasks WHERE id = ?1")
            .bind(id.0)
            .fetch_one(&mut *tx)
            .await?;
        let completed_at = completion_after_update(previous.as_deref(), input.status, now);
        sqlx::query("UPDATE tasks SET completed_at = ?2 WHERE id = ?1")
            .bind(id.0)
            .bind(&completed_at)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM subtasks WHERE task_id = ?1")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        insert_subtasks(&mut *tx, id, &input.subtasks).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM subtasks WHERE task_id = ?1")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        if result.rows_affected() == 0 {
            tracing::debug!(task_id = %id, "delete of unknown task");
        }
        Ok(())
    }
}

async fn insert_subtasks(conn: &mut SqliteConnection, task_id: TaskId, subtasks: &[NewSubtask]) -> Result<()> {
    for (position, subtask) in subtasks.iter().enumerate() {
        sqlx::query(
            "INSERT INTO subtasks (id, task_id, title, status, estimated_time, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(subtask.id)
        .bind(task_id.0)
        .bind(&subtask.title)
        .bind(subtask.status.as_str())
        .bind(&subtask.estimated_time)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

fn row_to_task(row: &SqliteRow) -> Result<Task> {
    let id: i64 = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    let description: Option<String> = row.try_get("description")?;
    let labels: Option<String> = row.try_get("labels")?;
    Ok(Task {
        id: TaskId(id),
        title: row.try_get("title")?,
        description: description.unwrap_or_default(),
        status: decode_status(&status, id),
        estimated_time: row.try_get("estimated_time")?,
        labels: decode_labels(labels.as_deref(), id),
        created_at: row.try_get::<Option<String>, _>("created_at")?.unwrap_or_default(),
        completed_at: row.try_get("completed_at")?,
        subtasks: Vec::new(),
    })
}

fn row_to_subtask(row: &SqliteRow) -> Result<Subtask> {
    let id: i64 = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    Ok(Subtask {
        id,
        task_id: TaskId(row.try_get("task_id")?),
        title: row.try_get("title")?,
        status: decode_status(&status, id),
        estimated_time: row.try_get("estimated_time")?,
    })
}

fn decode_status(raw: &str, id: i64) -> TaskStatus {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(id, status = raw, "unknown stored status, reading as todo");
        TaskStatus::Todo
    })
}

/// Labels are stored as a JSON array; absent or unreadable values read as empty.
fn decode_labels(raw: Option<&str>, id: i64) -> Vec<String> {
    match raw {
        None | Some("") => Vec::new(),
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|err| {
            tracing::warn!(id, %err, "unreadable labels, reading as empty");
            Vec::new()
        }),
    }
}
