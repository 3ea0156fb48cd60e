use async_trait::async_trait;

use crate::domain::error::Result;
use crate::domain::history::{group_by_month, TaskHistory};
use crate::domain::repository::TaskRepository;
use crate::domain::task::{now_timestamp, CreateTask, Task, TaskId, UpdateTask};

#[async_trait]
pub trait TaskService: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<Task>>;
    async fn create(&self, input: CreateTask) -> Result<TaskId>;
    async fn update(&self, id: TaskId, input: UpdateTask) -> Result<()>;
    async fn delete(&self, id: TaskId) -> Result<()>;
    async fn history(&self) -> Result<TaskHistory>;
}

#[derive(Clone)]
pub struct TaskServiceImpl<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TaskRepository> TaskService for TaskServiceImpl<R> {
    async fn list(&self) -> Result<Vec<Task>> { self.repo.list().await }

    async fn create(&self, input: CreateTask) -> Result<TaskId> {
        let record = input.into_record(&now_timestamp())?;
        let id = record.id;
        self.repo.create(record).await?;
        tracing::debug!(task_id = %id, "task created");
        Ok(id)
    }

    async fn update(&self, id: TaskId, input: UpdateTask) -> Result<()> {
        input.validate()?;
        self.repo.replace(id, input, &now_timestamp()).await
    }

    async fn delete(&self, id: TaskId) -> Result<()> { self.repo.delete(id).await }

    async fn history(&self) -> Result<TaskHistory> {
        let done = self.repo.list_done().await?;
        Ok(group_by_month(done))
    }
}
