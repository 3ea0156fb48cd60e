use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::{get, put}, Json, Router};
use serde_json::{json, Value};

use crate::application::task_service::TaskService;
use crate::domain::history::TaskHistory;
use crate::domain::task::{CreateTask, Task, TaskId, UpdateTask};
use crate::http::types::ApiError;

#[derive(Clone)]
pub struct TaskState<S: TaskService> { pub service: S }

pub fn router<S: TaskService + Clone>(state: TaskState<S>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks::<S>).post(create_task::<S>))
        .route("/tasks/history", get(task_history::<S>))
        .route("/tasks/:id", put(update_task::<S>).delete(delete_task::<S>))
        .with_state(state)
}

async fn list_tasks<S: TaskService>(State(state): State<TaskState<S>>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.service.list().await.map_err(ApiError::read_failure)?;
    Ok(Json(tasks))
}

async fn create_task<S: TaskService>(
    State(state): State<TaskState<S>>,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(input) = payload?;
    let id = state.service.create(input).await.map_err(ApiError::rejected)?;
    Ok((StatusCode::CREATED, Json(json!({ "message": "Task created successfully", "id": id }))))
}

async fn update_task<S: TaskService>(
    State(state): State<TaskState<S>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    state.service.update(TaskId(id), input).await.map_err(ApiError::rejected)?;
    Ok(Json(json!({ "message": "Task updated successfully" })))
}

async fn delete_task<S: TaskService>(
    State(state): State<TaskState<S>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = path?;
    state.service.delete(TaskId(id)).await.map_err(ApiError::rejected)?;
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

async fn task_history<S: TaskService>(State(state): State<TaskState<S>>) -> Result<Json<TaskHistory>, ApiError> {
    let history = state.service.history().await.map_err(ApiError::read_failure)?;
    Ok(Json(history))
}
