use std::path::Path;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeFile, trace::TraceLayer};

pub use super::routes::{habits, tasks};

use crate::application::{habit_service::HabitService, task_service::TaskService};

/// All resource routes, unprefixed.
pub fn api<T, H>(task_state: tasks::TaskState<T>, habit_state: habits::HabitState<H>) -> Router
where
    T: TaskService + Clone,
    H: HabitService + Clone,
{
    tasks::router(task_state).merge(habits::router(habit_state))
}

/// Mounts `api` under `/api` next to the health check and serves the frontend at `/`.
pub fn app(api: Router, frontend: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(frontend))
        .nest("/api", Router::new().route("/health", get(health)).merge(api))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Server is running" }))
}
