#![allow(dead_code)]

use std::path::Path;

use axum::body::{to_bytes, Body};
use axum::Router;
use flow_tracker::{
    application::{habit_service::HabitServiceImpl, task_service::TaskServiceImpl},
    http::routing::{self, habits, tasks},
    infrastructure::{migrations, sqlite, sqlite_habit_repo::SqliteHabitRepository, sqlite_task_repo::SqliteTaskRepository},
};

pub async fn app_with_frontend(frontend: &Path) -> Router {
    // use in-memory sqlite for tests
    let pool = sqlite::connect("sqlite::memory:").await.unwrap();
    migrations::run(&pool).await.unwrap();
    let api = routing::api(
        tasks::TaskState { service: TaskServiceImpl::new(SqliteTaskRepository::new(pool.clone())) },
        habits::HabitState { service: HabitServiceImpl::new(SqliteHabitRepository::new(pool)) },
    );
    routing::app(api, frontend)
}

pub async fn app() -> Router {
    app_with_frontend(Path::new("does-not-exist.html")).await
}

pub async fn request(app: &Router, method: &str, path: &str, body: Option<serde_json::Value>) -> hyper::Response<Body> {
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    let req = Request::builder().method(Method::from_bytes(method.as_bytes()).unwrap()).uri(path);
    let req = match body {
        Some(json) => req.header("content-type", "application/json").body(Body::from(json.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}

pub async fn json_body(res: hyper::Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&to_bytes(res.into_body(), 1024 * 1024).await.unwrap()).unwrap()
}
