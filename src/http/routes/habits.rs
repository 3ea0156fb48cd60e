use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::{routing::{get, post, put}, Json, Router};
use serde_json::{json, Value};

use crate::application::habit_service::HabitService;
use crate::domain::habit::{Habit, HabitHistoryMap, UpdateHabit};
use crate::http::types::ApiError;

#[derive(Clone)]
pub struct HabitState<S: HabitService> { pub service: S }

pub fn router<S: HabitService + Clone>(state: HabitState<S>) -> Router {
    Router::new()
        .route("/habits", get(list_habits::<S>).post(save_habits::<S>))
        .route("/habits/:id", put(update_habit::<S>))
        .route("/habit-history", get(habit_history::<S>).post(save_habit_history::<S>))
        .route("/habit-history/:id/:date", post(add_completion::<S>).delete(remove_completion::<S>))
        .with_state(state)
}

async fn list_habits<S: HabitService>(State(state): State<HabitState<S>>) -> Result<Json<Vec<Habit>>, ApiError> {
    let habits = state.service.list().await.map_err(ApiError::read_failure)?;
    Ok(Json(habits))
}

async fn save_habits<S: HabitService>(
    State(state): State<HabitState<S>>,
    payload: Result<Json<Vec<Habit>>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(habits) = payload?;
    state.service.save_all(habits).await.map_err(ApiError::rejected)?;
    Ok(Json(json!({ "message": "Habits saved successfully" })))
}

async fn update_habit<S: HabitService>(
    State(state): State<HabitState<S>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateHabit>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    state.service.update(id, input).await.map_err(ApiError::rejected)?;
    Ok(Json(json!({ "message": "Habit updated successfully" })))
}

async fn habit_history<S: HabitService>(State(state): State<HabitState<S>>) -> Result<Json<HabitHistoryMap>, ApiError> {
    let history = state.service.history().await.map_err(ApiError::read_failure)?;
    Ok(Json(history))
}

async fn save_habit_history<S: HabitService>(
    State(state): State<HabitState<S>>,
    payload: Result<Json<HabitHistoryMap>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(history) = payload?;
    state.service.save_history(history).await.map_err(ApiError::rejected)?;
    Ok(Json(json!({ "message": "Habit history saved successfully" })))
}

async fn add_completion<S: HabitService>(
    State(state): State<HabitState<S>>,
    path: Result<Path<(i64, String)>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path((habit_id, date)) = path?;
    state.service.add_completion(habit_id, &date).await.map_err(ApiError::rejected)?;
    Ok(Json(json!({ "message": "Habit completion recorded" })))
}

async fn remove_completion<S: HabitService>(
    State(state): State<HabitState<S>>,
    path: Result<Path<(i64, String)>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path((habit_id, date)) = path?;
    state.service.remove_completion(habit_id, &date).await.map_err(ApiError::rejected)?;
    Ok(Json(json!({ "message": "Habit completion removed" })))
}
