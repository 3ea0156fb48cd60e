use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::error::{Result, TrackerError};
use crate::domain::habit::{
    flatten_history, nest_history, validate_day, validate_name, Habit, HabitHistoryMap, UpdateHabit,
};
use crate::domain::repository::HabitRepository;

#[async_trait]
pub trait HabitService: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<Habit>>;
    async fn save_all(&self, habits: Vec<Habit>) -> Result<()>;
    async fn update(&self, id: i64, input: UpdateHabit) -> Result<()>;
    async fn history(&self) -> Result<HabitHistoryMap>;
    async fn save_history(&self, history: HabitHistoryMap) -> Result<()>;
    async fn add_completion(&self, habit_id: i64, date: &str) -> Result<()>;
    async fn remove_completion(&self, habit_id: i64, date: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct HabitServiceImpl<R: HabitRepository> {
    repo: R,
}

impl<R: HabitRepository> HabitServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: HabitRepository> HabitService for HabitServiceImpl<R> {
    async fn list(&self) -> Result<Vec<Habit>> { self.repo.list().await }

    async fn save_all(&self, habits: Vec<Habit>) -> Result<()> {
        let mut seen = HashSet::new();
        for habit in &habits {
            validate_name(&habit.name)?;
            if !seen.insert(habit.id) {
                return Err(TrackerError::validation(format!("duplicate habit id {}", habit.id)));
            }
        }
        tracing::debug!(count = habits.len(), "saving habits");
        self.repo.replace_all(habits).await
    }

    async fn update(&self, id: i64, input: UpdateHabit) -> Result<()> {
        validate_name(&input.name)?;
        self.repo.update(id, input).await
    }

    async fn history(&self) -> Result<HabitHistoryMap> {
        Ok(nest_history(self.repo.history().await?))
    }

    async fn save_history(&self, history: HabitHistoryMap) -> Result<()> {
        let entries = flatten_history(history)?;
        tracing::debug!(count = entries.len(), "saving habit history");
        self.repo.replace_history(entries).await
    }

    async fn add_completion(&self, habit_id: i64, date: &str) -> Result<()> {
        validate_day(date)?;
        self.repo.mark_completed(habit_id, date).await
    }

    async fn remove_completion(&self, habit_id: i64, date: &str) -> Result<()> {
        validate_day(date)?;
        self.repo.unmark_completed(habit_id, date).await
    }
}
