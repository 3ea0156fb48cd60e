#[cfg(test)]
mod tests {
    use super::super::habit_service::{HabitService, HabitServiceImpl};
    use crate::domain::{
        error::{Result, TrackerError},
        habit::{Habit, HabitHistoryMap, HistoryEntry, UpdateHabit},
        repository::HabitRepository,
    };
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct InMemoryRepo {
        habits: Arc<Mutex<BTreeMap<i64, Habit>>>,
        history: Arc<Mutex<BTreeMap<(i64, String), bool>>>,
    }

    #[async_trait]
    impl HabitRepository for InMemoryRepo {
        async fn list(&self) -> Result<Vec<Habit>> { Ok(self.habits.lock().unwrap().values().cloned().collect()) }
        async fn replace_all(&self, habits: Vec<Habit>) -> Result<()> {
            *self.habits.lock().unwrap() = habits.into_iter().map(|h| (h.id, h)).collect();
            Ok(())
        }
        async fn update(&self, id: i64, input: UpdateHabit) -> Result<()> {
            if let Some(h) = self.habits.lock().unwrap().get_mut(&id) {
                h.name = input.name;
                h.streak = input.streak;
                h.completed_today = input.completed_today;
            }
            Ok(())
        }
        async fn history(&self) -> Result<Vec<HistoryEntry>> {
            Ok(self.history.lock().unwrap().iter()
                .map(|((habit_id, date), completed)| HistoryEntry { habit_id: *habit_id, date: date.clone(), completed: *completed })
                .collect())
        }
        async fn replace_history(&self, entries: Vec<HistoryEntry>) -> Result<()> {
            *self.history.lock().unwrap() = entries.into_iter().map(|e| ((e.habit_id, e.date), e.completed)).collect();
            Ok(())
        }
        async fn mark_completed(&self, habit_id: i64, date: &str) -> Result<()> {
            self.history.lock().unwrap().insert((habit_id, date.to_string()), true);
            Ok(())
        }
        async fn unmark_completed(&self, habit_id: i64, date: &str) -> Result<()> {
            self.history.lock().unwrap().remove(&(habit_id, date.to_string()));
            Ok(())
        }
    }

    fn habit(id: i64, name: &str) -> Habit { Habit { id, name: name.into(), streak: 0, completed_today: false } }

    #[tokio::test]
    async fn unit_save_all_rejects_duplicate_ids() {
        let service = HabitServiceImpl::new(InMemoryRepo::default());
        let err = service.save_all(vec![habit(1, "Run"), habit(1, "Read")]).await.unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
    }

    #[tokio::test]
    async fn unit_update_unknown_habit_is_noop() {
        let service = HabitServiceImpl::new(InMemoryRepo::default());
        service.save_all(vec![habit(1, "Run")]).await.unwrap();
        service.update(2, UpdateHabit { name: "Swim".into(), streak: 3, completed_today: true }).await.unwrap();
        assert_eq!(service.list().await.unwrap(), vec![habit(1, "Run")]);
    }

    #[tokio::test]
    async fn unit_completion_toggle() {
        let service = HabitServiceImpl::new(InMemoryRepo::default());
        service.add_completion(1, "2024-01-01").await.unwrap();
        let history = service.history().await.unwrap();
        assert_eq!(history["1"]["2024-01-01"], true);

        service.remove_completion(1, "2024-01-01").await.unwrap();
        assert!(service.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unit_invalid_dates_are_rejected() {
        let service = HabitServiceImpl::new(InMemoryRepo::default());
        assert!(service.add_completion(1, "2024-13-01").await.is_err());

        let mut payload = HabitHistoryMap::new();
        payload.entry("1".into()).or_default().insert("someday".into(), true);
        assert!(service.save_history(payload).await.is_err());
    }
}
