use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::domain::{
    error::Result,
    habit::{Habit, HistoryEntry, UpdateHabit},
    repository::HabitRepository,
};

#[derive(Clone)]
pub struct SqliteHabitRepository {
    pool: SqlitePool,
}

impl SqliteHabitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HabitRepository for SqliteHabitRepository {
    async fn list(&self) -> Result<Vec<Habit>> {
        let rows = sqlx::query("SELECT id, name, streak, completed_today FROM habits ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_habit).collect()
    }

    async fn replace_all(&self, habits: Vec<Habit>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        if habits.is_empty() {
            sqlx::query("DELETE FROM habits").execute(&mut *tx).await?;
            tx.commit().await?;
            return Ok(());
        }
        // upserts come first so the transaction holds the write lock before it reads
        for habit in &habits {
            sqlx::query(
                "INSERT INTO habits (id, name, streak, completed_today) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    streak = excluded.streak,
                    completed_today = excluded.completed_today",
            )
            .bind(habit.id)
            .bind(&habit.name)
            .bind(habit.streak)
            .bind(habit.completed_today)
            .execute(&mut *tx)
            .await?;
        }
        let keep: HashSet<i64> = habits.iter().map(|h| h.id).collect();
        let stored: Vec<i64> = sqlx::query_scalar("SELECT id FROM habits")
            .fetch_all(&mut *tx)
            .await?;
        for id in stored.into_iter().filter(|id| !keep.contains(id)) {
            sqlx::query("DELETE FROM habits WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, id: i64, input: UpdateHabit) -> Result<()> {
        let result = sqlx::query("UPDATE habits SET name = ?2, streak = ?3, completed_today = ?4 WHERE id = ?1")
            .bind(id)
            .bind(&input.name)
            .bind(input.streak)
            .bind(input.completed_today)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            tracing::debug!(habit_id = id, "update of unknown habit");
        }
        Ok(())
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query("SELECT habit_id, date, completed FROM habit_history ORDER BY habit_id, date")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_entry).collect()
    }

    async fn replace_history(&self, entries: Vec<HistoryEntry>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        if entries.is_empty() {
            sqlx::query("DELETE FROM habit_history").execute(&mut *tx).await?;
            tx.commit().await?;
            return Ok(());
        }
        for entry in &entries {
            sqlx::query(
                "INSERT INTO habit_history (habit_id, date, completed) VALUES (?1, ?2, ?3)
                 ON CONFLICT(habit_id, date) DO UPDATE SET completed = excluded.completed",
            )
            .bind(entry.habit_id)
            .bind(&entry.date)
            .bind(entry.completed)
            .execute(&mut *tx)
            .await?;
        }
        let keep: HashSet<(i64, &str)> = entries.iter().map(|e| (e.habit_id, e.date.as_str())).collect();
        let stored: Vec<(i64, String)> = sqlx::query_as("SELECT habit_id, date FROM habit_history")
            .fetch_all(&mut *tx)
            .await?;
        for (habit_id, date) in stored {
            if keep.contains(&(habit_id, date.as_str())) {
                continue;
            }
            sqlx::query("DELETE FROM habit_history WHERE habit_id = ?1 AND date = ?2")
                .bind(habit_id)
                .bind(&date)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn mark_completed(&self, habit_id: i64, date: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO habit_history (habit_id, date, completed) VALUES (?1, ?2, 1)
             ON CONFLICT(habit_id, date) DO UPDATE SET completed = 1",
        )
        .bind(habit_id)
        .bind(date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unmark_completed(&self, habit_id: i64, date: &str) -> Result<()> {
        sqlx::query("DELETE FROM habit_history WHERE habit_id = ?1 AND date = ?2")
            .bind(habit_id)
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_habit(row: &SqliteRow) -> Result<Habit> {
    Ok(Habit {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        streak: row.try_get::<Option<i64>, _>("streak")?.unwrap_or(0),
        completed_today: row.try_get::<Option<bool>, _>("completed_today")?.unwrap_or(false),
    })
}

fn row_to_entry(row: &SqliteRow) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
        habit_id: row.try_get("habit_id")?,
        date: row.try_get("date")?,
        completed: row.try_get::<Option<bool>, _>("completed")?.unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{migrations, sqlite::connect};

    async fn repo() -> SqliteHabitRepository {
        let pool = connect("sqlite::memory:").await.unwrap();
        migrations::run(&pool).await.unwrap();
        SqliteHabitRepository::new(pool)
    }

    fn habit(id: i64, name: &str, streak: i64) -> Habit {
        Habit { id, name: name.into(), streak, completed_today: streak > 0 }
    }

    fn entry(habit_id: i64, date: &str, completed: bool) -> HistoryEntry {
        HistoryEntry { habit_id, date: date.into(), completed }
    }

    #[tokio::test]
    async fn replace_all_yields_exactly_the_submitted_set() {
        let repo = repo().await;
        repo.replace_all(vec![habit(1, "Run", 0), habit(2, "Read", 0), habit(3, "Stretch", 0)]).await.unwrap();
        repo.replace_all(vec![habit(4, "Meditate", 1), habit(2, "Read more", 5)]).await.unwrap();
        assert_eq!(repo.list().await.unwrap(), vec![habit(2, "Read more", 5), habit(4, "Meditate", 1)]);
    }

    #[tokio::test]
    async fn update_touches_one_habit() {
        let repo = repo().await;
        repo.replace_all(vec![habit(1, "Run", 0), habit(2, "Read", 0)]).await.unwrap();
        repo.update(1, UpdateHabit { name: "Run 5k".into(), streak: 3, completed_today: true }).await.unwrap();
        repo.update(9, UpdateHabit { name: "Nope".into(), streak: 1, completed_today: true }).await.unwrap();
        assert_eq!(repo.list().await.unwrap(), vec![habit(1, "Run 5k", 3), habit(2, "Read", 0)]);
    }

    #[tokio::test]
    async fn completion_upsert_and_removal() {
        let repo = repo().await;
        repo.replace_history(vec![entry(1, "2024-01-01", false)]).await.unwrap();
        repo.mark_completed(1, "2024-01-01").await.unwrap();
        repo.mark_completed(1, "2024-01-01").await.unwrap();
        assert_eq!(repo.history().await.unwrap(), vec![entry(1, "2024-01-01", true)]);

        repo.unmark_completed(1, "2024-01-01").await.unwrap();
        repo.unmark_completed(1, "2024-01-01").await.unwrap();
        assert!(repo.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_history_prunes_absent_days() {
        let repo = repo().await;
        repo.replace_history(vec![entry(1, "2024-01-01", true), entry(2, "2024-01-01", true)]).await.unwrap();
        repo.replace_history(vec![entry(2, "2024-01-01", false), entry(2, "2024-01-02", true)]).await.unwrap();
        assert_eq!(
            repo.history().await.unwrap(),
            vec![entry(2, "2024-01-01", false), entry(2, "2024-01-02", true)]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bulk_saves_on_a_file_store_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let pool = connect(&format!("sqlite://{}", dir.path().join("habits.db").display())).await.unwrap();
        migrations::run(&pool).await.unwrap();
        let repo = SqliteHabitRepository::new(pool);
        repo.replace_all(vec![habit(1, "Run", 0), habit(2, "Read", 0)]).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..20i64 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let saved = repo.replace_all(vec![habit(1, "Run", n), habit(2 + n % 3, "Read", 0)]).await;
                let history = repo
                    .replace_history(vec![entry(1, "2024-01-01", n % 2 == 0), entry(1, "2024-01-02", true)])
                    .await;
                (saved, history)
            }));
        }
        for handle in handles {
            let (saved, history) = handle.await.unwrap();
            saved.unwrap();
            history.unwrap();
        }

        let habits = repo.list().await.unwrap();
        assert_eq!(habits.len(), 2);
        assert_eq!(habits[0].id, 1);
        assert_eq!(repo.history().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_bulk_saves_clear_everything() {
        let repo = repo().await;
        repo.replace_all(vec![habit(1, "Run", 0)]).await.unwrap();
        repo.replace_history(vec![entry(1, "2024-01-01", true)]).await.unwrap();
        repo.replace_all(vec![]).await.unwrap();
        repo.replace_history(vec![]).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.history().await.unwrap().is_empty());
    }
}
