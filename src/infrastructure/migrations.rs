//! Ordered schema migrations.
//!
//! Every step is safe to re-run: tables are created with `IF NOT EXISTS` and
//! columns are only added when `pragma_table_info` does not list them. This
//! lets stores created before versioning existed (no `schema_migrations`
//! table, some task columns missing) converge on the current schema.

use sqlx::{SqliteConnection, SqlitePool};

use crate::domain::task::now_timestamp;

enum Step {
    Sql(&'static str),
    AddColumn { table: &'static str, column: &'static str, definition: &'static str },
}

pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    steps: &'static [Step],
}

pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_tasks",
        steps: &[Step::Sql(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT DEFAULT '',
                status TEXT NOT NULL,
                estimated_time TEXT,
                labels TEXT DEFAULT '[]',
                created_at TEXT NOT NULL
            )",
        )],
    },
    Migration {
        version: 2,
        name: "create_subtasks",
        steps: &[Step::Sql(
            "CREATE TABLE IF NOT EXISTS subtasks (
                id INTEGER PRIMARY KEY,
                task_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                status TEXT NOT NULL,
                estimated_time TEXT,
                FOREIGN KEY (task_id) REFERENCES tasks (id) ON DELETE CASCADE
            )",
        )],
    },
    Migration {
        version: 3,
        name: "create_habits",
        steps: &[Step::Sql(
            "CREATE TABLE IF NOT EXISTS habits (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                streak INTEGER DEFAULT 0,
                completed_today INTEGER DEFAULT 0
            )",
        )],
    },
    Migration {
        version: 4,
        name: "create_habit_history",
        steps: &[Step::Sql(
            "CREATE TABLE IF NOT EXISTS habit_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                habit_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                completed INTEGER DEFAULT 1,
                UNIQUE(habit_id, date),
                FOREIGN KEY (habit_id) REFERENCES habits (id) ON DELETE CASCADE
            )",
        )],
    },
    Migration {
        version: 5,
        name: "task_description",
        steps: &[Step::AddColumn { table: "tasks", column: "description", definition: "TEXT DEFAULT ''" }],
    },
    Migration {
        version: 6,
        name: "task_labels",
        steps: &[Step::AddColumn { table: "tasks", column: "labels", definition: "TEXT DEFAULT '[]'" }],
    },
    Migration {
        version: 7,
        name: "task_completed_at",
        steps: &[Step::AddColumn { table: "tasks", column: "completed_at", definition: "TEXT" }],
    },
    Migration {
        version: 8,
        name: "subtask_position",
        steps: &[
            Step::AddColumn { table: "subtasks", column: "position", definition: "INTEGER NOT NULL DEFAULT 0" },
            Step::Sql("CREATE INDEX IF NOT EXISTS idx_subtasks_task ON subtasks (task_id, position)"),
        ],
    },
];

/// Applies every migration not yet recorded in `schema_migrations`, in order.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    let applied: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_migrations")
        .fetch_all(pool)
        .await?;

    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(&m.version)) {
        let mut tx = pool.begin().await?;
        for step in migration.steps {
            apply(&mut *tx, step).await?;
        }
        sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)")
            .bind(migration.version)
            .bind(migration.name)
            .bind(now_timestamp())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(version = migration.version, name = migration.name, "applied migration");
    }
    Ok(())
}

async fn apply(conn: &mut SqliteConnection, step: &Step) -> Result<(), sqlx::Error> {
    match step {
        Step::Sql(sql) => {
            sqlx::query(*sql).execute(&mut *conn).await?;
        }
        Step::AddColumn { table, column, definition } => {
            if column_exists(conn, table, column).await? {
                tracing::debug!(table, column, "column already present");
                return Ok(());
            }
            sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

async fn column_exists(conn: &mut SqliteConnection, table: &str, column: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2")
        .bind(table)
        .bind(column)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite::connect;

    async fn columns(pool: &SqlitePool, table: &str) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?1)")
            .bind(table)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[test]
    fn versions_are_strictly_increasing() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn running_twice_is_a_noop() {
        let pool = connect("sqlite::memory:").await.unwrap();
        run(&pool).await.unwrap();
        run(&pool).await.unwrap();
        let recorded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(recorded, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn upgrades_legacy_task_table() {
        let pool = connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            "CREATE TABLE tasks (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                status TEXT NOT NULL,
                estimated_time TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO tasks (id, title, status, created_at) VALUES (1, 'old', 'todo', '2023-01-01')")
            .execute(&pool)
            .await
            .unwrap();

        run(&pool).await.unwrap();

        let cols = columns(&pool, "tasks").await;
        for expected in ["description", "labels", "completed_at"] {
            assert!(cols.iter().any(|c| c == expected), "missing {expected}");
        }
        assert!(columns(&pool, "subtasks").await.iter().any(|c| c == "position"));
        let title: String = sqlx::query_scalar("SELECT title FROM tasks WHERE id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(title, "old");
    }
}
