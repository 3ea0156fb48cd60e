pub mod migrations;
pub mod sqlite;
pub mod sqlite_habit_repo;
pub mod sqlite_task_repo;
