use anyhow::Context;
use flow_tracker::{
    application::{habit_service::HabitServiceImpl, task_service::TaskServiceImpl},
    config::Config,
    http::routing::{self, habits, tasks},
    infrastructure::{migrations, sqlite, sqlite_habit_repo::SqliteHabitRepository, sqlite_task_repo::SqliteTaskRepository},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let pool = sqlite::connect(&config.database_url)
        .await
        .with_context(|| format!("opening {}", config.database_url))?;
    migrations::run(&pool).await.context("running migrations")?;

    let task_service = TaskServiceImpl::new(SqliteTaskRepository::new(pool.clone()));
    let habit_service = HabitServiceImpl::new(SqliteHabitRepository::new(pool.clone()));
    let api = routing::api(tasks::TaskState { service: task_service }, habits::HabitState { service: habit_service });
    let router = routing::app(api, &config.frontend_path);

    tracing::info!(addr = %config.bind_addr, database = %config.database_url, "listening");
    axum::serve(tokio::net::TcpListener::bind(config.bind_addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
