use std::{fs, path::Path, str::FromStr};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Opens the shared pool for `database_url` and creates the file when missing.
///
/// In-memory databases live as long as their connection, so they get exactly
/// one that is never recycled.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    prepare_sqlite_dir(database_url)?;
    // cascades are issued explicitly; history may reference habits not saved yet
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(false);
    let pool = if is_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    Ok(pool.connect_with(options).await?)
}

fn is_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn prepare_sqlite_dir(database_url: &str) -> anyhow::Result<()> {
    if is_memory(database_url) { return Ok(()); }
    let Some(rest) = database_url.strip_prefix("sqlite://").or_else(|| database_url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; }
    }
    Ok(())
}
