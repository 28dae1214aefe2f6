use std::time::Duration;

use sqlx::sqlite::{SqliteConnection, SqlitePoolOptions};

use roster_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Open a pool sized and timed per the database section of the app config.
/// Every pooled connection gets the session pragmas before first use.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .after_connect(|conn, _meta| Box::pin(apply_session_pragmas(conn)))
        .connect(&config.url)
        .await
}

async fn apply_session_pragmas(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    // Cascading deletes depend on foreign_keys; sqlite defaults it to off.
    sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
    Ok(())
}

/// Single-connection in-memory database config. One connection keeps the
/// whole test on the same in-memory database.
#[cfg(test)]
pub(crate) fn memory_config() -> DatabaseConfig {
    DatabaseConfig { url: "sqlite::memory:".to_string(), max_connections: 1, timeout_secs: 30 }
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::{connect, memory_config};

    #[tokio::test]
    async fn pooled_connections_enforce_foreign_keys() {
        let pool = connect(&memory_config()).await.expect("connect");

        let row = sqlx::query("PRAGMA foreign_keys").fetch_one(&pool).await.expect("pragma");
        assert_eq!(row.get::<i64, _>(0), 1, "foreign_keys pragma should be on");
    }

    #[tokio::test]
    async fn zero_connection_limit_is_clamped() {
        let config = roster_core::config::DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 0,
            timeout_secs: 30,
        };
        let pool = connect(&config).await.expect("connect despite zero limit");
        sqlx::query("SELECT 1").execute(&pool).await.expect("usable pool");
    }
}
