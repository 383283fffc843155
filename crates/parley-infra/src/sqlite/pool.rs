//! SQLite connection pools.
//!
//! A `DatabasePool` opens one database file twice: a read-only pool for
//! queries and a single-connection writer. Both run in WAL mode with foreign
//! keys on, and the writer applies the embedded migrations before the reader
//! is opened.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "parley.db";

const READER_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reader and writer pools over the same SQLite file.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open `{data_dir}/parley.db`, creating and migrating it as needed.
    pub async fn open(data_dir: &Path) -> Result<Self, sqlx::Error> {
        Self::connect(&data_dir.join(DATABASE_FILE)).await
    }

    /// Open the database at `path`.
    pub async fn connect(path: &Path) -> Result<Self, sqlx::Error> {
        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options(path))
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(connect_options(path).read_only(true))
            .await?;

        tracing::debug!(path = %path.display(), "database opened");
        Ok(Self { reader, writer })
    }

    /// Close both pools, waiting for in-flight queries.
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}

fn connect_options(path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(path)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
        .create_if_missing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_names(pool: &DatabasePool) -> Vec<String> {
        sqlx::query_as::<_, (String,)>(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap()
        .into_iter()
        .map(|(name,)| name)
        .collect()
    }

    #[tokio::test]
    async fn test_open_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path()).await.unwrap();

        assert!(dir.path().join(DATABASE_FILE).exists());
        assert_eq!(
            table_names(&pool).await,
            vec!["api_keys", "feedback", "topics", "users"]
        );
        pool.close().await;

        // Reopening an existing database skips applied migrations
        let pool = DatabasePool::open(dir.path()).await.unwrap();
        assert_eq!(table_names(&pool).await.len(), 4);
    }

    #[tokio::test]
    async fn test_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::connect(&dir.path().join("pragmas.db"))
            .await
            .unwrap();

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        let (fk,): (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(fk, 1, "foreign keys should be enabled");
    }

    #[tokio::test]
    async fn test_reader_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path()).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO api_keys (id, key_hash, name, created_at) VALUES ('k', 'h', 'n', 't')",
        )
        .execute(&pool.reader)
        .await;
        assert!(result.is_err());
    }
}
