//! Relational sink backed by SQLite.
//!
//! Opening the sink drops and recreates the `aptnotes` table, so every run
//! fully replaces the previous contents. Each row is inserted in its own
//! transaction and committed before the next one is taken.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, instrument};

use super::{RecordRow, Sink, SinkError, SinkItem};

/// Table every run writes into.
pub const TABLE_NAME: &str = "aptnotes";

/// SQLite busy timeout in milliseconds.
const BUSY_TIMEOUT_MS: u64 = 5000;

const CREATE_TABLE: &str = "CREATE TABLE aptnotes (
    id integer,
    filename text,
    title text,
    source text,
    splash_url text,
    sha1 text,
    date date,
    file_url text,
    fulltext text,
    creation_date datetime,
    creator_tool text,
    creator_title text
)";

const INSERT_ROW: &str = "INSERT INTO aptnotes (
    id, filename, title, source, splash_url, sha1, date, file_url,
    fulltext, creation_date, creator_tool, creator_title
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Writes one row per item into a SQLite file.
#[derive(Debug)]
pub struct SqliteSink {
    pool: SqlitePool,
    path: PathBuf,
    written: usize,
}

impl SqliteSink {
    /// Opens (creating if missing) the database at `path` and resets the table.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the file cannot be opened or the table
    /// cannot be recreated.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, SinkError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS));
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| SinkError::open(path, e))?;

        reset_table(&pool)
            .await
            .map_err(|e| SinkError::open(path, e))?;
        debug!("table recreated");

        Ok(Self {
            pool,
            path: path.to_path_buf(),
            written: 0,
        })
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert(&self, row: &RecordRow) -> Result<(), SinkError> {
        let id = i64::try_from(row.unique_id).map_err(SinkError::serialize)?;
        let mut tx = self.pool.begin().await?;
        sqlx::query(INSERT_ROW)
            .bind(id)
            .bind(&row.filename)
            .bind(&row.title)
            .bind(&row.source)
            .bind(&row.splash_url)
            .bind(&row.sha1)
            .bind(&row.date)
            .bind(&row.file_url)
            .bind(&row.fulltext)
            .bind(&row.creation_date)
            .bind(&row.creator_tool)
            .bind(&row.creator_title)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn reset_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DROP TABLE IF EXISTS aptnotes")
        .execute(&mut *tx)
        .await?;
    sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;
    tx.commit().await
}

#[async_trait]
impl Sink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn write(&mut self, item: SinkItem) -> Result<(), SinkError> {
        self.insert(&item.to_row()).await?;
        self.written += 1;
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<usize, SinkError> {
        self.pool.close().await;
        debug!(path = %self.path.display(), rows = self.written, "database closed");
        Ok(self.written)
    }
}
