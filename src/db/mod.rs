//! Database connection and pool management for the Baufi server
//!
//! This module owns the SQLite handle: it opens the file, applies the
//! durability pragmas on every pooled connection, bootstraps the schema and
//! exposes the WAL checkpoint used by the loan service after each write.

mod schema;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::ConnectOptions;
use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::OnceCell;

pub use schema::SCHEMA_STATEMENTS;

/// Log target used for verbose statement logging
pub const QUERY_LOG_TARGET: &str = "baufi_server::db::query";

/// How long a connection waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connections above the idle bound are closed after this long without use
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Database connection error
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to prepare database directory: {0}")]
    IoError(String),

    #[error("Failed to connect to database: {0}")]
    ConnectionError(String),

    #[error("Failed to initialize schema: {0}")]
    SchemaError(String),

    #[error("Failed to checkpoint database: {0}")]
    CheckpointError(String),

    #[error("Database health check failed: {0}")]
    HealthCheckError(String),
}

/// Everything needed to open the store
#[derive(Debug, Clone)]
pub struct DbSettings {
    /// Database file location
    pub path: PathBuf,
    /// Upper bound on concurrently open connections
    pub max_connections: u32,
    /// Connections retained while idle
    pub max_idle_connections: u32,
    /// Log each statement with its parameters before execution
    pub log_queries: bool,
}

impl DbSettings {
    /// Settings with the default pool bounds for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 25,
            max_idle_connections: 5,
            log_queries: false,
        }
    }
}

/// Handle to an initialized store
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
    log_queries: bool,
}

impl Database {
    /// Open the database, configure the pool and bootstrap the schema.
    ///
    /// On any failure after the pool was created the pool is closed again,
    /// so no half-initialized handle ever escapes.
    pub async fn open(settings: &DbSettings) -> Result<Self, DbError> {
        if let Some(parent) = settings.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| DbError::IoError(e.to_string()))?;
            }
        }

        tracing::info!("Opening database at {}", settings.path.display());

        let options = SqliteConnectOptions::new()
            .filename(&settings.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .foreign_keys(true)
            .pragma("temp_store", "MEMORY")
            .busy_timeout(BUSY_TIMEOUT)
            // Statements are logged by `log_query` when enabled
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.max_idle_connections)
            .idle_timeout(IDLE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let database = Self {
            pool,
            log_queries: settings.log_queries,
        };

        if let Err(e) = database.bootstrap().await {
            database.pool.close().await;
            return Err(e);
        }

        tracing::info!(
            max_connections = settings.max_connections,
            max_idle_connections = settings.max_idle_connections,
            "Database initialized"
        );

        Ok(database)
    }

    async fn bootstrap(&self) -> Result<(), DbError> {
        check_health(&self.pool).await?;

        let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::SchemaError(e.to_string()))?;
        if !journal_mode.eq_ignore_ascii_case("wal") {
            tracing::warn!(journal_mode = %journal_mode, "Database is not in WAL mode");
        }

        for statement in SCHEMA_STATEMENTS {
            self.log_query(statement, &[]);
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DbError::SchemaError(e.to_string()))?;
        }

        tracing::info!("Database tables initialized");
        Ok(())
    }

    /// Fold the write-ahead log into the main database file.
    ///
    /// Called after every successful mutation before it is reported back.
    pub async fn checkpoint(&self) -> Result<(), DbError> {
        const CHECKPOINT: &str = "PRAGMA wal_checkpoint(FULL)";

        self.log_query(CHECKPOINT, &[]);
        let (busy, log_frames, checkpointed): (i64, i64, i64) = sqlx::query_as(CHECKPOINT)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::CheckpointError(e.to_string()))?;

        if busy != 0 {
            // The commit itself is already synced; the remaining frames are
            // folded in by the next checkpoint.
            tracing::warn!(log_frames, checkpointed, "WAL checkpoint could not complete");
        } else {
            tracing::debug!(log_frames, checkpointed, "WAL checkpoint complete");
        }

        Ok(())
    }

    /// Log a statement and its bound parameters when query logging is on
    pub fn log_query(&self, query: &str, args: &[&dyn Debug]) {
        if self.log_queries {
            let query = query.split_whitespace().collect::<Vec<_>>().join(" ");
            tracing::info!(target: QUERY_LOG_TARGET, query = %query, args = ?args, "QUERY");
        }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection. Safe to call more than once.
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::info!("Database closed");
        }
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

/// Check database connectivity (for health checks)
pub async fn check_health(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| DbError::HealthCheckError(e.to_string()))?;

    Ok(())
}

/// One-time initializer for the process-wide store handle.
///
/// The first successful `initialize` wins; later calls hand back the same
/// handle without touching the database. A failed attempt leaves the manager
/// empty so a later call may try again.
#[derive(Debug, Default)]
pub struct DatabaseManager {
    cell: OnceCell<Database>,
}

impl DatabaseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the database unless it is already open
    pub async fn initialize(&self, settings: &DbSettings) -> Result<Database, DbError> {
        let database = self
            .cell
            .get_or_try_init(|| Database::open(settings))
            .await?;
        Ok(database.clone())
    }

    /// The handle, if `initialize` has succeeded
    pub fn get(&self) -> Option<Database> {
        self.cell.get().cloned()
    }

    /// Close the handle if one was opened. Safe to call more than once.
    pub async fn shutdown(&self) {
        if let Some(database) = self.cell.get() {
            database.close().await;
        }
    }
}
