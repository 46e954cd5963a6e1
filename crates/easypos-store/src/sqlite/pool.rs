//! # Connection Pool Management
//!
//! Pool creation and embedded migrations for the SQLite backend.
//!
//! WAL journal mode is enabled so report reads never block a checkout
//! write. The pool is built once at startup and owned by the adapter;
//! there is no lazily-created global handle.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Embedded migrations from `migrations/sqlite` at the workspace root.
/// Applied migrations are tracked in `_sqlx_migrations`; running them is
/// idempotent, so connecting twice to the same file is safe.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// SQLite pool configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./easypos.db").max_connections(5);
/// let backend = SqliteBackend::connect(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the database file. Created if it doesn't exist.
    pub database_path: PathBuf,

    /// Maximum pool size. Default 5, plenty for a single POS terminal.
    pub max_connections: u32,

    /// Connections kept alive when idle. Default 1.
    pub min_connections: u32,

    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,

    /// Whether to run migrations on connect. Default true.
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// Isolated in-memory database for tests.
    /// Single connection: each `:memory:` connection is its own database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }
}

/// Builds the pool and applies migrations.
pub(crate) async fn connect(config: &DbConfig) -> StoreResult<SqlitePool> {
    info!(path = %config.database_path.display(), "opening embedded database");

    let url = format!("sqlite://{}?mode=rwc", config.database_path.display());
    let options = SqliteConnectOptions::from_str(&url)
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
        // Readers don't block writers and vice versa.
        .journal_mode(SqliteJournalMode::Wal)
        // Safe from corruption; may lose the last transaction on power loss.
        .synchronous(SqliteSynchronous::Normal)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    debug!(max_connections = config.max_connections, "pool created");

    if config.run_migrations {
        info!("running embedded migrations");
        MIGRATOR.run(&pool).await?;
    }

    Ok(pool)
}
