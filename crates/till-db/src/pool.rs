//! # Ledger Store Handle
//!
//! Opens the SQLite ledger, applies migrations and hands out repositories
//! and ledger transactions.
//!
//! ## Connection Settings
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ledger Connection Setup                            │
//! │                                                                         │
//! │  DbConfig::new("till.db")           DbConfig::in_memory()               │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  WAL journal, NORMAL sync           one connection, never recycled      │
//! │  foreign keys ON                    (the database lives in it)          │
//! │  busy_timeout for writers                                               │
//! │       │                                  │                              │
//! │       └──────────────┬───────────────────┘                              │
//! │                      ▼                                                  │
//! │               Database::new ──► migrations ──► ready                    │
//! │                                                                         │
//! │  Reads:   db.sessions() / movements() / sales() / companies()           │
//! │  Writes:  db.begin() ──► BEGIN IMMEDIATE ──► commit                     │
//! │  Snapshot: db.begin_read() ──► consistent reads ──► rollback            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::ledger::{LedgerTransaction, BEGIN_WRITE};
use crate::migrations;
use crate::repository::{
    CompanyRepository, MovementRepository, SaleRepository, SessionRepository,
};

// =============================================================================
// Configuration
// =============================================================================

/// Ledger store configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/till/till.db").max_connections(5);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file; created when missing.
    pub database_path: PathBuf,

    /// Pool size. A single till rarely needs more than a handful.
    pub max_connections: u32,

    pub min_connections: u32,

    /// How long an operation waits for a pooled connection.
    pub acquire_timeout: Duration,

    /// How long a writer waits on SQLite's lock before failing busy.
    pub busy_timeout: Duration,

    /// `None` keeps idle connections forever (required in memory).
    pub idle_timeout: Option<Duration>,

    /// Apply embedded migrations on connect.
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// A private in-memory ledger (tests, demo).
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool
    /// holds exactly one connection and never lets it go. Concurrent callers
    /// queue for it, which serializes transactions.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the ledger store. Clones share one pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./till.db")).await?;
///
/// let open = db.sessions().find_open_for_operator("op-1").await?;
///
/// let mut tx = db.begin().await?;
/// tx.insert_session(&session).await?;
/// tx.insert_movement(&opening).await?;
/// tx.commit().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and, unless disabled, migrates.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening ledger store"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let mut options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        // WAL needs a file; an in-memory database keeps its default journal.
        if !config.is_in_memory() {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout);

        if config.is_in_memory() {
            pool_options = pool_options.max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            in_memory = config.is_in_memory(),
            "Ledger pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for statements no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begins a write transaction; dropping it without `commit` rolls back.
    ///
    /// Takes SQLite's write lock up front (`BEGIN IMMEDIATE`). A second
    /// writer waits up to `busy_timeout` for it and then reads the committed
    /// state, so its state checks see the first writer's effects.
    pub async fn begin(&self) -> DbResult<LedgerTransaction> {
        let tx = self
            .pool
            .begin_with(BEGIN_WRITE)
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(LedgerTransaction::new(tx))
    }

    /// Begins a read-only snapshot. Callers roll it back when done.
    pub async fn begin_read(&self) -> DbResult<LedgerTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(LedgerTransaction::new(tx))
    }

    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.pool.clone())
    }

    pub fn movements(&self) -> MovementRepository {
        MovementRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    pub fn companies(&self) -> CompanyRepository {
        CompanyRepository::new(self.pool.clone())
    }

    /// Closes the pool. Later operations fail.
    pub async fn close(&self) {
        info!("Closing ledger store");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_ledger_is_healthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_migrations_applied() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();

        assert!(total >= 1);
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/till-test.db")
            .max_connections(10)
            .busy_timeout(Duration::from_secs(1));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
        assert!(DbConfig::in_memory().idle_timeout.is_none());
    }
}
