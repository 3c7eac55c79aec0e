//! # Ledger Migrations
//!
//! SQL files under `migrations/sqlite/`, compiled into the binary.
//!
//! `001_initial_schema.sql` carries more than tables: the partial unique
//! index behind "one OPEN session per operator", the CHECK constraints on
//! amounts, and the triggers that keep movements and payments append-only
//! and closed sessions frozen. Schema changes go in a new numbered file;
//! applied files are checksummed and must never be edited.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded in `_sqlx_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying ledger migrations");
    MIGRATOR.run(pool).await?;
    info!("Ledger schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
