//! # Movement Repository
//!
//! Append-only access to `cash_movements`. There is no update or delete
//! here; the table triggers would refuse them anyway.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use till_core::CashMovement;

const MOVEMENT_COLUMNS: &str =
    "id, session_id, operator_id, kind, amount_cents, tender, description, created_at";

pub(crate) async fn insert(conn: &mut SqliteConnection, movement: &CashMovement) -> DbResult<()> {
    debug!(
        id = %movement.id,
        session_id = %movement.session_id,
        kind = ?movement.kind,
        tender = ?movement.tender,
        amount_cents = movement.amount_cents,
        "Appending cash movement"
    );

    sqlx::query(
        r#"
        INSERT INTO cash_movements (
            id, session_id, operator_id, kind, amount_cents, tender, description, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.session_id)
    .bind(&movement.operator_id)
    .bind(movement.kind)
    .bind(movement.amount_cents)
    .bind(movement.tender)
    .bind(&movement.description)
    .bind(movement.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Movements of a session in the order they were recorded.
pub(crate) async fn list_for_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> DbResult<Vec<CashMovement>> {
    let sql = format!(
        "SELECT {MOVEMENT_COLUMNS} FROM cash_movements \
         WHERE session_id = ?1 \
         ORDER BY created_at, rowid"
    );

    let movements = sqlx::query_as::<_, CashMovement>(&sql)
        .bind(session_id)
        .fetch_all(conn)
        .await?;

    Ok(movements)
}

/// Movements whose description contains `marker` (exchange correlation ids).
pub(crate) async fn find_by_marker(
    conn: &mut SqliteConnection,
    marker: &str,
) -> DbResult<Vec<CashMovement>> {
    let sql = format!(
        "SELECT {MOVEMENT_COLUMNS} FROM cash_movements \
         WHERE instr(description, ?1) > 0 \
         ORDER BY created_at, rowid"
    );

    let movements = sqlx::query_as::<_, CashMovement>(&sql)
        .bind(marker)
        .fetch_all(conn)
        .await?;

    Ok(movements)
}

/// Repository for cash movements.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Appends a single movement outside of any larger transaction.
    pub async fn insert(&self, movement: &CashMovement) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, movement).await
    }

    /// Movements of a session, oldest first.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        let mut conn = self.pool.acquire().await?;
        list_for_session(&mut conn, session_id).await
    }

    /// Movements tagged with a correlation marker in their description.
    pub async fn find_by_marker(&self, marker: &str) -> DbResult<Vec<CashMovement>> {
        let mut conn = self.pool.acquire().await?;
        find_by_marker(&mut conn, marker).await
    }
}
