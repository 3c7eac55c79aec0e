//! # Session Repository
//!
//! Database operations for cash sessions.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cash Session Lifecycle                              │
//! │                                                                         │
//! │  1. OPEN                                                                │
//! │     └── insert() → CashSession { status: Open }                         │
//! │         (idx_cash_sessions_one_open rejects a second OPEN row)          │
//! │                                                                         │
//! │  2. LIVE                                                                │
//! │     └── find_open_for_operator() → read-only, any number of times       │
//! │                                                                         │
//! │  3. CLOSE                                                               │
//! │     └── close() → UPDATE ... WHERE status = 'open'                      │
//! │         0 rows affected = someone else closed it first                  │
//! │                                                                         │
//! │  Closed rows are frozen by trg_cash_sessions_closed_immutable.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use till_core::{AuthorizationMethod, CashSession};

const SESSION_COLUMNS: &str = r#"
    id, company_id, operator_id, opening_balance_cents, status,
    opened_at, closed_at, declared_cash_cents, declared_electronic_cents,
    justification, divergence_cents, cash_divergence_cents, authorized_by
"#;

/// Terminal figures written when a session closes.
#[derive(Debug, Clone)]
pub struct SessionClosure {
    pub session_id: String,
    pub declared_cash_cents: i64,
    pub declared_electronic_cents: i64,
    pub justification: Option<String>,
    pub divergence_cents: i64,
    pub cash_divergence_cents: i64,
    pub authorized_by: Option<AuthorizationMethod>,
    pub closed_at: DateTime<Utc>,
}

// =============================================================================
// Connection-level queries
// =============================================================================
// Shared by SessionRepository (pooled connection) and LedgerTransaction.

pub(crate) async fn insert(conn: &mut SqliteConnection, session: &CashSession) -> DbResult<()> {
    debug!(
        id = %session.id,
        operator_id = %session.operator_id,
        opening_balance_cents = session.opening_balance_cents,
        "Inserting cash session"
    );

    sqlx::query(
        r#"
        INSERT INTO cash_sessions (
            id, company_id, operator_id, opening_balance_cents, status, opened_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&session.id)
    .bind(&session.company_id)
    .bind(&session.operator_id)
    .bind(session.opening_balance_cents)
    .bind(session.status)
    .bind(session.opened_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn find_open_for_operator(
    conn: &mut SqliteConnection,
    operator_id: &str,
) -> DbResult<Option<CashSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE operator_id = ?1 AND status = 'open'"
    );

    let session = sqlx::query_as::<_, CashSession>(&sql)
        .bind(operator_id)
        .fetch_optional(conn)
        .await?;

    Ok(session)
}

pub(crate) async fn get_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<CashSession>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE id = ?1");

    let session = sqlx::query_as::<_, CashSession>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(session)
}

/// Moves an OPEN session to CLOSED. Returns false if it was not open.
pub(crate) async fn close(conn: &mut SqliteConnection, closure: &SessionClosure) -> DbResult<bool> {
    debug!(
        id = %closure.session_id,
        divergence_cents = closure.divergence_cents,
        "Closing cash session"
    );

    let result = sqlx::query(
        r#"
        UPDATE cash_sessions SET
            status = 'closed',
            closed_at = ?2,
            declared_cash_cents = ?3,
            declared_electronic_cents = ?4,
            justification = ?5,
            divergence_cents = ?6,
            cash_divergence_cents = ?7,
            authorized_by = ?8
        WHERE id = ?1 AND status = 'open'
        "#,
    )
    .bind(&closure.session_id)
    .bind(closure.closed_at)
    .bind(closure.declared_cash_cents)
    .bind(closure.declared_electronic_cents)
    .bind(&closure.justification)
    .bind(closure.divergence_cents)
    .bind(closure.cash_divergence_cents)
    .bind(closure.authorized_by)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn list_open_for_company(
    conn: &mut SqliteConnection,
    company_id: &str,
) -> DbResult<Vec<CashSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM cash_sessions \
         WHERE company_id = ?1 AND status = 'open' \
         ORDER BY opened_at DESC"
    );

    let sessions = sqlx::query_as::<_, CashSession>(&sql)
        .bind(company_id)
        .fetch_all(conn)
        .await?;

    Ok(sessions)
}

pub(crate) async fn list_closed_for_company(
    conn: &mut SqliteConnection,
    company_id: &str,
    limit: u32,
) -> DbResult<Vec<CashSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM cash_sessions \
         WHERE company_id = ?1 AND status = 'closed' \
         ORDER BY closed_at DESC \
         LIMIT ?2"
    );

    let sessions = sqlx::query_as::<_, CashSession>(&sql)
        .bind(company_id)
        .bind(limit)
        .fetch_all(conn)
        .await?;

    Ok(sessions)
}

pub(crate) async fn count_for_operator(
    conn: &mut SqliteConnection,
    operator_id: &str,
) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cash_sessions WHERE operator_id = ?1")
        .bind(operator_id)
        .fetch_one(conn)
        .await?;

    Ok(count)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cash session reads and single-statement writes.
///
/// Multi-step work (open with its seed movement, close with its recheck)
/// goes through [`crate::LedgerTransaction`] instead.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// The OPEN session of `operator_id`, if any.
    pub async fn find_open_for_operator(&self, operator_id: &str) -> DbResult<Option<CashSession>> {
        let mut conn = self.pool.acquire().await?;
        find_open_for_operator(&mut conn, operator_id).await
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashSession>> {
        let mut conn = self.pool.acquire().await?;
        get_by_id(&mut conn, id).await
    }

    /// OPEN sessions of a company, most recently opened first.
    pub async fn list_open_for_company(&self, company_id: &str) -> DbResult<Vec<CashSession>> {
        let mut conn = self.pool.acquire().await?;
        list_open_for_company(&mut conn, company_id).await
    }

    /// Last `limit` CLOSED sessions of a company, most recently closed first.
    pub async fn list_closed_for_company(
        &self,
        company_id: &str,
        limit: u32,
    ) -> DbResult<Vec<CashSession>> {
        let mut conn = self.pool.acquire().await?;
        list_closed_for_company(&mut conn, company_id, limit).await
    }

    /// Number of sessions (any status) ever opened by `operator_id`.
    pub async fn count_for_operator(&self, operator_id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        count_for_operator(&mut conn, operator_id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
