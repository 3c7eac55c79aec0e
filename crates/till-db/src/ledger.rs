//! # Ledger Transaction
//!
//! A single SQLite transaction exposing the ledger writes and reads that
//! must see each other: open (session + seed movement), close (recompute +
//! conditional update) and the three-entry tender exchange.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     LedgerTransaction                                   │
//! │                                                                         │
//! │  db.begin() ──► BEGIN IMMEDIATE  (write lock held until the end)        │
//! │                   │                                                     │
//! │                   ├── insert_sale_record()   ┐                          │
//! │                   ├── insert_movement()      │ all on one connection    │
//! │                   ├── insert_movement()      ┘                          │
//! │                   │                                                     │
//! │         commit() ─┴─► COMMIT      (all effects visible)                 │
//! │         error / drop ─► ROLLBACK  (no effects visible)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every read inside a transaction goes through the transaction's own
//! connection. Using the pool while a transaction is held would deadlock an
//! in-memory (single connection) database.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{company, movement, sale, session, SessionClosure};
use till_core::{CashMovement, CashSession, Company, Operator, SaleRecord};

/// Opening statement for write transactions.
pub(crate) const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// An open ledger transaction. Rolls back when dropped without `commit`.
pub struct LedgerTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl LedgerTransaction {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        LedgerTransaction { tx }
    }

    // -------------------------------------------------------------------------
    // Sessions
    // -------------------------------------------------------------------------

    pub async fn insert_session(&mut self, s: &CashSession) -> DbResult<()> {
        session::insert(&mut self.tx, s).await
    }

    pub async fn find_open_session(&mut self, operator_id: &str) -> DbResult<Option<CashSession>> {
        session::find_open_for_operator(&mut self.tx, operator_id).await
    }

    /// Writes the terminal figures; `false` when the session is no longer open.
    pub async fn close_session(&mut self, closure: &SessionClosure) -> DbResult<bool> {
        session::close(&mut self.tx, closure).await
    }

    // -------------------------------------------------------------------------
    // Movements & sales
    // -------------------------------------------------------------------------

    pub async fn insert_movement(&mut self, m: &CashMovement) -> DbResult<()> {
        movement::insert(&mut self.tx, m).await
    }

    pub async fn list_movements(&mut self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        movement::list_for_session(&mut self.tx, session_id).await
    }

    pub async fn insert_sale_record(&mut self, record: &SaleRecord) -> DbResult<()> {
        sale::insert_record(&mut self.tx, record).await
    }

    pub async fn list_sales_since(
        &mut self,
        operator_id: &str,
        since: DateTime<Utc>,
    ) -> DbResult<Vec<SaleRecord>> {
        sale::list_since(&mut self.tx, operator_id, since).await
    }

    // -------------------------------------------------------------------------
    // Companies & operators
    // -------------------------------------------------------------------------

    pub async fn get_company(&mut self, id: &str) -> DbResult<Option<Company>> {
        company::get_company(&mut self.tx, id).await
    }

    pub async fn get_operator(&mut self, id: &str) -> DbResult<Option<Operator>> {
        company::get_operator(&mut self.tx, id).await
    }

    pub async fn admin_credential_hash(&mut self, company_id: &str) -> DbResult<Option<String>> {
        company::admin_credential_hash(&mut self.tx, company_id).await
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Ledger transaction committed");
        Ok(())
    }

    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Ledger transaction rolled back");
        Ok(())
    }
}
