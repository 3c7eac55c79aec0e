//! # Cash Desk
//!
//! The session state machine: open, status, preview and close.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cash Session States                                │
//! │                                                                         │
//! │            open(float ≥ 0)                                              │
//! │   (none) ──────────────────► OPEN ─────────────────────► CLOSED         │
//! │                               │      close(count, ...)     (terminal)   │
//! │                               │                                         │
//! │                               └── preview_close: no state change        │
//! │                                                                         │
//! │   open while OPEN    ──► InvalidState (fast path + unique index)        │
//! │   close while CLOSED ──► InvalidState (conditional UPDATE)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Close Transaction
//! ```text
//! BEGIN
//!   find OPEN session ─► recompute balances ─► breakdown
//!   divergent? ─► justification ─► credential via AuthorizationGate
//!   UPDATE ... WHERE status = 'open'   (0 rows ⇒ someone else closed it)
//! COMMIT
//! ```
//! The divergence is always recomputed here; a flag from the client is
//! never trusted.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use till_core::closing::{check_close_requirements, CloseApproval};
use till_core::validation::validate_opening_balance;
use till_core::{
    compute_expected_balances, AuthorizationMethod, Balances, CashMovement, CashSession,
    ClosingBreakdown, CoreError, CredentialSource, DeclaredCount, Money, MovementKind,
    MovementTender, SessionStatus,
};
use till_db::{Database, LedgerTransaction, SessionClosure};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::gate::AuthorizationGate;
use crate::identity::Identity;

// =============================================================================
// Views & Requests
// =============================================================================

/// The caller's OPEN session with its live balances.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusView {
    pub session: CashSession,
    pub balances: Balances,
    /// Newest first.
    pub movements: Vec<CashMovement>,
}

/// What the operator submits to close the drawer.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRequest {
    pub declared_cash: Money,
    pub declared_electronic: Money,
    #[serde(default)]
    pub justification: Option<String>,
    /// Manager credential in clear; only ever handed to the gate.
    #[serde(default)]
    pub credential: Option<String>,
}

impl CloseRequest {
    pub fn new(declared_cash: Money, declared_electronic: Money) -> Self {
        CloseRequest {
            declared_cash,
            declared_electronic,
            justification: None,
            credential: None,
        }
    }

    pub fn justification(mut self, text: impl Into<String>) -> Self {
        self.justification = Some(text.into());
        self
    }

    pub fn credential(mut self, secret: impl Into<String>) -> Self {
        self.credential = Some(secret.into());
        self
    }
}

impl fmt::Debug for CloseRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseRequest")
            .field("declared_cash", &self.declared_cash)
            .field("declared_electronic", &self.declared_electronic)
            .field("justification", &self.justification)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Result of a successful close.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedSession {
    pub session: CashSession,
    pub breakdown: ClosingBreakdown,
    pub authorized_by: Option<AuthorizationMethod>,
}

// =============================================================================
// Cash Desk
// =============================================================================

/// Entry point for every cash session operation.
///
/// Cheap to clone: the database pool and hasher are shared.
#[derive(Debug, Clone)]
pub struct CashDesk {
    pub(crate) db: Database,
    pub(crate) gate: AuthorizationGate,
}

impl CashDesk {
    pub fn new(db: Database, gate: AuthorizationGate) -> Self {
        CashDesk { db, gate }
    }

    /// Connects to the configured database and builds the gate.
    pub async fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let db_config = config
            .db_config()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        let hasher = config
            .secret_hasher()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;

        let db = Database::new(db_config).await?;
        let gate = AuthorizationGate::new(hasher, config.authorization.min_secret_length);

        Ok(CashDesk::new(db, gate))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    // =========================================================================
    // Open
    // =========================================================================

    /// Opens a session with `opening_balance` in the drawer.
    ///
    /// Writes the session and its seed OPENING movement in one transaction.
    ///
    /// ## Errors
    /// * `Validation` - negative float
    /// * `NotFound` - operator or company missing, or operator of another company
    /// * `InvalidState` - the operator already has an OPEN session
    pub async fn open(
        &self,
        identity: &Identity,
        opening_balance: Money,
    ) -> EngineResult<CashSession> {
        validate_opening_balance(opening_balance)?;

        let mut tx = self.db.begin().await?;

        let operator = tx
            .get_operator(&identity.operator_id)
            .await?
            .filter(|op| op.company_id == identity.company_id)
            .ok_or_else(|| EngineError::not_found("Operator", &identity.operator_id))?;

        tx.get_company(&identity.company_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Company", &identity.company_id))?;

        // Fast path only; the partial unique index is the real guard.
        if tx.find_open_session(&operator.id).await?.is_some() {
            warn!(operator_id = %operator.id, "Open rejected: session already open");
            return Err(EngineError::InvalidState(
                "Operator already has an open cash session".to_string(),
            ));
        }

        let now = Utc::now();
        let session = CashSession {
            id: Uuid::new_v4().to_string(),
            company_id: identity.company_id.clone(),
            operator_id: operator.id.clone(),
            opening_balance_cents: opening_balance.cents(),
            status: SessionStatus::Open,
            opened_at: now,
            closed_at: None,
            declared_cash_cents: None,
            declared_electronic_cents: None,
            justification: None,
            divergence_cents: None,
            cash_divergence_cents: None,
            authorized_by: None,
        };

        let seed = CashMovement {
            id: Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            operator_id: operator.id.clone(),
            kind: MovementKind::Opening,
            amount_cents: opening_balance.cents(),
            tender: Some(MovementTender::Cash),
            description: "Opening float".to_string(),
            created_at: now,
        };

        tx.insert_session(&session).await?;
        tx.insert_movement(&seed).await?;
        tx.commit().await?;

        info!(
            session_id = %session.id,
            operator_id = %session.operator_id,
            opening_balance_cents = session.opening_balance_cents,
            "Cash session opened"
        );

        Ok(session)
    }

    // =========================================================================
    // Status & Preview
    // =========================================================================

    /// The caller's OPEN session with live balances, or `None`.
    pub async fn get_status(&self, identity: &Identity) -> EngineResult<Option<SessionStatusView>> {
        let mut tx = self.db.begin_read().await?;

        let Some(session) = find_own_open_session(&mut tx, identity).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let (balances, mut movements) = ledger_snapshot(&mut tx, &session).await?;
        tx.rollback().await?;

        movements.reverse();

        Ok(Some(SessionStatusView {
            session,
            balances,
            movements,
        }))
    }

    /// Compares a count against the live ledger without changing anything.
    ///
    /// Divergence is reported, never raised.
    pub async fn preview_close(
        &self,
        identity: &Identity,
        declared: DeclaredCount,
    ) -> EngineResult<ClosingBreakdown> {
        let mut tx = self.db.begin_read().await?;

        let session = require_open_session(&mut tx, identity).await?;
        let (balances, _) = ledger_snapshot(&mut tx, &session).await?;
        tx.rollback().await?;

        let breakdown = ClosingBreakdown::compute(&session.id, &balances, declared);

        debug!(
            session_id = %session.id,
            divergence_cents = breakdown.divergence.cents(),
            has_divergence = breakdown.has_divergence,
            "Close previewed"
        );

        Ok(breakdown)
    }

    // =========================================================================
    // Close
    // =========================================================================

    /// Closes the caller's OPEN session.
    ///
    /// ## Errors
    /// * `Validation` - negative count, or divergence without justification
    /// * `Authorization` - divergence without credential, or credential rejected
    /// * `Configuration` - divergence and no credential source for the company
    ///   (reported even when no credential was supplied)
    /// * `InvalidState` - no OPEN session (including one closed concurrently)
    pub async fn close(
        &self,
        identity: &Identity,
        request: CloseRequest,
    ) -> EngineResult<ClosedSession> {
        let declared = DeclaredCount::new(request.declared_cash, request.declared_electronic)?;

        let mut tx = self.db.begin().await?;

        let session = require_open_session(&mut tx, identity).await?;
        let (balances, _) = ledger_snapshot(&mut tx, &session).await?;
        let breakdown = ClosingBreakdown::compute(&session.id, &balances, declared);

        let requirements = match check_close_requirements(
            &breakdown,
            request.justification.as_deref(),
            request.credential.as_deref(),
        ) {
            // With no credential source, report that rather than the missing credential.
            Err(CoreError::CredentialRequired { divergence }) => {
                match self.gate.resolve_source(&mut tx, &identity.company_id).await? {
                    CredentialSource::None => Err(CoreError::NoCredentialConfigured {
                        company_id: identity.company_id.clone(),
                    }),
                    _ => Err(CoreError::CredentialRequired { divergence }),
                }
            }
            other => other,
        };

        let (justification, approval) = requirements.map_err(|e| {
            warn!(
                session_id = %session.id,
                divergence_cents = breakdown.divergence.cents(),
                reason = %e,
                "Close rejected"
            );
            EngineError::from(e)
        })?;

        let authorized_by = match approval {
            CloseApproval::NotRequired => None,
            CloseApproval::CredentialRequired { credential, .. } => Some(
                self.gate
                    .authorize(&mut tx, &identity.company_id, &credential)
                    .await?,
            ),
        };

        let closure = SessionClosure {
            session_id: session.id.clone(),
            declared_cash_cents: declared.cash.cents(),
            declared_electronic_cents: declared.electronic.cents(),
            justification,
            divergence_cents: breakdown.divergence.cents(),
            cash_divergence_cents: breakdown.cash_divergence.cents(),
            authorized_by,
            closed_at: Utc::now(),
        };

        if !tx.close_session(&closure).await? {
            warn!(session_id = %session.id, "Close lost to a concurrent close");
            return Err(EngineError::InvalidState(format!(
                "Cash session {} is already closed",
                session.id
            )));
        }

        tx.commit().await?;

        info!(
            session_id = %session.id,
            operator_id = %session.operator_id,
            divergence_cents = closure.divergence_cents,
            cash_divergence_cents = closure.cash_divergence_cents,
            authorized_by = ?closure.authorized_by,
            "Cash session closed"
        );

        let session = CashSession {
            status: SessionStatus::Closed,
            closed_at: Some(closure.closed_at),
            declared_cash_cents: Some(closure.declared_cash_cents),
            declared_electronic_cents: Some(closure.declared_electronic_cents),
            justification: closure.justification,
            divergence_cents: Some(closure.divergence_cents),
            cash_divergence_cents: Some(closure.cash_divergence_cents),
            authorized_by: closure.authorized_by,
            ..session
        };

        Ok(ClosedSession {
            session,
            breakdown,
            authorized_by,
        })
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// The caller's OPEN session, if it belongs to the caller's company.
pub(crate) async fn find_own_open_session(
    tx: &mut LedgerTransaction,
    identity: &Identity,
) -> EngineResult<Option<CashSession>> {
    Ok(tx
        .find_open_session(&identity.operator_id)
        .await?
        .filter(|s| s.company_id == identity.company_id))
}

/// Like [`find_own_open_session`], failing `InvalidState` when there is none.
pub(crate) async fn require_open_session(
    tx: &mut LedgerTransaction,
    identity: &Identity,
) -> EngineResult<CashSession> {
    find_own_open_session(tx, identity)
        .await?
        .ok_or_else(|| EngineError::no_open_session(&identity.operator_id))
}

/// Balances of `session` and its movements (oldest first), read in `tx`.
pub(crate) async fn ledger_snapshot(
    tx: &mut LedgerTransaction,
    session: &CashSession,
) -> EngineResult<(Balances, Vec<CashMovement>)> {
    let sales = tx
        .list_sales_since(&session.operator_id, session.opened_at)
        .await?;
    let movements = tx.list_movements(&session.id).await?;

    let balances = compute_expected_balances(session, &sales, &movements);
    Ok((balances, movements))
}

// =============================================================================
// Unit Tests
// =============================================================================
