//! # Session Review
//!
//! Company-wide views for admins and managers, and administration of the
//! company authorization secret.
//!
//! ## Access
//! ```text
//! ┌──────────────────────────────┬────────┬─────────┬──────────┐
//! │ Operation                    │ Admin  │ Manager │ Operator │
//! ├──────────────────────────────┼────────┼─────────┼──────────┤
//! │ list_open_sessions           │   ✓    │    ✓    │    ✗     │
//! │ closed_sessions              │   ✓    │    ✓    │    ✗     │
//! │ set_authorization_secret     │   ✓    │    ✗    │    ✗     │
//! └──────────────────────────────┴────────┴─────────┴──────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use till_core::validation::validate_authorization_secret;
use till_core::{
    compute_expected_balances, AuthorizationMethod, Balances, CashMovement, CashSession, Money,
    Operator, OperatorRole,
};

use crate::desk::CashDesk;
use crate::error::{EngineError, EngineResult};
use crate::identity::Identity;

/// Most closed sessions returned by one audit query.
pub const MAX_CLOSED_SESSIONS: u32 = 100;

/// One OPEN drawer in the company overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionOverview {
    pub session: CashSession,
    pub operator_name: String,
    pub balances: Balances,
    /// Newest first.
    pub movements: Vec<CashMovement>,
}

/// Audit line for a CLOSED session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedSessionSummary {
    pub session_id: String,
    pub operator_id: String,
    pub operator_name: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub opening_balance: Money,
    pub declared_cash: Option<Money>,
    pub declared_electronic: Option<Money>,
    pub divergence: Option<Money>,
    pub cash_divergence: Option<Money>,
    pub justification: Option<String>,
    pub authorized_by: Option<AuthorizationMethod>,
}

impl CashDesk {
    /// Every OPEN session of the caller's company, newest opened first.
    pub async fn list_open_sessions(
        &self,
        identity: &Identity,
    ) -> EngineResult<Vec<OpenSessionOverview>> {
        self.require_role(identity, OperatorRole::can_review_sessions)
            .await?;

        let sessions = self
            .db
            .sessions()
            .list_open_for_company(&identity.company_id)
            .await?;

        let mut names = OperatorNames::default();
        let mut overview = Vec::with_capacity(sessions.len());

        for session in sessions {
            let sales = self
                .db
                .sales()
                .list_since(&session.operator_id, session.opened_at)
                .await?;
            let mut movements = self.db.movements().list_for_session(&session.id).await?;
            let balances = compute_expected_balances(&session, &sales, &movements);
            movements.reverse();

            let operator_name = names.get(self, &session.operator_id).await?;
            overview.push(OpenSessionOverview {
                session,
                operator_name,
                balances,
                movements,
            });
        }

        debug!(
            company_id = %identity.company_id,
            open_sessions = overview.len(),
            "Listed open sessions"
        );
        Ok(overview)
    }

    /// The last `limit` CLOSED sessions of the caller's company.
    ///
    /// `limit` is capped at [`MAX_CLOSED_SESSIONS`].
    pub async fn closed_sessions(
        &self,
        identity: &Identity,
        limit: u32,
    ) -> EngineResult<Vec<ClosedSessionSummary>> {
        self.require_role(identity, OperatorRole::can_review_sessions)
            .await?;

        if limit == 0 {
            return Err(EngineError::Validation("limit must be positive".to_string()));
        }

        let sessions = self
            .db
            .sessions()
            .list_closed_for_company(&identity.company_id, limit.min(MAX_CLOSED_SESSIONS))
            .await?;

        let mut names = OperatorNames::default();
        let mut summaries = Vec::with_capacity(sessions.len());

        for s in sessions {
            let operator_name = names.get(self, &s.operator_id).await?;
            summaries.push(ClosedSessionSummary {
                opening_balance: s.opening_balance(),
                declared_cash: s.declared_cash_cents.map(Money::from_cents),
                declared_electronic: s.declared_electronic_cents.map(Money::from_cents),
                divergence: s.divergence(),
                cash_divergence: s.cash_divergence(),
                session_id: s.id,
                operator_id: s.operator_id,
                operator_name,
                opened_at: s.opened_at,
                closed_at: s.closed_at,
                justification: s.justification,
                authorized_by: s.authorized_by,
            });
        }

        Ok(summaries)
    }

    /// Sets the company's manager authorization secret (admins only).
    ///
    /// The secret is trimmed and stored as an Argon2id hash. Once set it
    /// takes precedence over the admin-account fallback.
    pub async fn set_authorization_secret(
        &self,
        identity: &Identity,
        secret: &str,
    ) -> EngineResult<()> {
        self.require_role(identity, |role| *role == OperatorRole::Admin)
            .await?;

        let secret = validate_authorization_secret(secret, self.gate.min_secret_length())?;
        let hash = self.gate.hash_secret(secret).await?;

        let updated = self
            .db
            .companies()
            .set_authorization_secret_hash(&identity.company_id, &hash)
            .await?;
        if !updated {
            return Err(EngineError::not_found("Company", &identity.company_id));
        }

        info!(
            company_id = %identity.company_id,
            changed_by = %identity.operator_id,
            "Company authorization secret updated"
        );
        Ok(())
    }

    /// Loads the caller and checks their role.
    async fn require_role(
        &self,
        identity: &Identity,
        allowed: impl Fn(&OperatorRole) -> bool,
    ) -> EngineResult<Operator> {
        let operator = self
            .db
            .companies()
            .get_operator(&identity.operator_id)
            .await?
            .filter(|op| op.company_id == identity.company_id)
            .ok_or_else(|| EngineError::not_found("Operator", &identity.operator_id))?;

        if !allowed(&operator.role) {
            warn!(
                operator_id = %operator.id,
                role = ?operator.role,
                "Operation refused for role"
            );
            return Err(EngineError::Authorization(
                "Your role is not allowed to perform this operation".to_string(),
            ));
        }

        Ok(operator)
    }
}

/// Operator display names, looked up once per listing.
#[derive(Default)]
struct OperatorNames(HashMap<String, String>);

impl OperatorNames {
    async fn get(&mut self, desk: &CashDesk, operator_id: &str) -> EngineResult<String> {
        if let Some(name) = self.0.get(operator_id) {
            return Ok(name.clone());
        }

        let name = desk
            .db
            .companies()
            .get_operator(operator_id)
            .await?
            .map(|op| op.name)
            .unwrap_or_default();

        self.0.insert(operator_id.to_string(), name.clone());
        Ok(name)
    }
}
