//! # Domain Types
//!
//! Ledger records and enums shared by every layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CashSession    │   │  CashMovement   │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  operator_id    │◄──│  session_id     │   │  operator_id    │       │
//! │  │  opening_bal.   │   │  kind           │   │  total_cents    │       │
//! │  │  status         │   │  tender?        │   │  change_cents   │       │
//! │  │  declared_*     │   │  amount_cents   │   │  legacy_tender? │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ 0..n           │
//! │                                              ┌────────▼────────┐       │
//! │                                              │  SalePayment    │       │
//! │                                              │  tender, amount │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Append-Only Ledger
//! `CashMovement` and `SalePayment` are events. Nothing in this workspace
//! updates or deletes them; a correction is a new counter-entry.
//! `CashSession` is written twice: once at open, once at close.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Session Status
// =============================================================================

/// Lifecycle state of a cash session. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Drawer is in use; movements and sales accrue to it.
    Open,
    /// Drawer was counted and closed.
    Closed,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Open
    }
}

// =============================================================================
// Authorization Method
// =============================================================================

/// Which credential source approved a divergent close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationMethod {
    /// The company's dedicated authorization secret.
    CompanyConfigured,
    /// The company admin account's own credential.
    AdminFallback,
}

// =============================================================================
// Cash Session
// =============================================================================

/// The operator-scoped period between opening and closing a drawer.
///
/// At most one session per operator is `Open` at any time; the database
/// enforces this with a partial unique index.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashSession {
    pub id: String,
    pub company_id: String,
    pub operator_id: String,
    /// Float placed in the drawer at open, in cents.
    pub opening_balance_cents: i64,
    pub status: SessionStatus,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Physically counted cash, set at close.
    pub declared_cash_cents: Option<i64>,
    /// Card machine + PIX total read by the operator, set at close.
    pub declared_electronic_cents: Option<i64>,
    pub justification: Option<String>,
    /// Signed `declared_total - theoretical_total`, the figure shown to the operator.
    pub divergence_cents: Option<i64>,
    /// Signed `declared_cash - theoretical_cash`, kept for audit only.
    pub cash_divergence_cents: Option<i64>,
    pub authorized_by: Option<AuthorizationMethod>,
}

impl CashSession {
    /// Returns the opening float as Money.
    #[inline]
    pub fn opening_balance(&self) -> Money {
        Money::from_cents(self.opening_balance_cents)
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Signed total divergence recorded at close.
    pub fn divergence(&self) -> Option<Money> {
        self.divergence_cents.map(Money::from_cents)
    }

    /// Signed cash-only divergence recorded at close.
    pub fn cash_divergence(&self) -> Option<Money> {
        self.cash_divergence_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Cash Movement
// =============================================================================

/// Kind of drawer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Seed entry written at open, equal to the opening balance.
    Opening,
    /// Money taken out of a bucket.
    Withdrawal,
    /// Money put into a bucket.
    Deposit,
}

/// Bucket a movement applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementTender {
    /// Physical notes and coins.
    #[default]
    Cash,
    /// PIX and card machine combined.
    Electronic,
}

/// An immutable drawer event.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashMovement {
    pub id: String,
    pub session_id: String,
    pub operator_id: String,
    pub kind: MovementKind,
    pub amount_cents: i64,
    /// `None` on rows recorded before tenders were tracked.
    pub tender: Option<MovementTender>,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Bucket this movement counts toward; an absent tender is cash.
    #[inline]
    pub fn bucket(&self) -> MovementTender {
        self.tender.unwrap_or_default()
    }
}

// =============================================================================
// Payment Tender
// =============================================================================

/// Instrument a sale was paid with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentTender {
    Cash,
    Pix,
    Debit,
    Credit,
}

impl PaymentTender {
    /// PIX, debit and credit all land in the electronic bucket.
    #[inline]
    pub fn is_electronic(&self) -> bool {
        !matches!(self, PaymentTender::Cash)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale as recorded by the sales subsystem.
///
/// The engine only reads sales, with one exception: the fee of a tender
/// exchange is booked as a PIX sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub company_id: String,
    pub operator_id: String,
    pub total_cents: i64,
    /// Cash returned to the customer when they overpaid.
    pub change_cents: i64,
    /// Single tender of sales recorded before split payments existed.
    pub legacy_tender: Option<PaymentTender>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

/// One tender line of a split payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalePayment {
    pub id: String,
    pub sale_id: String,
    pub tender: PaymentTender,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SalePayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A sale together with its itemized payments (possibly none).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    pub sale: Sale,
    pub payments: Vec<SalePayment>,
}

// =============================================================================
// Company & Operator
// =============================================================================

/// Role of an operator account inside its company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OperatorRole {
    Admin,
    Manager,
    Operator,
}

impl OperatorRole {
    /// Admins and managers may review other operators' drawers.
    pub fn can_review_sessions(&self) -> bool {
        matches!(self, OperatorRole::Admin | OperatorRole::Manager)
    }
}

/// A company (tenant). Owned by the company-management subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Company {
    pub id: String,
    pub name: String,
    /// Argon2 PHC string of the manager authorization secret.
    #[serde(skip_serializing)]
    pub authorization_secret_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An operator account. Owned by the user-management subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Operator {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub role: OperatorRole,
    /// Argon2 PHC string of the account's login credential.
    #[serde(skip_serializing)]
    pub credential_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(tender: Option<MovementTender>) -> CashMovement {
        CashMovement {
            id: "m-1".to_string(),
            session_id: "s-1".to_string(),
            operator_id: "op-1".to_string(),
            kind: MovementKind::Deposit,
            amount_cents: 1000,
            tender,
            description: "change float".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_movement_without_tender_counts_as_cash() {
        assert_eq!(movement(None).bucket(), MovementTender::Cash);
        assert_eq!(
            movement(Some(MovementTender::Electronic)).bucket(),
            MovementTender::Electronic
        );
    }

    #[test]
    fn test_payment_tender_buckets() {
        assert!(!PaymentTender::Cash.is_electronic());
        assert!(PaymentTender::Pix.is_electronic());
        assert!(PaymentTender::Debit.is_electronic());
        assert!(PaymentTender::Credit.is_electronic());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Open).unwrap(),
            "\"OPEN\""
        );
        assert_eq!(
            serde_json::to_string(&MovementKind::Withdrawal).unwrap(),
            "\"WITHDRAWAL\""
        );
        assert_eq!(
            serde_json::to_string(&AuthorizationMethod::AdminFallback).unwrap(),
            "\"admin_fallback\""
        );
    }

    #[test]
    fn test_role_review_rights() {
        assert!(OperatorRole::Admin.can_review_sessions());
        assert!(OperatorRole::Manager.can_review_sessions());
        assert!(!OperatorRole::Operator.can_review_sessions());
    }

    #[test]
    fn test_company_hash_never_serialized() {
        let company = Company {
            id: "c-1".to_string(),
            name: "Mercado Central".to_string(),
            authorization_secret_hash: Some("$argon2id$secret".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&company).unwrap();
        assert!(!json.contains("argon2id"));
    }
}
