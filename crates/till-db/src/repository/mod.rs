//! # Repository Module
//!
//! Ledger store repositories.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways Into The Same SQL                           │
//! │                                                                         │
//! │  db.sessions().find_open_for_operator(op)    (pooled connection)       │
//! │                         │                                               │
//! │                         ▼                                               │
//! │          session::find_open_for_operator(&mut SqliteConnection, op)    │
//! │                         ▲                                               │
//! │                         │                                               │
//! │  tx.find_open_session(op)                    (LedgerTransaction)       │
//! │                                                                         │
//! │  Each query is written once, over a bare connection, and reused by     │
//! │  both the repositories and the transaction wrapper.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SessionRepository`] - Cash sessions
//! - [`MovementRepository`] - Append-only cash movements
//! - [`SaleRepository`] - Sales and split payments
//! - [`CompanyRepository`] - Companies, operators, authorization secret

pub mod company;
pub mod movement;
pub mod sale;
pub mod session;

pub use company::CompanyRepository;
pub use movement::MovementRepository;
pub use sale::SaleRepository;
pub use session::{SessionClosure, SessionRepository};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use till_core::{
        CashSession, Company, Operator, OperatorRole, PaymentTender, Sale, SalePayment,
        SaleRecord, SessionStatus,
    };
    use uuid::Uuid;

    use crate::error::DbResult;
    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Creates a company with one operator and one admin.
    /// Returns `(company_id, operator_id, admin_id)`.
    pub async fn seed_company(db: &Database) -> (String, String, String) {
        let company = Company {
            id: Uuid::new_v4().to_string(),
            name: "Mercado Central".to_string(),
            authorization_secret_hash: None,
            created_at: Utc::now(),
        };
        db.companies().insert_company(&company).await.unwrap();

        let operator = Operator {
            id: Uuid::new_v4().to_string(),
            company_id: company.id.clone(),
            name: "Ana".to_string(),
            role: OperatorRole::Operator,
            credential_hash: Some("operator-hash".to_string()),
            created_at: Utc::now(),
        };
        let admin = Operator {
            id: Uuid::new_v4().to_string(),
            name: "Bruno".to_string(),
            role: OperatorRole::Admin,
            credential_hash: Some("admin-hash".to_string()),
            ..operator.clone()
        };
        db.companies().insert_operator(&operator).await.unwrap();
        db.companies().insert_operator(&admin).await.unwrap();

        (company.id, operator.id, admin.id)
    }

    pub fn session_for(company_id: &str, operator_id: &str, opening_cents: i64) -> CashSession {
        CashSession {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            operator_id: operator_id.to_string(),
            opening_balance_cents: opening_cents,
            status: SessionStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
            declared_cash_cents: None,
            declared_electronic_cents: None,
            justification: None,
            divergence_cents: None,
            cash_divergence_cents: None,
            authorized_by: None,
        }
    }

    pub async fn insert_session(db: &Database, session: &CashSession) -> DbResult<()> {
        let mut tx = db.begin().await?;
        tx.insert_session(session).await?;
        tx.commit().await
    }

    pub fn sale_record(
        company_id: &str,
        operator_id: &str,
        total: i64,
        change: i64,
        payments: &[(PaymentTender, i64)],
    ) -> SaleRecord {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        SaleRecord {
            sale: Sale {
                id: id.clone(),
                company_id: company_id.to_string(),
                operator_id: operator_id.to_string(),
                total_cents: total,
                change_cents: change,
                legacy_tender: None,
                notes: None,
                created_at: now,
            },
            payments: payments
                .iter()
                .map(|(tender, amount)| SalePayment {
                    id: Uuid::new_v4().to_string(),
                    sale_id: id.clone(),
                    tender: *tender,
                    amount_cents: *amount,
                    created_at: now,
                })
                .collect(),
        }
    }
}
