//! Fixtures shared by the engine tests.

use chrono::Utc;
use till_core::{
    Argon2Settings, Company, DeclaredCount, Money, Operator, OperatorRole, PaymentTender, Sale,
    SalePayment, SaleRecord, SecretHasher,
};
use tempfile::TempDir;
use till_db::{Database, DbConfig};
use uuid::Uuid;

use crate::desk::CashDesk;
use crate::gate::AuthorizationGate;
use crate::identity::Identity;

/// Login credential of the seeded admin, used as the fallback manager credential.
pub const ADMIN_SECRET: &str = "admin-pass";

pub struct Fixture {
    pub company_id: String,
    pub operator: Identity,
    pub admin: Identity,
}

pub fn fast_hasher() -> SecretHasher {
    SecretHasher::new(Argon2Settings {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

pub async fn test_desk() -> CashDesk {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    CashDesk::new(db, AuthorizationGate::new(fast_hasher(), 4))
}

/// A desk on a SQLite file with a multi-connection pool. Keep the directory
/// alive for as long as the desk.
pub async fn file_desk() -> (CashDesk, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(DbConfig::new(dir.path().join("till.db")))
        .await
        .unwrap();
    (CashDesk::new(db, AuthorizationGate::new(fast_hasher(), 4)), dir)
}

async fn insert_company(desk: &CashDesk) -> String {
    let company = Company {
        id: Uuid::new_v4().to_string(),
        name: "Mercado Central".to_string(),
        authorization_secret_hash: None,
        created_at: Utc::now(),
    };
    desk.database()
        .companies()
        .insert_company(&company)
        .await
        .unwrap();
    company.id
}

pub async fn add_operator(
    desk: &CashDesk,
    company_id: &str,
    name: &str,
    role: OperatorRole,
) -> Identity {
    let credential = match role {
        OperatorRole::Admin => ADMIN_SECRET.to_string(),
        _ => format!("{name}-pass"),
    };

    let operator = Operator {
        id: Uuid::new_v4().to_string(),
        company_id: company_id.to_string(),
        name: name.to_string(),
        role,
        credential_hash: Some(fast_hasher().hash(&credential).unwrap()),
        created_at: Utc::now(),
    };
    desk.database()
        .companies()
        .insert_operator(&operator)
        .await
        .unwrap();

    Identity::new(operator.id, company_id)
}

/// A company with operator "Ana" and admin "Bruno".
pub async fn seed_company(desk: &CashDesk) -> Fixture {
    let company_id = insert_company(desk).await;
    let operator = add_operator(desk, &company_id, "Ana", OperatorRole::Operator).await;
    let admin = add_operator(desk, &company_id, "Bruno", OperatorRole::Admin).await;

    Fixture {
        company_id,
        operator,
        admin,
    }
}

/// A company whose only account is an operator: no credential source at all.
pub async fn seed_company_without_admin(desk: &CashDesk) -> Identity {
    let company_id = insert_company(desk).await;
    add_operator(desk, &company_id, "Ana", OperatorRole::Operator).await
}

/// Records a sale through the sales side of the ledger.
pub async fn record_sale(
    desk: &CashDesk,
    identity: &Identity,
    total: i64,
    change: i64,
    payments: &[(PaymentTender, i64)],
) -> SaleRecord {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let record = SaleRecord {
        sale: Sale {
            id: id.clone(),
            company_id: identity.company_id.clone(),
            operator_id: identity.operator_id.clone(),
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
    };

    desk.database().sales().insert_record(&record).await.unwrap();
    record
}

pub fn money(text: &str) -> Money {
    text.parse().unwrap()
}

pub fn count(cash: &str, electronic: &str) -> DeclaredCount {
    DeclaredCount::new(money(cash), money(electronic)).unwrap()
}
