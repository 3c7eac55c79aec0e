//! # Company Repository
//!
//! Companies and operators belong to the account subsystem. The cash desk
//! reads them to check identities and to resolve the manager credential,
//! and writes exactly one column: the company authorization secret hash.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use till_core::{Company, Operator};

pub(crate) async fn get_company(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Company>> {
    let company = sqlx::query_as::<_, Company>(
        "SELECT id, name, authorization_secret_hash, created_at FROM companies WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(company)
}

pub(crate) async fn get_operator(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Operator>> {
    let operator = sqlx::query_as::<_, Operator>(
        "SELECT id, company_id, name, role, credential_hash, created_at FROM operators WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(operator)
}

/// Credential hash of the company's oldest admin account that has one.
pub(crate) async fn admin_credential_hash(
    conn: &mut SqliteConnection,
    company_id: &str,
) -> DbResult<Option<String>> {
    let hash: Option<String> = sqlx::query_scalar(
        r#"
        SELECT credential_hash FROM operators
        WHERE company_id = ?1 AND role = 'admin' AND credential_hash IS NOT NULL
        ORDER BY created_at, rowid
        LIMIT 1
        "#,
    )
    .bind(company_id)
    .fetch_optional(conn)
    .await?;

    Ok(hash)
}

/// Returns false when the company does not exist.
pub(crate) async fn set_authorization_secret_hash(
    conn: &mut SqliteConnection,
    company_id: &str,
    hash: &str,
) -> DbResult<bool> {
    debug!(company_id = %company_id, "Updating company authorization secret");

    let result = sqlx::query("UPDATE companies SET authorization_secret_hash = ?2 WHERE id = ?1")
        .bind(company_id)
        .bind(hash)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Repository for companies and operators.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    /// Creates a new CompanyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    pub async fn get_company(&self, id: &str) -> DbResult<Option<Company>> {
        let mut conn = self.pool.acquire().await?;
        get_company(&mut conn, id).await
    }

    pub async fn get_operator(&self, id: &str) -> DbResult<Option<Operator>> {
        let mut conn = self.pool.acquire().await?;
        get_operator(&mut conn, id).await
    }

    /// Fallback credential for companies without an authorization secret.
    pub async fn admin_credential_hash(&self, company_id: &str) -> DbResult<Option<String>> {
        let mut conn = self.pool.acquire().await?;
        admin_credential_hash(&mut conn, company_id).await
    }

    pub async fn set_authorization_secret_hash(
        &self,
        company_id: &str,
        hash: &str,
    ) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        set_authorization_secret_hash(&mut conn, company_id, hash).await
    }

    /// Inserts a company (account subsystem / seed).
    pub async fn insert_company(&self, company: &Company) -> DbResult<()> {
        debug!(id = %company.id, name = %company.name, "Inserting company");

        sqlx::query(
            r#"
            INSERT INTO companies (id, name, authorization_secret_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.authorization_secret_hash)
        .bind(company.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts an operator account (account subsystem / seed).
    pub async fn insert_operator(&self, operator: &Operator) -> DbResult<()> {
        debug!(id = %operator.id, role = ?operator.role, "Inserting operator");

        sqlx::query(
            r#"
            INSERT INTO operators (id, company_id, name, role, credential_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&operator.id)
        .bind(&operator.company_id)
        .bind(&operator.name)
        .bind(operator.role)
        .bind(&operator.credential_hash)
        .bind(operator.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
