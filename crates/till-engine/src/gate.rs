//! # Authorization Gate
//!
//! Approves a divergent close with a manager credential.
//!
//! ```text
//! company row ─┐
//!              ├─► CredentialSource::resolve ─► authorize(candidate) ─► AuthorizationMethod
//! admin hash ──┘        (once)                    (Argon2, off the async runtime)
//! ```
//!
//! Lookups run on the caller's ledger transaction so the credential that
//! approves a close is read in the same snapshot as the close itself.

use std::sync::Arc;

use till_core::{AuthorizationMethod, CredentialSource, SecretHasher};
use till_db::LedgerTransaction;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

/// Resolves and verifies manager credentials.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    hasher: Arc<SecretHasher>,
    min_secret_length: usize,
}

impl AuthorizationGate {
    pub fn new(hasher: SecretHasher, min_secret_length: usize) -> Self {
        AuthorizationGate {
            hasher: Arc::new(hasher),
            min_secret_length,
        }
    }

    pub fn min_secret_length(&self) -> usize {
        self.min_secret_length
    }

    /// Looks up where the company's manager credential lives.
    pub async fn resolve_source(
        &self,
        tx: &mut LedgerTransaction,
        company_id: &str,
    ) -> EngineResult<CredentialSource> {
        let company = tx
            .get_company(company_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Company", company_id))?;

        let admin_hash = match company.authorization_secret_hash.as_deref() {
            Some(hash) if !hash.is_empty() => None,
            _ => tx.admin_credential_hash(company_id).await?,
        };

        let source = CredentialSource::resolve(
            company.authorization_secret_hash.as_deref(),
            admin_hash.as_deref(),
        );

        debug!(
            company_id = %company_id,
            source = source_name(&source),
            "Resolved manager credential source"
        );
        Ok(source)
    }

    /// Verifies `candidate` for `company_id`.
    ///
    /// ## Errors
    /// * `Configuration` - no company secret and no admin account
    /// * `Authorization` - the credential does not match
    pub async fn authorize(
        &self,
        tx: &mut LedgerTransaction,
        company_id: &str,
        candidate: &str,
    ) -> EngineResult<AuthorizationMethod> {
        let source = self.resolve_source(tx, company_id).await?;

        let hasher = Arc::clone(&self.hasher);
        let company = company_id.to_string();
        let candidate = candidate.to_string();

        let outcome = tokio::task::spawn_blocking(move || {
            source.authorize(&company, &candidate, hasher.as_ref())
        })
        .await
        .map_err(|e| EngineError::Internal(format!("Credential check aborted: {e}")))?;

        outcome.map_err(|e| {
            warn!(company_id = %company_id, reason = %e, "Manager authorization refused");
            EngineError::from(e)
        })
    }

    /// Hashes a new secret for storage.
    pub async fn hash_secret(&self, secret: String) -> EngineResult<String> {
        let hasher = Arc::clone(&self.hasher);

        let hash = tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| EngineError::Internal(format!("Credential hashing aborted: {e}")))??;

        Ok(hash)
    }
}

fn source_name(source: &CredentialSource) -> &'static str {
    match source {
        CredentialSource::CompanyConfigured(_) => "company_configured",
        CredentialSource::AdminFallback(_) => "admin_fallback",
        CredentialSource::None => "none",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{seed_company, seed_company_without_admin, test_desk, ADMIN_SECRET};

    #[tokio::test]
    async fn test_resolves_admin_fallback_then_company_secret() {
        let desk = test_desk().await;
        let fx = seed_company(&desk).await;

        let mut tx = desk.database().begin().await.unwrap();
        let source = desk.gate().resolve_source(&mut tx, &fx.company_id).await.unwrap();
        assert!(matches!(source, CredentialSource::AdminFallback(_)));
        assert_eq!(
            desk.gate()
                .authorize(&mut tx, &fx.company_id, ADMIN_SECRET)
                .await
                .unwrap(),
            AuthorizationMethod::AdminFallback
        );
        tx.rollback().await.unwrap();

        desk.set_authorization_secret(&fx.admin, "5555").await.unwrap();

        let mut tx = desk.database().begin().await.unwrap();
        let source = desk.gate().resolve_source(&mut tx, &fx.company_id).await.unwrap();
        assert!(matches!(source, CredentialSource::CompanyConfigured(_)));
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejections() {
        let desk = test_desk().await;
        let fx = seed_company(&desk).await;
        let lonely = seed_company_without_admin(&desk).await;

        let mut tx = desk.database().begin().await.unwrap();

        let err = desk
            .gate()
            .authorize(&mut tx, &fx.company_id, "not-the-secret")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AuthorizationError);

        let err = desk
            .gate()
            .authorize(&mut tx, &lonely.company_id, "anything")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConfigurationError);

        let err = desk
            .gate()
            .authorize(&mut tx, "no-such-company", "anything")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_hash_secret_produces_phc_string() {
        let desk = test_desk().await;
        let hash = desk.gate().hash_secret("2468".to_string()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }
}
