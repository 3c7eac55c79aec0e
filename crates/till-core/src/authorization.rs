//! # Manager Authorization
//!
//! Credential-source resolution and Argon2id verification for approving a
//! divergent close.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Credential Source Resolution                         │
//! │                                                                         │
//! │  company.authorization_secret_hash ── Some ──► CompanyConfigured(hash)  │
//! │            │                                                            │
//! │           None                                                          │
//! │            ▼                                                            │
//! │  admin account credential_hash ────── Some ──► AdminFallback(hash)      │
//! │            │                                                            │
//! │           None ──────────────────────────────► None                     │
//! │                                                                         │
//! │  Resolved once, then verified once. No nested fallbacks at verify time. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stored values are PHC strings (`$argon2id$v=19$m=...`). Verification
//! reads the parameters from the stored string, so changing the hashing
//! parameters never invalidates existing secrets.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, PasswordHash, Version,
};

use crate::error::{CoreError, CoreResult};
use crate::types::AuthorizationMethod;

// =============================================================================
// Credential Verifier
// =============================================================================

/// The verification primitive: does `candidate` match `stored_hash`?
///
/// A mismatch is `Ok(false)`. `Err` is reserved for unreadable hashes.
pub trait CredentialVerifier {
    fn verify(&self, candidate: &str, stored_hash: &str) -> CoreResult<bool>;
}

// =============================================================================
// Credential Source
// =============================================================================

/// Where the manager credential for a company comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// The company has its own authorization secret.
    CompanyConfigured(String),
    /// No company secret; the company admin's login credential is used.
    AdminFallback(String),
    /// Nothing to verify against.
    None,
}

impl CredentialSource {
    /// Picks the credential source, company secret first.
    pub fn resolve(company_secret_hash: Option<&str>, admin_credential_hash: Option<&str>) -> Self {
        let usable = |h: &&str| !h.is_empty();

        if let Some(hash) = company_secret_hash.filter(usable) {
            return CredentialSource::CompanyConfigured(hash.to_string());
        }
        if let Some(hash) = admin_credential_hash.filter(usable) {
            return CredentialSource::AdminFallback(hash.to_string());
        }
        CredentialSource::None
    }

    /// Verifies `candidate` against the resolved source.
    ///
    /// ## Returns
    /// The source that approved the credential, recorded on the session.
    ///
    /// ## Errors
    /// * `NoCredentialConfigured` - source is `None`
    /// * `CredentialRejected` - the candidate does not match
    pub fn authorize(
        &self,
        company_id: &str,
        candidate: &str,
        verifier: &impl CredentialVerifier,
    ) -> CoreResult<AuthorizationMethod> {
        let (hash, method) = match self {
            CredentialSource::CompanyConfigured(hash) => {
                (hash, AuthorizationMethod::CompanyConfigured)
            }
            CredentialSource::AdminFallback(hash) => (hash, AuthorizationMethod::AdminFallback),
            CredentialSource::None => {
                return Err(CoreError::NoCredentialConfigured {
                    company_id: company_id.to_string(),
                })
            }
        };

        if verifier.verify(candidate, hash)? {
            Ok(method)
        } else {
            Err(CoreError::CredentialRejected)
        }
    }
}

// =============================================================================
// Argon2 Secret Hasher
// =============================================================================

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Settings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Settings {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Hashes and verifies secrets with Argon2id.
#[derive(Debug, Clone)]
pub struct SecretHasher {
    params: Params,
}

impl SecretHasher {
    /// Creates a hasher, rejecting parameters Argon2 does not accept.
    pub fn new(settings: Argon2Settings) -> CoreResult<Self> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|e| CoreError::CredentialHash(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes `secret` into a PHC string with a fresh random salt.
    pub fn hash(&self, secret: &str) -> CoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CoreError::CredentialHash(e.to_string()))
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialVerifier for SecretHasher {
    fn verify(&self, candidate: &str, stored_hash: &str) -> CoreResult<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|_| CoreError::CredentialHash("invalid credential hash format".to_string()))?;

        match self.argon2().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CoreError::CredentialHash(e.to_string())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> SecretHasher {
        SecretHasher::new(Argon2Settings {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    /// Plain-text verifier so resolution can be tested without hashing.
    struct PlainVerifier;

    impl CredentialVerifier for PlainVerifier {
        fn verify(&self, candidate: &str, stored_hash: &str) -> CoreResult<bool> {
            Ok(candidate == stored_hash)
        }
    }

    #[test]
    fn test_resolve_prefers_company_secret() {
        assert_eq!(
            CredentialSource::resolve(Some("company"), Some("admin")),
            CredentialSource::CompanyConfigured("company".to_string())
        );
        assert_eq!(
            CredentialSource::resolve(None, Some("admin")),
            CredentialSource::AdminFallback("admin".to_string())
        );
        assert_eq!(
            CredentialSource::resolve(Some(""), Some("admin")),
            CredentialSource::AdminFallback("admin".to_string())
        );
        assert_eq!(CredentialSource::resolve(None, None), CredentialSource::None);
    }

    #[test]
    fn test_authorize_reports_source() {
        let company = CredentialSource::CompanyConfigured("1234".to_string());
        assert_eq!(
            company.authorize("c-1", "1234", &PlainVerifier).unwrap(),
            AuthorizationMethod::CompanyConfigured
        );

        let fallback = CredentialSource::AdminFallback("admin-pass".to_string());
        assert_eq!(
            fallback.authorize("c-1", "admin-pass", &PlainVerifier).unwrap(),
            AuthorizationMethod::AdminFallback
        );
    }

    #[test]
    fn test_authorize_rejections() {
        let company = CredentialSource::CompanyConfigured("1234".to_string());
        assert!(matches!(
            company.authorize("c-1", "9999", &PlainVerifier),
            Err(CoreError::CredentialRejected)
        ));

        assert!(matches!(
            CredentialSource::None.authorize("c-1", "1234", &PlainVerifier),
            Err(CoreError::NoCredentialConfigured { company_id }) if company_id == "c-1"
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("4321").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("4321", &hash).unwrap());
        assert!(!hasher.verify("1234", &hash).unwrap());
    }

    #[test]
    fn test_verify_uses_params_from_stored_hash() {
        let hash = fast_hasher().hash("4321").unwrap();
        assert!(SecretHasher::default().verify("4321", &hash).unwrap());
    }

    #[test]
    fn test_invalid_hash_is_an_error() {
        assert!(matches!(
            fast_hasher().verify("4321", "not-a-hash"),
            Err(CoreError::CredentialHash(_))
        ));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let result = SecretHasher::new(Argon2Settings {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(result.is_err());
    }
}
