//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Closing rules and credential failures          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  └── DbError          - Ledger store failures                          │
//! │                                                                         │
//! │  till-engine errors                                                    │
//! │  └── EngineError      - What callers see (Validation, InvalidState,    │
//! │                         Authorization, Configuration, NotFound,        │
//! │                         Internal)                                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError ← DbError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field names, amounts)
//! 3. A rejected close names the missing requirement, never a generic "denied"

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The count diverges and no justification was given.
    ///
    /// ## User Workflow
    /// ```text
    /// Declared 200.00 vs expected 149.99
    ///      │
    ///      ▼
    /// divergence = +50.01 → close(justification: None)
    ///      │
    ///      ▼
    /// JustificationRequired { divergence: 50.01 }
    ///      │
    ///      ▼
    /// UI asks the operator to explain the difference
    /// ```
    #[error("A justification is required to close with a divergence of {divergence}")]
    JustificationRequired { divergence: Money },

    /// The count diverges and no manager credential was supplied.
    #[error("A manager credential is required to close with a divergence of {divergence}")]
    CredentialRequired { divergence: Money },

    /// The supplied manager credential did not verify.
    #[error("Manager credential rejected")]
    CredentialRejected,

    /// Neither a company authorization secret nor an admin account exists.
    #[error("No authorization credential is configured for company {company_id}")]
    NoCredentialConfigured { company_id: String },

    /// A stored hash could not be parsed or produced.
    #[error("Credential hash error: {0}")]
    CredentialHash(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any ledger write.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparseable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
