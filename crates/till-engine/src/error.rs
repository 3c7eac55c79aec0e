//! # Engine Error Type
//!
//! The error every cash desk operation returns.
//!
//! ## Error Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Cash Desk                          │
//! │                                                                         │
//! │  ValidationError ─┐                                                     │
//! │  CoreError ───────┼──► EngineError ──► { code, message } for the UI     │
//! │  DbError ─────────┘                                                     │
//! │                                                                         │
//! │  CoreError::JustificationRequired   → Validation                        │
//! │  CoreError::CredentialRequired      → Authorization                     │
//! │  CoreError::CredentialRejected      → Authorization                     │
//! │  CoreError::NoCredentialConfigured  → Configuration                     │
//! │  DbError::UniqueViolation(sessions) → InvalidState  (double open)       │
//! │  DbError::ImmutableRecord           → InvalidState                      │
//! │  DbError::NotFound                  → NotFound                          │
//! │  any other store failure            → Internal (logged at error)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Divergence is not an error. `preview_close` reports it; `close` fails
//! only for the specific requirement a divergence adds.

use serde::Serialize;
use thiserror::Error;
use till_core::{CoreError, ValidationError};
use till_db::DbError;
use tracing::error;

/// Cash desk operation errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad input: negative or zero amounts, missing justification.
    #[error("{0}")]
    Validation(String),

    /// Operation not allowed in the current session state.
    #[error("{0}")]
    InvalidState(String),

    /// Manager credential missing or rejected, or caller lacks the role.
    #[error("{0}")]
    Authorization(String),

    /// No credential source is configured for the company.
    #[error("{0}")]
    Configuration(String),

    /// Referenced session, company or operator does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Ledger store failure.
    #[error("{0}")]
    Internal(String),
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidState,
    AuthorizationError,
    ConfigurationError,
    NotFound,
    InternalError,
}

/// What the UI layer receives when an operation fails.
///
/// ```json
/// { "code": "VALIDATION_ERROR", "message": "A justification is required ..." }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// No OPEN session exists where one is required.
    pub fn no_open_session(operator_id: &str) -> Self {
        EngineError::InvalidState(format!("Operator {operator_id} has no open cash session"))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation(_) => ErrorCode::ValidationError,
            EngineError::InvalidState(_) => ErrorCode::InvalidState,
            EngineError::Authorization(_) => ErrorCode::AuthorizationError,
            EngineError::Configuration(_) => ErrorCode::ConfigurationError,
            EngineError::NotFound { .. } => ErrorCode::NotFound,
            EngineError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::JustificationRequired { .. } | CoreError::Validation(_) => EngineError::Validation(err.to_string()),
            CoreError::CredentialRequired { .. } | CoreError::CredentialRejected => {
                EngineError::Authorization(err.to_string())
            }
            CoreError::NoCredentialConfigured { .. } => EngineError::Configuration(err.to_string()),
            CoreError::CredentialHash(e) => {
                error!(error = %e, "Stored credential hash is unusable");
                EngineError::Internal("Credential verification failed".to_string())
            }
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            ref e if e.is_unique_violation_on("cash_sessions") => {
                EngineError::InvalidState("Operator already has an open cash session".to_string())
            }
            DbError::ImmutableRecord { message } => EngineError::InvalidState(message),
            DbError::CheckViolation { message } => {
                EngineError::Validation(format!("Rejected by ledger constraint: {message}"))
            }
            other => {
                error!(error = %other, "Ledger store failure");
                EngineError::Internal("Ledger store operation failed".to_string())
            }
        }
    }
}

/// Result type for cash desk operations.
pub type EngineResult<T> = Result<T, EngineError>;
