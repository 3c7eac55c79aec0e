//! # Caller Identity
//!
//! The operator and company an operation runs on behalf of. Resolved by
//! the surrounding login layer; the engine only insists both are present.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Who is at the till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub operator_id: String,
    pub company_id: String,
}

impl Identity {
    /// Builds an identity from the login layer's optional fields.
    ///
    /// ## Errors
    /// `NotFound` when either part is absent or blank.
    ///
    /// ## Example
    /// ```rust
    /// use till_engine::Identity;
    ///
    /// assert!(Identity::from_parts(Some("op-1".into()), Some("c-1".into())).is_ok());
    /// assert!(Identity::from_parts(Some("op-1".into()), None).is_err());
    /// ```
    pub fn from_parts(
        operator_id: Option<String>,
        company_id: Option<String>,
    ) -> EngineResult<Self> {
        let operator_id =
            present(operator_id).ok_or_else(|| EngineError::not_found("Operator", "<none>"))?;
        let company_id =
            present(company_id).ok_or_else(|| EngineError::not_found("Company", "<none>"))?;

        Ok(Identity {
            operator_id,
            company_id,
        })
    }

    pub fn new(operator_id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Identity {
            operator_id: operator_id.into(),
            company_id: company_id.into(),
        }
    }
}

fn present(part: Option<String>) -> Option<String> {
    part.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_from_parts() {
        let identity = Identity::from_parts(Some(" op-1 ".into()), Some("c-1".into())).unwrap();
        assert_eq!(identity, Identity::new("op-1", "c-1"));

        for (op, company) in [
            (None, Some("c-1".to_string())),
            (Some("op-1".to_string()), None),
            (Some("  ".to_string()), Some("c-1".to_string())),
        ] {
            let err = Identity::from_parts(op, company).unwrap_err();
            assert_eq!(err.code(), ErrorCode::NotFound);
        }
    }
}
