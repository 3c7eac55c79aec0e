//! # Validation Module
//!
//! Input validation for every value that reaches the ledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Engine operation (Rust)                                      │
//! │  └── THIS MODULE: amounts, descriptions, justifications, secrets       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── CHECK constraints (amount_cents > 0, enum columns)                │
//! │  ├── Partial UNIQUE index (one open session per operator)              │
//! │  └── Triggers (append-only movements and payments)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_DESCRIPTION_LEN, MAX_JUSTIFICATION_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amount Validators
// =============================================================================

/// Validates an opening float: zero is allowed, negative is not.
///
/// ## Example
/// ```rust
/// use till_core::money::Money;
/// use till_core::validation::validate_opening_balance;
///
/// assert!(validate_opening_balance(Money::zero()).is_ok());
/// assert!(validate_opening_balance(Money::from_cents(-1)).is_err());
/// ```
pub fn validate_opening_balance(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "opening balance".to_string(),
        });
    }
    Ok(())
}

/// Validates a strictly positive amount (movements, exchange legs).
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a declared (counted) amount: zero is a legitimate count.
pub fn validate_declared_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Normalizes a movement description.
///
/// Descriptions are optional context; blanks become an empty string and
/// long text is rejected rather than silently cut.
pub fn normalize_description(description: &str) -> ValidationResult<String> {
    let description = description.trim();

    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(description.to_string())
}

/// Normalizes an optional justification: trimmed, blank means absent.
///
/// ## Example
/// ```rust
/// use till_core::validation::normalize_justification;
///
/// assert_eq!(normalize_justification(Some("   ")).unwrap(), None);
/// assert_eq!(
///     normalize_justification(Some(" coin roll miscounted ")).unwrap(),
///     Some("coin roll miscounted".to_string())
/// );
/// ```
pub fn normalize_justification(justification: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(text) = justification.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if text.chars().count() > MAX_JUSTIFICATION_LEN {
        return Err(ValidationError::TooLong {
            field: "justification".to_string(),
            max: MAX_JUSTIFICATION_LEN,
        });
    }

    Ok(Some(text.to_string()))
}

/// Validates a new authorization secret before it is hashed.
///
/// ## Rules
/// - Leading/trailing whitespace is ignored
/// - Must have at least `min_len` characters
pub fn validate_authorization_secret(secret: &str, min_len: usize) -> ValidationResult<String> {
    let secret = secret.trim();

    if secret.is_empty() {
        return Err(ValidationError::Required {
            field: "authorization secret".to_string(),
        });
    }

    if secret.chars().count() < min_len {
        return Err(ValidationError::TooShort {
            field: "authorization secret".to_string(),
            min: min_len,
        });
    }

    Ok(secret.to_string())
}

/// Validates an identity component (operator or company id).
pub fn validate_identifier(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_balance() {
        assert!(validate_opening_balance(Money::zero()).is_ok());
        assert!(validate_opening_balance(Money::from_cents(10000)).is_ok());
        assert!(matches!(
            validate_opening_balance(Money::from_cents(-1)),
            Err(ValidationError::MustNotBeNegative { .. })
        ));
    }

    #[test]
    fn test_positive_amount() {
        assert!(validate_positive_amount("amount", Money::from_cents(1)).is_ok());
        assert!(validate_positive_amount("amount", Money::zero()).is_err());
        assert!(validate_positive_amount("amount", Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_declared_amount() {
        assert!(validate_declared_amount("declared cash", Money::zero()).is_ok());
        assert!(validate_declared_amount("declared cash", Money::from_cents(-5)).is_err());
    }

    #[test]
    fn test_description() {
        assert_eq!(normalize_description("  bank run ").unwrap(), "bank run");
        assert_eq!(normalize_description("").unwrap(), "");
        assert!(normalize_description(&"x".repeat(MAX_DESCRIPTION_LEN + 1)).is_err());
    }

    #[test]
    fn test_justification() {
        assert_eq!(normalize_justification(None).unwrap(), None);
        assert_eq!(normalize_justification(Some("")).unwrap(), None);
        assert_eq!(normalize_justification(Some(" \t ")).unwrap(), None);
        assert_eq!(
            normalize_justification(Some("found 50 under the tray")).unwrap(),
            Some("found 50 under the tray".to_string())
        );
        assert!(normalize_justification(Some(&"x".repeat(MAX_JUSTIFICATION_LEN + 1))).is_err());
    }

    #[test]
    fn test_authorization_secret() {
        assert_eq!(validate_authorization_secret(" 1234 ", 4).unwrap(), "1234");
        assert!(matches!(
            validate_authorization_secret("123", 4),
            Err(ValidationError::TooShort { min: 4, .. })
        ));
        assert!(matches!(
            validate_authorization_secret("   ", 4),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_identifier() {
        assert!(validate_identifier("operator id", "op-1").is_ok());
        assert!(validate_identifier("operator id", "  ").is_err());
    }
}
