//! # Closing Breakdown
//!
//! Compares a declared (physically counted) drawer against the theoretical
//! balances and decides what a close requires.
//!
//! ## Close Requirements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Close Decision Table                                 │
//! │                                                                         │
//! │  divergence = declared_total − theoretical_total                        │
//! │                                                                         │
//! │  |divergence| ≤ 0.009  ──► close immediately                            │
//! │                            (justification and credential optional)      │
//! │                                                                         │
//! │  |divergence| ≥ 0.01   ──► justification required  (Validation)         │
//! │                        ──► manager credential required (Authorization)  │
//! │                                                                         │
//! │  Amounts are whole cents (sub-cent input is rejected when parsed), so   │
//! │  "≤ 0.009" is exactly "zero cents" in either direction.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The divergence shown to the operator is the combined figure across both
//! buckets. The cash-only figure is kept for audit.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::balance::{Balances, SaleTotals};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::{normalize_justification, validate_declared_amount};

/// Largest absolute difference still treated as "equal", in cents.
pub const DIVERGENCE_TOLERANCE_CENTS: i64 = 0;

/// Returns true when `difference` is large enough to count as a cash break.
#[inline]
pub fn has_divergence(difference: Money) -> bool {
    difference.abs().cents() > DIVERGENCE_TOLERANCE_CENTS
}

// =============================================================================
// Declared Count
// =============================================================================

/// What the operator counted at the end of the shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredCount {
    /// Notes and coins in the drawer.
    pub cash: Money,
    /// Card machine and PIX report total.
    pub electronic: Money,
}

impl DeclaredCount {
    /// Creates a count, rejecting negative figures.
    pub fn new(cash: Money, electronic: Money) -> CoreResult<Self> {
        validate_declared_amount("declared cash", cash)?;
        validate_declared_amount("declared electronic", electronic)?;
        Ok(Self { cash, electronic })
    }

    pub fn total(&self) -> Money {
        self.cash + self.electronic
    }
}

// =============================================================================
// Breakdown
// =============================================================================

/// Expected vs declared vs difference for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BucketComparison {
    pub expected: Money,
    pub declared: Money,
    /// Signed `declared − expected`; positive means more money than expected.
    pub difference: Money,
}

impl BucketComparison {
    fn new(expected: Money, declared: Money) -> Self {
        Self {
            expected,
            declared,
            difference: declared - expected,
        }
    }
}

/// Full result of comparing a count against the ledger.
///
/// Built the same way for a preview and for the real close, so the operator
/// sees exactly the figures the close will persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClosingBreakdown {
    pub session_id: String,
    pub opening_balance: Money,
    pub cash: BucketComparison,
    pub electronic: BucketComparison,
    pub total: BucketComparison,
    pub sales: SaleTotals,
    /// Signed combined divergence (`total.difference`).
    pub divergence: Money,
    /// Signed cash-only divergence (`cash.difference`).
    pub cash_divergence: Money,
    pub has_divergence: bool,
}

impl ClosingBreakdown {
    /// Builds the breakdown of `declared` against `balances`.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::balance::Balances;
    /// use till_core::closing::{ClosingBreakdown, DeclaredCount};
    /// use till_core::money::Money;
    ///
    /// let balances = Balances {
    ///     cash: Money::from_cents(15000),
    ///     total: Money::from_cents(15000),
    ///     ..Balances::default()
    /// };
    /// let declared = DeclaredCount::new(Money::from_cents(15000), Money::zero()).unwrap();
    /// let breakdown = ClosingBreakdown::compute("s-1", &balances, declared);
    /// assert!(!breakdown.has_divergence);
    /// ```
    pub fn compute(session_id: &str, balances: &Balances, declared: DeclaredCount) -> Self {
        let cash = BucketComparison::new(balances.cash, declared.cash);
        let electronic = BucketComparison::new(balances.electronic, declared.electronic);
        let total = BucketComparison::new(balances.total, declared.total());

        Self {
            session_id: session_id.to_string(),
            opening_balance: balances.opening_balance,
            cash,
            electronic,
            total,
            sales: balances.sales,
            divergence: total.difference,
            cash_divergence: cash.difference,
            has_divergence: has_divergence(total.difference),
        }
    }
}

// =============================================================================
// Close Requirements
// =============================================================================

/// What a close must still go through after the justification check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseApproval {
    /// Count matches; close without further checks.
    NotRequired,
    /// Count diverges; the credential must verify before closing.
    CredentialRequired {
        justification: String,
        credential: String,
    },
}

/// Checks the requirements a divergent close imposes.
///
/// Justification is checked before the credential so the operator is told
/// about the first missing item. A blank justification counts as missing.
/// When there is no divergence, a supplied justification is kept as a note.
pub fn check_close_requirements(
    breakdown: &ClosingBreakdown,
    justification: Option<&str>,
    credential: Option<&str>,
) -> CoreResult<(Option<String>, CloseApproval)> {
    let justification = normalize_justification(justification)?;

    if !breakdown.has_divergence {
        return Ok((justification, CloseApproval::NotRequired));
    }

    let Some(justification) = justification else {
        return Err(CoreError::JustificationRequired {
            divergence: breakdown.divergence,
        });
    };

    let Some(credential) = credential.filter(|c| !c.is_empty()) else {
        return Err(CoreError::CredentialRequired {
            divergence: breakdown.divergence,
        });
    };

    Ok((
        Some(justification.clone()),
        CloseApproval::CredentialRequired {
            justification,
            credential: credential.to_string(),
        },
    ))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn balances(cash: i64, electronic: i64) -> Balances {
        Balances {
            opening_balance: Money::from_cents(10000),
            cash: Money::from_cents(cash),
            electronic: Money::from_cents(electronic),
            total: Money::from_cents(cash + electronic),
            ..Balances::default()
        }
    }

    fn declared(cash: &str, electronic: &str) -> DeclaredCount {
        DeclaredCount::new(cash.parse().unwrap(), electronic.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_matching_count_has_no_divergence() {
        let b = ClosingBreakdown::compute("s-1", &balances(15000, 0), declared("150.00", "0"));

        assert_eq!(b.cash.expected.cents(), 15000);
        assert_eq!(b.cash.difference, Money::zero());
        assert!(!b.has_divergence);
    }

    #[test]
    fn test_tolerance_is_symmetric() {
        for count in ["150", "150.00", "150.000"] {
            let b = ClosingBreakdown::compute("s-1", &balances(15000, 0), declared(count, "0"));
            assert!(!b.has_divergence, "{count} should match");
            assert_eq!(b.divergence, Money::zero());
        }

        // Neither an over-count nor an under-count below one cent can be entered
        for count in ["150.009", "149.991", "149.995"] {
            assert!(count.parse::<Money>().is_err(), "{count} should be rejected");
        }
    }

    #[test]
    fn test_one_cent_difference_is_divergent() {
        let over = ClosingBreakdown::compute("s-1", &balances(15000, 0), declared("150.01", "0"));
        assert!(over.has_divergence);
        assert_eq!(over.divergence.cents(), 1);

        let under = ClosingBreakdown::compute("s-1", &balances(15000, 0), declared("149.99", "0"));
        assert!(under.has_divergence);
        assert_eq!(under.divergence.cents(), -1);
    }

    #[test]
    fn test_divergence_is_combined_across_buckets() {
        // 10.00 short in cash but 10.00 over in electronic nets out
        let b = ClosingBreakdown::compute("s-1", &balances(15000, 5000), declared("140", "60"));

        assert!(!b.has_divergence);
        assert_eq!(b.cash_divergence.cents(), -1000);
        assert_eq!(b.electronic.difference.cents(), 1000);
    }

    #[test]
    fn test_negative_declared_amount_is_rejected() {
        let err = DeclaredCount::new(Money::from_cents(-1), Money::zero()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_breakdown_is_deterministic() {
        let a = ClosingBreakdown::compute("s-1", &balances(14999, 0), declared("200", "0"));
        let b = ClosingBreakdown::compute("s-1", &balances(14999, 0), declared("200", "0"));
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_requirements_without_divergence() {
        let b = ClosingBreakdown::compute("s-1", &balances(15000, 0), declared("150", "0"));
        let (justification, approval) = check_close_requirements(&b, None, None).unwrap();

        assert_eq!(justification, None);
        assert_eq!(approval, CloseApproval::NotRequired);
    }

    #[test]
    fn test_requirements_name_the_missing_item() {
        let b = ClosingBreakdown::compute("s-1", &balances(14999, 0), declared("200", "0"));
        assert_eq!(b.divergence.cents(), 5001);

        assert!(matches!(
            check_close_requirements(&b, None, Some("1234")),
            Err(CoreError::JustificationRequired { .. })
        ));
        assert!(matches!(
            check_close_requirements(&b, Some("   "), Some("1234")),
            Err(CoreError::JustificationRequired { .. })
        ));
        assert!(matches!(
            check_close_requirements(&b, Some("tip jar mixed in"), None),
            Err(CoreError::CredentialRequired { .. })
        ));

        let (justification, approval) =
            check_close_requirements(&b, Some(" tip jar mixed in "), Some("1234")).unwrap();
        assert_eq!(justification.as_deref(), Some("tip jar mixed in"));
        assert_eq!(
            approval,
            CloseApproval::CredentialRequired {
                justification: "tip jar mixed in".to_string(),
                credential: "1234".to_string(),
            }
        );
    }
}
