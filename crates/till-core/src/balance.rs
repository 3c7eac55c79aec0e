//! # Balance Calculator
//!
//! Derives the theoretical drawer balances of a session purely from the
//! ledger: opening float, sales since open, and manual movements.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Theoretical Balances                                │
//! │                                                                         │
//! │  CASH BUCKET                                                            │
//! │    opening_balance                                                      │
//! │  + Σ per sale: max(0, cash payments − change given)                     │
//! │  + Σ legacy cash sales (total is already net of change)                 │
//! │  + cash deposits − cash withdrawals                                     │
//! │                                                                         │
//! │  ELECTRONIC BUCKET (always starts at zero)                              │
//! │    pix + debit + credit                                                 │
//! │  + electronic deposits − electronic withdrawals                         │
//! │                                                                         │
//! │  TOTAL = CASH + ELECTRONIC   (exact, integer cents)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why No Cached Totals?
//! Nothing stores a running balance. Every call recomputes from the raw
//! events, so an out-of-band write can never leave a stale total behind.
//! The calculator is read-only and can run alongside any writer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{
    CashMovement, CashSession, MovementKind, MovementTender, PaymentTender, SaleRecord,
};

// =============================================================================
// Sale Totals
// =============================================================================

/// Sale subtotals per tender since the session opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    /// Cash retained by the drawer (change already subtracted).
    pub cash: Money,
    pub pix: Money,
    pub debit: Money,
    pub credit: Money,
    /// Legacy sales with neither payments nor a tender; not in any bucket.
    pub unclassified: Money,
}

impl SaleTotals {
    /// PIX + debit + credit.
    pub fn electronic(&self) -> Money {
        self.pix + self.debit + self.credit
    }

    fn add_to_bucket(&mut self, tender: PaymentTender, amount: Money) {
        match tender {
            PaymentTender::Cash => self.cash += amount,
            PaymentTender::Pix => self.pix += amount,
            PaymentTender::Debit => self.debit += amount,
            PaymentTender::Credit => self.credit += amount,
        }
    }
}

// =============================================================================
// Movement Totals
// =============================================================================

/// Manual movement sums per bucket. Opening entries are not included;
/// the float is accounted for through the session's opening balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MovementTotals {
    pub cash_deposits: Money,
    pub cash_withdrawals: Money,
    pub electronic_deposits: Money,
    pub electronic_withdrawals: Money,
}

impl MovementTotals {
    fn record(&mut self, movement: &CashMovement) {
        let amount = movement.amount();
        match (movement.kind, movement.bucket()) {
            (MovementKind::Opening, _) => {}
            (MovementKind::Deposit, MovementTender::Cash) => self.cash_deposits += amount,
            (MovementKind::Withdrawal, MovementTender::Cash) => self.cash_withdrawals += amount,
            (MovementKind::Deposit, MovementTender::Electronic) => {
                self.electronic_deposits += amount
            }
            (MovementKind::Withdrawal, MovementTender::Electronic) => {
                self.electronic_withdrawals += amount
            }
        }
    }
}

// =============================================================================
// Balances
// =============================================================================

/// Theoretical per-bucket balances of a session.
///
/// ## Invariant
/// `total == cash + electronic`, exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    pub opening_balance: Money,
    pub sales: SaleTotals,
    pub movements: MovementTotals,
    pub cash: Money,
    pub electronic: Money,
    pub total: Money,
}

/// Computes the theoretical balances of `session`.
///
/// ## Arguments
/// * `session` - The session being reconciled
/// * `sales` - Sales of the session's operator; rows from another operator
///   or from before `opened_at` are ignored
/// * `movements` - Movements of the session; rows of other sessions are ignored
///
/// ## Example
/// ```rust,ignore
/// let sales = db.sales().list_since(&session.operator_id, session.opened_at).await?;
/// let movements = db.movements().list_for_session(&session.id).await?;
/// let balances = compute_expected_balances(&session, &sales, &movements);
/// assert_eq!(balances.total, balances.cash + balances.electronic);
/// ```
pub fn compute_expected_balances(
    session: &CashSession,
    sales: &[SaleRecord],
    movements: &[CashMovement],
) -> Balances {
    let mut sale_totals = SaleTotals::default();

    for record in sales.iter().filter(|r| {
        r.sale.operator_id == session.operator_id && r.sale.created_at >= session.opened_at
    }) {
        accumulate_sale(&mut sale_totals, record);
    }

    let mut movement_totals = MovementTotals::default();
    for movement in movements.iter().filter(|m| m.session_id == session.id) {
        movement_totals.record(movement);
    }

    let opening_balance = session.opening_balance();

    let cash = opening_balance + sale_totals.cash + movement_totals.cash_deposits
        - movement_totals.cash_withdrawals;

    let electronic = sale_totals.electronic() + movement_totals.electronic_deposits
        - movement_totals.electronic_withdrawals;

    Balances {
        opening_balance,
        sales: sale_totals,
        movements: movement_totals,
        cash,
        electronic,
        total: cash + electronic,
    }
}

/// Adds one sale to the running subtotals.
///
/// Itemized sales: electronic tenders go straight to their bucket; cash
/// tenders are summed per sale and the change handed back is subtracted
/// (floored at zero) since it left the drawer again.
///
/// Legacy sales: the total is already net of change and goes to the bucket
/// of the single recorded tender.
fn accumulate_sale(totals: &mut SaleTotals, record: &SaleRecord) {
    if record.payments.is_empty() {
        match record.sale.legacy_tender {
            Some(tender) => totals.add_to_bucket(tender, record.sale.total()),
            None => totals.unclassified += record.sale.total(),
        }
        return;
    }

    let mut cash_received = Money::zero();
    for payment in &record.payments {
        if payment.tender.is_electronic() {
            totals.add_to_bucket(payment.tender, payment.amount());
        } else {
            cash_received += payment.amount();
        }
    }

    totals.cash += (cash_received - record.sale.change()).floor_at_zero();
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sale, SalePayment, SessionStatus};
    use chrono::{DateTime, Duration, Utc};

    fn session(opening_cents: i64) -> CashSession {
        CashSession {
            id: "session-1".to_string(),
            company_id: "company-1".to_string(),
            operator_id: "op-1".to_string(),
            opening_balance_cents: opening_cents,
            status: SessionStatus::Open,
            opened_at: Utc::now() - Duration::hours(2),
            closed_at: None,
            declared_cash_cents: None,
            declared_electronic_cents: None,
            justification: None,
            divergence_cents: None,
            cash_divergence_cents: None,
            authorized_by: None,
        }
    }

    fn sale_at(
        at: DateTime<Utc>,
        total: i64,
        change: i64,
        payments: &[(PaymentTender, i64)],
    ) -> SaleRecord {
        let id = uuid::Uuid::new_v4().to_string();
        SaleRecord {
            sale: Sale {
                id: id.clone(),
                company_id: "company-1".to_string(),
                operator_id: "op-1".to_string(),
                total_cents: total,
                change_cents: change,
                legacy_tender: None,
                notes: None,
                created_at: at,
            },
            payments: payments
                .iter()
                .map(|(tender, amount)| SalePayment {
                    id: uuid::Uuid::new_v4().to_string(),
                    sale_id: id.clone(),
                    tender: *tender,
                    amount_cents: *amount,
                    created_at: at,
                })
                .collect(),
        }
    }

    fn sale(total: i64, change: i64, payments: &[(PaymentTender, i64)]) -> SaleRecord {
        sale_at(Utc::now() - Duration::minutes(30), total, change, payments)
    }

    fn legacy_sale(total: i64, tender: Option<PaymentTender>) -> SaleRecord {
        let mut record = sale(total, 0, &[]);
        record.sale.legacy_tender = tender;
        record
    }

    fn movement(kind: MovementKind, tender: Option<MovementTender>, cents: i64) -> CashMovement {
        CashMovement {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: "session-1".to_string(),
            operator_id: "op-1".to_string(),
            kind,
            amount_cents: cents,
            tender,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    fn assert_additive(balances: &Balances) {
        assert_eq!(balances.total, balances.cash + balances.electronic);
    }

    #[test]
    fn test_empty_session_holds_only_the_float() {
        let s = session(10000);
        let opening = movement(MovementKind::Opening, Some(MovementTender::Cash), 10000);
        let balances = compute_expected_balances(&s, &[], &[opening]);

        assert_eq!(balances.cash.cents(), 10000);
        assert_eq!(balances.electronic, Money::zero());
        assert_additive(&balances);
    }

    #[test]
    fn test_single_cash_sale() {
        // opening 100.00 + one 50.00 cash sale = 150.00 in the drawer
        let s = session(10000);
        let sales = [sale(5000, 0, &[(PaymentTender::Cash, 5000)])];
        let balances = compute_expected_balances(&s, &sales, &[]);

        assert_eq!(balances.cash.cents(), 15000);
        assert_eq!(balances.sales.cash.cents(), 5000);
        assert_additive(&balances);
    }

    #[test]
    fn test_change_given_is_not_retained() {
        // 80.00 sale paid with 100.00 cash, 20.00 back → 80.00 retained
        let s = session(0);
        let sales = [sale(8000, 2000, &[(PaymentTender::Cash, 10000)])];
        let balances = compute_expected_balances(&s, &sales, &[]);

        assert_eq!(balances.sales.cash.cents(), 8000);
        assert_eq!(balances.cash.cents(), 8000);
    }

    #[test]
    fn test_change_larger_than_cash_is_floored() {
        // Mixed sale where change exceeds the cash portion (bad data) never
        // pushes the cash subtotal below zero.
        let s = session(0);
        let sales = [sale(
            5000,
            3000,
            &[(PaymentTender::Cash, 1000), (PaymentTender::Pix, 7000)],
        )];
        let balances = compute_expected_balances(&s, &sales, &[]);

        assert_eq!(balances.sales.cash, Money::zero());
        assert_eq!(balances.sales.pix.cents(), 7000);
    }

    #[test]
    fn test_split_tender_sale() {
        let s = session(5000);
        let sales = [sale(
            12000,
            500,
            &[
                (PaymentTender::Cash, 3000),
                (PaymentTender::Pix, 4000),
                (PaymentTender::Debit, 2500),
                (PaymentTender::Credit, 3000),
            ],
        )];
        let balances = compute_expected_balances(&s, &sales, &[]);

        assert_eq!(balances.sales.cash.cents(), 2500);
        assert_eq!(balances.sales.pix.cents(), 4000);
        assert_eq!(balances.sales.debit.cents(), 2500);
        assert_eq!(balances.sales.credit.cents(), 3000);
        assert_eq!(balances.cash.cents(), 7500);
        assert_eq!(balances.electronic.cents(), 9500);
        assert_additive(&balances);
    }

    #[test]
    fn test_legacy_sales_use_single_tender() {
        let s = session(0);
        let sales = [
            legacy_sale(4000, Some(PaymentTender::Cash)),
            legacy_sale(2500, Some(PaymentTender::Credit)),
            legacy_sale(999, None),
        ];
        let balances = compute_expected_balances(&s, &sales, &[]);

        assert_eq!(balances.sales.cash.cents(), 4000);
        assert_eq!(balances.sales.credit.cents(), 2500);
        assert_eq!(balances.sales.unclassified.cents(), 999);
        assert_eq!(balances.total.cents(), 6500);
    }

    #[test]
    fn test_cash_withdrawal_reduces_cash_exactly() {
        let s = session(10000);
        let sales = [sale(5000, 0, &[(PaymentTender::Cash, 5000)])];
        let before = compute_expected_balances(&s, &sales, &[]);

        let withdrawal = movement(MovementKind::Withdrawal, Some(MovementTender::Cash), 3000);
        let after = compute_expected_balances(&s, &sales, &[withdrawal]);

        assert_eq!((before.cash - after.cash).cents(), 3000);
        assert_eq!(before.electronic, after.electronic);
    }

    #[test]
    fn test_movement_buckets() {
        let s = session(0);
        let movements = [
            movement(MovementKind::Opening, Some(MovementTender::Cash), 0),
            movement(MovementKind::Deposit, None, 2000),
            movement(MovementKind::Withdrawal, Some(MovementTender::Cash), 500),
            movement(MovementKind::Deposit, Some(MovementTender::Electronic), 10000),
            movement(MovementKind::Withdrawal, Some(MovementTender::Electronic), 1500),
        ];
        let balances = compute_expected_balances(&s, &[], &movements);

        assert_eq!(balances.movements.cash_deposits.cents(), 2000);
        assert_eq!(balances.movements.cash_withdrawals.cents(), 500);
        assert_eq!(balances.cash.cents(), 1500);
        assert_eq!(balances.electronic.cents(), 8500);
        assert_additive(&balances);
    }

    #[test]
    fn test_opening_movement_is_not_double_counted() {
        let s = session(10000);
        let opening = movement(MovementKind::Opening, Some(MovementTender::Cash), 10000);
        let balances = compute_expected_balances(&s, &[], &[opening]);

        assert_eq!(balances.cash.cents(), 10000);
        assert_eq!(balances.movements, MovementTotals::default());
    }

    #[test]
    fn test_sales_outside_the_session_are_ignored() {
        let s = session(0);
        let before_open = sale_at(
            s.opened_at - Duration::seconds(1),
            7000,
            0,
            &[(PaymentTender::Cash, 7000)],
        );
        let at_open = sale_at(s.opened_at, 1000, 0, &[(PaymentTender::Cash, 1000)]);
        let mut other_operator = sale(3000, 0, &[(PaymentTender::Pix, 3000)]);
        other_operator.sale.operator_id = "op-2".to_string();

        let balances = compute_expected_balances(&s, &[before_open, at_open, other_operator], &[]);

        assert_eq!(balances.cash.cents(), 1000);
        assert_eq!(balances.electronic, Money::zero());
    }

    #[test]
    fn test_movements_of_other_sessions_are_ignored() {
        let s = session(0);
        let mut foreign = movement(MovementKind::Deposit, None, 5000);
        foreign.session_id = "session-2".to_string();

        let balances = compute_expected_balances(&s, &[], &[foreign]);
        assert_eq!(balances.cash, Money::zero());
    }

    #[test]
    fn test_additive_decomposition_over_mixed_ledger() {
        let s = session(12345);
        let sales = [
            sale(1999, 1, &[(PaymentTender::Cash, 2000)]),
            sale(4550, 0, &[(PaymentTender::Pix, 4550)]),
            sale(3333, 0, &[(PaymentTender::Debit, 1111), (PaymentTender::Credit, 2222)]),
            legacy_sale(777, Some(PaymentTender::Pix)),
        ];
        let movements = [
            movement(MovementKind::Withdrawal, None, 4321),
            movement(MovementKind::Deposit, Some(MovementTender::Electronic), 10000),
            movement(MovementKind::Withdrawal, Some(MovementTender::Cash), 10000),
        ];

        let balances = compute_expected_balances(&s, &sales, &movements);
        assert_additive(&balances);
        assert_eq!(balances.cash.cents(), 12345 + 1999 - 4321 - 10000);
        assert_eq!(balances.electronic.cents(), 4550 + 3333 + 777 + 10000);
    }
}
