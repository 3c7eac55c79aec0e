//! # Tender Exchange
//!
//! A customer pays electronically and takes cash back; the spread is the
//! till's fee.
//!
//! ## Ledger Entries (one transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  exchange_electronic_for_cash(in: 115.00, out: 100.00)                  │
//! │                                                                         │
//! │  fee = in − out = 15.00                                                 │
//! │                                                                         │
//! │  1. Sale 15.00, one PIX payment     (only when fee > 0)   electronic +15│
//! │  2. DEPOSIT 100.00, ELECTRONIC                            electronic +100│
//! │  3. WITHDRAWAL 100.00, CASH                               cash −100     │
//! │                                                                         │
//! │  net till value: +15.00                                                 │
//! │  All three carry the marker "[xchg:<uuid>]" for audit reassembly.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Either every entry commits or none does; a failure at any step rolls the
//! whole exchange back.

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use till_core::validation::validate_positive_amount;
use till_core::{
    CashMovement, Money, MovementKind, MovementTender, PaymentTender, Sale, SalePayment,
    SaleRecord,
};

use crate::desk::{require_open_session, CashDesk};
use crate::error::{EngineError, EngineResult};
use crate::identity::Identity;

/// Description/notes tag shared by every entry of one exchange.
pub fn exchange_marker(correlation_id: &str) -> String {
    format!("[xchg:{correlation_id}]")
}

/// What an exchange wrote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeReceipt {
    pub correlation_id: String,
    pub session_id: String,
    pub electronic_in: Money,
    pub cash_out: Money,
    pub fee: Money,
    /// `None` when the exchange carried no fee.
    pub fee_sale_id: Option<String>,
    pub deposit: CashMovement,
    pub withdrawal: CashMovement,
}

impl CashDesk {
    /// Swaps an electronic payment for cash handed to the customer.
    ///
    /// ## Errors
    /// * `Validation` - an amount ≤ 0, or cash out above electronic in
    /// * `InvalidState` - the caller has no OPEN session
    /// * `Internal` - a ledger write failed; nothing was persisted
    pub async fn exchange_electronic_for_cash(
        &self,
        identity: &Identity,
        electronic_in: Money,
        cash_out: Money,
    ) -> EngineResult<ExchangeReceipt> {
        validate_positive_amount("electronic amount", electronic_in)?;
        validate_positive_amount("cash amount", cash_out)?;

        let fee = electronic_in - cash_out;
        if fee.is_negative() {
            return Err(EngineError::Validation(format!(
                "Cash handed out ({cash_out}) cannot exceed the electronic amount received ({electronic_in})"
            )));
        }

        let correlation_id = Uuid::new_v4().to_string();
        let marker = exchange_marker(&correlation_id);

        let mut tx = self.db.begin().await?;
        let session = require_open_session(&mut tx, identity).await?;
        let now = Utc::now();

        let fee_sale_id = if fee.is_positive() {
            let sale_id = Uuid::new_v4().to_string();
            let record = SaleRecord {
                sale: Sale {
                    id: sale_id.clone(),
                    company_id: identity.company_id.clone(),
                    operator_id: identity.operator_id.clone(),
                    total_cents: fee.cents(),
                    change_cents: 0,
                    legacy_tender: None,
                    notes: Some(format!("Tender exchange fee {marker}")),
                    created_at: now,
                },
                payments: vec![SalePayment {
                    id: Uuid::new_v4().to_string(),
                    sale_id: sale_id.clone(),
                    tender: PaymentTender::Pix,
                    amount_cents: fee.cents(),
                    created_at: now,
                }],
            };
            tx.insert_sale_record(&record).await?;
            Some(sale_id)
        } else {
            None
        };

        let entry = |kind, tender, description: String| CashMovement {
            id: Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            operator_id: identity.operator_id.clone(),
            kind,
            amount_cents: cash_out.cents(),
            tender: Some(tender),
            description,
            created_at: now,
        };

        let deposit = entry(
            MovementKind::Deposit,
            MovementTender::Electronic,
            format!("Tender exchange: electronic received {marker}"),
        );
        let withdrawal = entry(
            MovementKind::Withdrawal,
            MovementTender::Cash,
            format!("Tender exchange: cash handed out {marker}"),
        );

        tx.insert_movement(&deposit).await?;
        tx.insert_movement(&withdrawal).await?;
        tx.commit().await?;

        info!(
            session_id = %session.id,
            correlation_id = %correlation_id,
            electronic_in_cents = electronic_in.cents(),
            cash_out_cents = cash_out.cents(),
            fee_cents = fee.cents(),
            "Tender exchange recorded"
        );

        Ok(ExchangeReceipt {
            correlation_id,
            session_id: session.id,
            electronic_in,
            cash_out,
            fee,
            fee_sale_id,
            deposit,
            withdrawal,
        })
    }

    /// Movements of one exchange recorded by the caller, oldest first.
    pub async fn exchange_entries(
        &self,
        identity: &Identity,
        correlation_id: &str,
    ) -> EngineResult<Vec<CashMovement>> {
        let movements = self
            .db
            .movements()
            .find_by_marker(&exchange_marker(correlation_id))
            .await?;

        Ok(movements
            .into_iter()
            .filter(|m| m.operator_id == identity.operator_id)
            .collect())
    }
}
