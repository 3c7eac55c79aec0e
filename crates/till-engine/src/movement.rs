//! # Manual Movements
//!
//! Withdrawals and deposits an operator records against the OPEN session.
//! Each call appends exactly one immutable `CashMovement`; corrections are
//! new counter-entries.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use till_core::validation::{normalize_description, validate_positive_amount};
use till_core::{CashMovement, Money, MovementKind, MovementTender};

use crate::desk::{require_open_session, CashDesk};
use crate::error::{EngineError, EngineResult};
use crate::identity::Identity;

impl CashDesk {
    /// Appends a withdrawal or deposit to the caller's OPEN session.
    ///
    /// ## Errors
    /// * `Validation` - OPENING kind, amount ≤ 0, description too long
    /// * `InvalidState` - the caller has no OPEN session
    pub async fn record_movement(
        &self,
        identity: &Identity,
        kind: MovementKind,
        amount: Money,
        tender: MovementTender,
        description: &str,
    ) -> EngineResult<CashMovement> {
        if kind == MovementKind::Opening {
            return Err(EngineError::Validation(
                "Opening movements are only written when a session opens".to_string(),
            ));
        }
        validate_positive_amount("amount", amount)?;
        let description = normalize_description(description)?;

        let mut tx = self.db.begin().await?;
        let session = require_open_session(&mut tx, identity).await?;

        let movement = CashMovement {
            id: Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            operator_id: identity.operator_id.clone(),
            kind,
            amount_cents: amount.cents(),
            tender: Some(tender),
            description,
            created_at: Utc::now(),
        };

        tx.insert_movement(&movement).await?;
        tx.commit().await?;

        info!(
            session_id = %session.id,
            movement_id = %movement.id,
            kind = ?movement.kind,
            tender = ?tender,
            amount_cents = movement.amount_cents,
            "Cash movement recorded"
        );

        Ok(movement)
    }

    pub async fn record_withdrawal(
        &self,
        identity: &Identity,
        amount: Money,
        tender: MovementTender,
        description: &str,
    ) -> EngineResult<CashMovement> {
        self.record_movement(identity, MovementKind::Withdrawal, amount, tender, description)
            .await
    }

    pub async fn record_deposit(
        &self,
        identity: &Identity,
        amount: Money,
        tender: MovementTender,
        description: &str,
    ) -> EngineResult<CashMovement> {
        self.record_movement(identity, MovementKind::Deposit, amount, tender, description)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{money, seed_company, test_desk};

    #[tokio::test]
    async fn test_withdrawal_reduces_cash_exactly() {
        let desk = test_desk().await;
        let fx = seed_company(&desk).await;
        desk.open(&fx.operator, money("100")).await.unwrap();

        let before = desk.get_status(&fx.operator).await.unwrap().unwrap().balances;
        desk.record_withdrawal(&fx.operator, money("30.00"), MovementTender::Cash, "bank run")
            .await
            .unwrap();
        let after = desk.get_status(&fx.operator).await.unwrap().unwrap().balances;

        assert_eq!(before.cash - after.cash, money("30.00"));
        assert_eq!(after.electronic, before.electronic);
    }

    #[tokio::test]
    async fn test_electronic_deposit_and_history_order() {
        let desk = test_desk().await;
        let fx = seed_company(&desk).await;
        desk.open(&fx.operator, money("50")).await.unwrap();

        let deposit = desk
            .record_deposit(&fx.operator, money("12.50"), MovementTender::Electronic, " pix refund ")
            .await
            .unwrap();
        assert_eq!(deposit.description, "pix refund");

        let status = desk.get_status(&fx.operator).await.unwrap().unwrap();
        assert_eq!(status.balances.electronic, money("12.50"));
        assert_eq!(status.balances.cash, money("50"));
        assert_eq!(status.balances.total, money("62.50"));
        assert_eq!(status.movements[0].id, deposit.id);
        assert_eq!(status.movements[1].kind, MovementKind::Opening);
    }

    #[tokio::test]
    async fn test_amount_must_be_positive() {
        let desk = test_desk().await;
        let fx = seed_company(&desk).await;
        desk.open(&fx.operator, money("100")).await.unwrap();

        for amount in ["0", "-5"] {
            let err = desk
                .record_withdrawal(&fx.operator, money(amount), MovementTender::Cash, "")
                .await
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::ValidationError);
        }
    }

    #[tokio::test]
    async fn test_opening_kind_is_rejected() {
        let desk = test_desk().await;
        let fx = seed_company(&desk).await;
        desk.open(&fx.operator, money("100")).await.unwrap();

        let err = desk
            .record_movement(
                &fx.operator,
                MovementKind::Opening,
                money("10"),
                MovementTender::Cash,
                "",
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_requires_open_session() {
        let desk = test_desk().await;
        let fx = seed_company(&desk).await;

        let err = desk
            .record_deposit(&fx.operator, money("10"), MovementTender::Cash, "")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);
    }
}
