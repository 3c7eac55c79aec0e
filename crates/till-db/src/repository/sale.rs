//! # Sale Repository
//!
//! Read access to the sales subsystem's tables, plus the one write the
//! cash desk makes: the fee sale of a tender exchange.
//!
//! ## Sale Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Shapes                                       │
//! │                                                                         │
//! │  ITEMIZED                         LEGACY                                │
//! │  sales.legacy_tender = NULL       sales.legacy_tender = 'cash' | ...    │
//! │  sale_payments: 1..n rows         sale_payments: none                   │
//! │  Σ payments = total + change      total already net of change           │
//! │                                                                         │
//! │  Both come back as SaleRecord { sale, payments }.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::ledger::BEGIN_WRITE;
use till_core::{Sale, SalePayment, SaleRecord};

const SALE_COLUMNS: &str =
    "id, company_id, operator_id, total_cents, change_cents, legacy_tender, notes, created_at";

/// Inserts a sale and its payment lines.
pub(crate) async fn insert_record(conn: &mut SqliteConnection, record: &SaleRecord) -> DbResult<()> {
    let sale = &record.sale;
    debug!(
        id = %sale.id,
        operator_id = %sale.operator_id,
        total_cents = sale.total_cents,
        payments = record.payments.len(),
        "Inserting sale"
    );

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, company_id, operator_id, total_cents, change_cents,
            legacy_tender, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.company_id)
    .bind(&sale.operator_id)
    .bind(sale.total_cents)
    .bind(sale.change_cents)
    .bind(sale.legacy_tender)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    for payment in &record.payments {
        sqlx::query(
            r#"
            INSERT INTO sale_payments (id, sale_id, tender, amount_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.tender)
        .bind(payment.amount_cents)
        .bind(payment.created_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Sales of `operator_id` at or after `since`, each with its payments.
pub(crate) async fn list_since(
    conn: &mut SqliteConnection,
    operator_id: &str,
    since: DateTime<Utc>,
) -> DbResult<Vec<SaleRecord>> {
    let sql = format!(
        "SELECT {SALE_COLUMNS} FROM sales \
         WHERE operator_id = ?1 AND created_at >= ?2 \
         ORDER BY created_at, rowid"
    );

    let sales = sqlx::query_as::<_, Sale>(&sql)
        .bind(operator_id)
        .bind(since)
        .fetch_all(&mut *conn)
        .await?;

    let payments = sqlx::query_as::<_, SalePayment>(
        r#"
        SELECT p.id, p.sale_id, p.tender, p.amount_cents, p.created_at
        FROM sale_payments p
        JOIN sales s ON s.id = p.sale_id
        WHERE s.operator_id = ?1 AND s.created_at >= ?2
        ORDER BY p.rowid
        "#,
    )
    .bind(operator_id)
    .bind(since)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_sale: HashMap<String, Vec<SalePayment>> = HashMap::new();
    for payment in payments {
        by_sale.entry(payment.sale_id.clone()).or_default().push(payment);
    }

    Ok(sales
        .into_iter()
        .map(|sale| {
            let payments = by_sale.remove(&sale.id).unwrap_or_default();
            SaleRecord { sale, payments }
        })
        .collect())
}

pub(crate) async fn get_record(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<Option<SaleRecord>> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

    let Some(sale) = sqlx::query_as::<_, Sale>(&sql)
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let payments = sqlx::query_as::<_, SalePayment>(
        "SELECT id, sale_id, tender, amount_cents, created_at \
         FROM sale_payments WHERE sale_id = ?1 ORDER BY rowid",
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(SaleRecord { sale, payments }))
}

/// Repository for sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale with its payments atomically.
    ///
    /// Used by the sales subsystem and by the demo seed.
    pub async fn insert_record(&self, record: &SaleRecord) -> DbResult<()> {
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;
        insert_record(&mut tx, record).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Sales of an operator since a timestamp (inclusive).
    pub async fn list_since(
        &self,
        operator_id: &str,
        since: DateTime<Utc>,
    ) -> DbResult<Vec<SaleRecord>> {
        let mut conn = self.pool.acquire().await?;
        list_since(&mut conn, operator_id, since).await
    }

    /// Gets a sale with its payments.
    pub async fn get_record(&self, sale_id: &str) -> DbResult<Option<SaleRecord>> {
        let mut conn = self.pool.acquire().await?;
        get_record(&mut conn, sale_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{sale_record, seed_company, test_db};
    use chrono::Duration;
    use till_core::PaymentTender;

    #[tokio::test]
    async fn test_list_since_groups_payments() {
        let db = test_db().await;
        let (company, operator, _) = seed_company(&db).await;
        let repo = db.sales();

        let since = Utc::now() - Duration::hours(1);
        let mut early = sale_record(&company, &operator, 999, 0, &[(PaymentTender::Cash, 999)]);
        early.sale.created_at = since - Duration::minutes(5);
        for p in &mut early.payments {
            p.created_at = early.sale.created_at;
        }

        let split = sale_record(
            &company,
            &operator,
            8000,
            2000,
            &[(PaymentTender::Cash, 5000), (PaymentTender::Pix, 5000)],
        );
        let mut legacy = sale_record(&company, &operator, 1500, 0, &[]);
        legacy.sale.legacy_tender = Some(PaymentTender::Debit);

        repo.insert_record(&early).await.unwrap();
        repo.insert_record(&split).await.unwrap();
        repo.insert_record(&legacy).await.unwrap();

        let listed = repo.list_since(&operator, since).await.unwrap();
        assert_eq!(listed.len(), 2);

        let got_split = listed.iter().find(|r| r.sale.id == split.sale.id).unwrap();
        assert_eq!(got_split.payments.len(), 2);
        let paid: i64 = got_split.payments.iter().map(|p| p.amount_cents).sum();
        assert_eq!(paid, 10000);
        assert_eq!(got_split.sale.change_cents, 2000);

        let got_legacy = listed.iter().find(|r| r.sale.id == legacy.sale.id).unwrap();
        assert!(got_legacy.payments.is_empty());
        assert_eq!(got_legacy.sale.legacy_tender, Some(PaymentTender::Debit));
    }

    #[tokio::test]
    async fn test_get_record() {
        let db = test_db().await;
        let (company, operator, _) = seed_company(&db).await;
        let record = sale_record(&company, &operator, 1500, 0, &[(PaymentTender::Pix, 1500)]);
        db.sales().insert_record(&record).await.unwrap();

        let got = db.sales().get_record(&record.sale.id).await.unwrap().unwrap();
        assert_eq!(got.payments.len(), 1);
        assert_eq!(got.payments[0].tender, PaymentTender::Pix);
        assert!(db.sales().get_record("missing").await.unwrap().is_none());
    }
}
