//! Gateway payment repository

use carewallet_types::NewPayment;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::repos::map_unique;
use crate::{DbPayment, DbResult};

pub struct PaymentRepo {
    pool: PgPool,
}

impl PaymentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, payment: &NewPayment) -> DbResult<DbPayment> {
        let row = sqlx::query_as::<_, DbPayment>(
            r#"
            INSERT INTO payments (id, wallet_id, reference, amount, email, message, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(payment.wallet_id.as_uuid())
        .bind(&payment.reference)
        .bind(payment.amount)
        .bind(&payment.email)
        .bind(&payment.message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "Payment reference"))?;
        Ok(row)
    }

    pub async fn find_by_reference(&self, reference: &str) -> DbResult<Option<DbPayment>> {
        let row = sqlx::query_as::<_, DbPayment>("SELECT * FROM payments WHERE reference = $1")
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn fail(&self, reference: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'failed', updated_at = NOW() WHERE reference = $1 AND status = 'pending'"
        )
        .bind(reference)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Pending to completed inside the caller's transaction
    pub async fn complete(
        conn: &mut PgConnection,
        reference: &str,
        gateway_reference: Option<&str>,
        verified_at: DateTime<Utc>,
    ) -> DbResult<Option<DbPayment>> {
        let row = sqlx::query_as::<_, DbPayment>(
            r#"
            UPDATE payments
            SET status = 'completed', gateway_reference = $2, verified_at = $3, updated_at = NOW()
            WHERE reference = $1 AND status = 'pending'
            RETURNING *
            "#
        )
        .bind(reference)
        .bind(gateway_reference)
        .bind(verified_at)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }
}
