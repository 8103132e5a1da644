//! Withdrawal intent repository

use carewallet_types::NewWithdrawalIntent;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{DbResult, DbWithdrawalIntent};

pub struct IntentRepo {
    pool: PgPool,
}

impl IntentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, intent: &NewWithdrawalIntent) -> DbResult<DbWithdrawalIntent> {
        let row = sqlx::query_as::<_, DbWithdrawalIntent>(
            r#"
            INSERT INTO withdrawal_intents (id, pharmacy_id, wallet_id, amount, status, expires_at)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(intent.pharmacy_id.as_uuid())
        .bind(intent.wallet_id.as_uuid())
        .bind(intent.amount)
        .bind(intent.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbWithdrawalIntent>> {
        let row = sqlx::query_as::<_, DbWithdrawalIntent>(
            "SELECT * FROM withdrawal_intents WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_pending(
        &self,
        wallet_id: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<DbWithdrawalIntent>> {
        let rows = sqlx::query_as::<_, DbWithdrawalIntent>(
            r#"
            SELECT * FROM withdrawal_intents
            WHERE wallet_id = $1 AND status = 'pending' AND expires_at > $2
            ORDER BY created_at DESC
            "#
        )
        .bind(wallet_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn cancel(&self, id: Uuid, pharmacy_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE withdrawal_intents SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND pharmacy_id = $2 AND status = 'pending'
            "#
        )
        .bind(id)
        .bind(pharmacy_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn expire_stale(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE withdrawal_intents SET status = 'expired', updated_at = NOW()
            WHERE status = 'pending' AND expires_at <= $1
            "#
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Pending and unexpired to completed inside the caller's transaction
    pub async fn complete(
        conn: &mut PgConnection,
        id: Uuid,
        transaction_id: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE withdrawal_intents
            SET status = 'completed', transaction_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending' AND expires_at > $3
            "#
        )
        .bind(id)
        .bind(transaction_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
