//! Transaction (ledger row) repository

use carewallet_types::NewTransaction;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{DbResult, DbTransaction};

pub struct TransactionRepo {
    pool: PgPool,
}

impl TransactionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a ledger row inside the caller's transaction
    pub async fn insert(conn: &mut PgConnection, tx: &NewTransaction) -> DbResult<DbTransaction> {
        let row = sqlx::query_as::<_, DbTransaction>(
            r#"
            INSERT INTO transactions
                (id, wallet_id, kind, amount, fee, net_amount, status,
                 contributor_email, contributor_name, contributor_message,
                 pharmacy_id, pharmacy_name, payment_reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(tx.wallet_id.as_uuid())
        .bind(tx.kind.as_str())
        .bind(tx.amount)
        .bind(tx.fee)
        .bind(tx.net_amount)
        .bind(tx.status.as_str())
        .bind(&tx.contributor.email)
        .bind(&tx.contributor.name)
        .bind(&tx.contributor.message)
        .bind(tx.pharmacy_id.map(|p| p.as_uuid()))
        .bind(&tx.pharmacy_name)
        .bind(&tx.payment_reference)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbTransaction>> {
        let row = sqlx::query_as::<_, DbTransaction>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_by_wallet(
        &self,
        wallet_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<DbTransaction>> {
        let rows = sqlx::query_as::<_, DbTransaction>(
            r#"
            SELECT * FROM transactions
            WHERE wallet_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        )
        .bind(wallet_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_by_wallet(&self, wallet_id: Uuid) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE wallet_id = $1")
            .bind(wallet_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
