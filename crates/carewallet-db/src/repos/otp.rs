//! One-time code repository

use carewallet_types::NewOneTimeCode;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbOneTimeCode, DbResult};

pub struct OneTimeCodeRepo {
    pool: PgPool,
}

impl OneTimeCodeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, code: &NewOneTimeCode) -> DbResult<DbOneTimeCode> {
        let row = sqlx::query_as::<_, DbOneTimeCode>(
            r#"
            INSERT INTO one_time_codes (id, email, purpose, code_hash, expires_at, used)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(&code.email)
        .bind(code.purpose.as_str())
        .bind(&code.code_hash)
        .bind(code.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// The most recently issued unused code for (email, purpose)
    pub async fn latest_unused(&self, email: &str, purpose: &str) -> DbResult<Option<DbOneTimeCode>> {
        let row = sqlx::query_as::<_, DbOneTimeCode>(
            r#"
            SELECT * FROM one_time_codes
            WHERE email = $1 AND purpose = $2 AND used = FALSE
            ORDER BY created_at DESC
            LIMIT 1
            "#
        )
        .bind(email)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Conditional flip: exactly one concurrent caller sees `true`
    pub async fn mark_used(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("UPDATE one_time_codes SET used = TRUE WHERE id = $1 AND used = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM one_time_codes WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
