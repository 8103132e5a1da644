//! Wallet repository
//!
//! Balance changes only happen through [`WalletRepo::adjust_balance`], which
//! runs on a caller-owned connection so it shares the ledger row's unit of
//! work.

use carewallet_types::{NewWallet, WalletDetails};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::repos::map_unique;
use crate::{DbError, DbResult, DbWallet, WalletDeletion};

/// Wallet repository for metadata and balances
pub struct WalletRepo {
    pool: PgPool,
}

impl WalletRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new wallet with a zero balance
    pub async fn create(&self, wallet: &NewWallet) -> DbResult<DbWallet> {
        let row = sqlx::query_as::<_, DbWallet>(
            r#"
            INSERT INTO wallets
                (id, creator_id, beneficiary_id, name, description, photo_url, balance, funding_goal, shareable_code, status)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, 'active')
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(wallet.creator_id.as_uuid())
        .bind(wallet.beneficiary_id.map(|u| u.as_uuid()))
        .bind(&wallet.name)
        .bind(&wallet.description)
        .bind(&wallet.photo_url)
        .bind(wallet.funding_goal)
        .bind(&wallet.shareable_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "Shareable code"))?;

        Ok(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbWallet>> {
        let row = sqlx::query_as::<_, DbWallet>("SELECT * FROM wallets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Public lookup: inactive and closed wallets are invisible
    pub async fn find_active_by_code(&self, code: &str) -> DbResult<Option<DbWallet>> {
        let row = sqlx::query_as::<_, DbWallet>(
            "SELECT * FROM wallets WHERE shareable_code = $1 AND status = 'active'"
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Wallets the user created or is the beneficiary of
    pub async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<DbWallet>> {
        let rows = sqlx::query_as::<_, DbWallet>(
            r#"
            SELECT * FROM wallets
            WHERE creator_id = $1 OR beneficiary_id = $1
            ORDER BY created_at DESC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn code_exists(&self, code: &str) -> DbResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM wallets WHERE shareable_code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Patch descriptive fields; the balance column is never touched here
    pub async fn update_details(
        &self,
        id: Uuid,
        details: &WalletDetails,
    ) -> DbResult<Option<DbWallet>> {
        let row = sqlx::query_as::<_, DbWallet>(
            r#"
            UPDATE wallets SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                photo_url = COALESCE($4, photo_url),
                funding_goal = COALESCE($5, funding_goal),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(id)
        .bind(&details.name)
        .bind(&details.description)
        .bind(&details.photo_url)
        .bind(details.funding_goal)
        .bind(details.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Delete only when the balance is exactly zero
    pub async fn delete_if_empty(&self, id: Uuid) -> DbResult<WalletDeletion> {
        let result = sqlx::query("DELETE FROM wallets WHERE id = $1 AND balance = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(WalletDeletion::Deleted);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM wallets WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists {
            WalletDeletion::HasBalance
        } else {
            WalletDeletion::NotFound
        })
    }

    // =========================================================================
    // Balance Operations
    // =========================================================================

    /// Apply a signed delta to a wallet balance inside the caller's
    /// transaction. Check and write are one conditional `UPDATE`; the row
    /// lock it takes serializes concurrent adjustments of the same wallet.
    pub async fn adjust_balance(
        conn: &mut PgConnection,
        wallet_id: Uuid,
        delta: Decimal,
    ) -> DbResult<Decimal> {
        let updated: Option<Decimal> = sqlx::query_scalar(
            r#"
            UPDATE wallets
            SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1 AND balance + $2 >= 0
            RETURNING balance
            "#
        )
        .bind(wallet_id)
        .bind(delta)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(balance) = updated {
            return Ok(balance);
        }

        let current: Option<Decimal> = sqlx::query_scalar("SELECT balance FROM wallets WHERE id = $1")
            .bind(wallet_id)
            .fetch_optional(&mut *conn)
            .await?;

        match current {
            Some(current) => Err(DbError::InsufficientBalance(format!(
                "Wallet {}: have {}, need {}",
                wallet_id, current, -delta
            ))),
            None => Err(DbError::NotFound(format!("Wallet {}", wallet_id))),
        }
    }
}
