//! Database models - mapped from PostgreSQL tables
//!
//! Rows keep statuses as text; conversion into the domain types parses them
//! and rejects unknown values as corrupt rows.

use carewallet_types::{
    CodeId, ContributorInfo, IntentId, OneTimeCode, Payment, PaymentId, Pharmacy, PharmacyId,
    Transaction, TransactionId, UserId, Wallet, WalletId, WithdrawalIntent,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::DbError;

// ============================================================================
// Wallet Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbWallet {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub beneficiary_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub balance: Decimal,
    pub funding_goal: Decimal,
    pub shareable_code: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbWallet> for Wallet {
    type Error = DbError;

    fn try_from(row: DbWallet) -> Result<Self, Self::Error> {
        Ok(Wallet {
            id: WalletId(row.id),
            creator_id: UserId(row.creator_id),
            beneficiary_id: row.beneficiary_id.map(UserId),
            name: row.name,
            description: row.description,
            photo_url: row.photo_url,
            balance: row.balance,
            funding_goal: row.funding_goal,
            shareable_code: row.shareable_code,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================================================
// Transaction Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub kind: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub contributor_email: Option<String>,
    pub contributor_name: Option<String>,
    pub contributor_message: Option<String>,
    pub pharmacy_id: Option<Uuid>,
    pub pharmacy_name: Option<String>,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbTransaction> for Transaction {
    type Error = DbError;

    fn try_from(row: DbTransaction) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: TransactionId(row.id),
            wallet_id: WalletId(row.wallet_id),
            kind: row.kind.parse()?,
            amount: row.amount,
            fee: row.fee,
            net_amount: row.net_amount,
            status: row.status.parse()?,
            contributor: ContributorInfo {
                email: row.contributor_email,
                name: row.contributor_name,
                message: row.contributor_message,
            },
            pharmacy_id: row.pharmacy_id.map(PharmacyId),
            pharmacy_name: row.pharmacy_name,
            payment_reference: row.payment_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================================================
// One-Time Code Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbOneTimeCode {
    pub id: Uuid,
    pub email: String,
    pub purpose: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbOneTimeCode> for OneTimeCode {
    type Error = DbError;

    fn try_from(row: DbOneTimeCode) -> Result<Self, Self::Error> {
        Ok(OneTimeCode {
            id: CodeId(row.id),
            email: row.email,
            purpose: row.purpose.parse()?,
            code_hash: row.code_hash,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        })
    }
}

// ============================================================================
// Pharmacy Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbPharmacy {
    pub id: Uuid,
    pub name: String,
    pub short_code: String,
    pub registration_number: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbPharmacy> for Pharmacy {
    type Error = DbError;

    fn try_from(row: DbPharmacy) -> Result<Self, Self::Error> {
        Ok(Pharmacy {
            id: PharmacyId(row.id),
            name: row.name,
            short_code: row.short_code,
            registration_number: row.registration_number,
            address: row.address,
            phone: row.phone,
            email: row.email,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================================================
// Payment Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbPayment {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub reference: String,
    pub amount: Decimal,
    pub email: String,
    pub message: Option<String>,
    pub status: String,
    pub gateway_reference: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbPayment> for Payment {
    type Error = DbError;

    fn try_from(row: DbPayment) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId(row.id),
            wallet_id: WalletId(row.wallet_id),
            reference: row.reference,
            amount: row.amount,
            email: row.email,
            message: row.message,
            status: row.status.parse()?,
            gateway_reference: row.gateway_reference,
            verified_at: row.verified_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================================================
// Withdrawal Intent Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbWithdrawalIntent {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub wallet_id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbWithdrawalIntent> for WithdrawalIntent {
    type Error = DbError;

    fn try_from(row: DbWithdrawalIntent) -> Result<Self, Self::Error> {
        Ok(WithdrawalIntent {
            id: IntentId(row.id),
            pharmacy_id: PharmacyId(row.pharmacy_id),
            wallet_id: WalletId(row.wallet_id),
            amount: row.amount,
            status: row.status.parse()?,
            expires_at: row.expires_at,
            transaction_id: row.transaction_id.map(TransactionId),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Convert a batch of rows, failing on the first corrupt one
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DbError>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use carewallet_types::{TransactionKind, WalletStatus};
    use rust_decimal_macros::dec;

    #[test]
    fn test_wallet_row_conversion() {
        let now = Utc::now();
        let row = DbWallet {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            beneficiary_id: None,
            name: "Mom's chronic meds".to_string(),
            description: None,
            photo_url: None,
            balance: dec!(120.00),
            funding_goal: dec!(1000),
            shareable_code: "K7M2QXPA".to_string(),
            status: "inactive".to_string(),
            created_at: now,
            updated_at: now,
        };
        let wallet = Wallet::try_from(row).unwrap();
        assert_eq!(wallet.status, WalletStatus::Inactive);
        assert_eq!(wallet.balance, dec!(120.00));
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let now = Utc::now();
        let row = DbTransaction {
            id: Uuid::new_v4(),
            wallet_id: Uuid::new_v4(),
            kind: "refund".to_string(),
            amount: dec!(5),
            fee: Decimal::ZERO,
            net_amount: dec!(5),
            status: "completed".to_string(),
            contributor_email: None,
            contributor_name: None,
            contributor_message: None,
            pharmacy_id: None,
            pharmacy_name: None,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(Transaction::try_from(row), Err(DbError::Corrupt(_))));
        assert_eq!(TransactionKind::Deposit.as_str(), "deposit");
    }
}
