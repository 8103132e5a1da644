//! Storage seam
//!
//! `Store` is everything the wallet core needs from persistence. Reads and
//! single-row conditional updates run directly against it; anything that
//! must move a balance together with a ledger row goes through a
//! [`LedgerTx`] obtained from [`Store::begin`].
//!
//! Dropping a `LedgerTx` without calling [`LedgerTx::commit`] rolls back
//! every write made through it.

use async_trait::async_trait;
use carewallet_types::{
    IntentId, NewOneTimeCode, NewPayment, NewPharmacy, NewTransaction, NewWallet,
    NewWithdrawalIntent, OneTimeCode, OtpPurpose, Payment, Pharmacy, PharmacyId, PharmacyStatus,
    Transaction, TransactionId, UserId, Wallet, WalletDetails, WalletId, WithdrawalIntent,
    CodeId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::DbResult;

/// Outcome of a guarded wallet delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletDeletion {
    Deleted,
    NotFound,
    HasBalance,
}

/// Persistence operations used by the wallet core
#[async_trait]
pub trait Store: Send + Sync {
    /// Start an atomic unit of work
    async fn begin(&self) -> DbResult<Box<dyn LedgerTx>>;

    // Wallets
    async fn insert_wallet(&self, wallet: NewWallet) -> DbResult<Wallet>;
    async fn find_wallet(&self, id: WalletId) -> DbResult<Option<Wallet>>;
    /// Only active wallets are visible by shareable code
    async fn find_wallet_by_code(&self, code: &str) -> DbResult<Option<Wallet>>;
    async fn list_wallets_for_user(&self, user: UserId) -> DbResult<Vec<Wallet>>;
    async fn shareable_code_exists(&self, code: &str) -> DbResult<bool>;
    async fn update_wallet_details(
        &self,
        id: WalletId,
        details: &WalletDetails,
    ) -> DbResult<Option<Wallet>>;
    async fn delete_wallet_if_empty(&self, id: WalletId) -> DbResult<WalletDeletion>;

    // Transactions
    async fn find_transaction(&self, id: TransactionId) -> DbResult<Option<Transaction>>;
    /// Newest first, with the total row count for the wallet
    async fn list_transactions(
        &self,
        wallet: WalletId,
        limit: u32,
        offset: u64,
    ) -> DbResult<(Vec<Transaction>, u64)>;

    // Pharmacies
    async fn insert_pharmacy(&self, pharmacy: NewPharmacy) -> DbResult<Pharmacy>;
    async fn find_pharmacy(&self, id: PharmacyId) -> DbResult<Option<Pharmacy>>;
    async fn set_pharmacy_status(
        &self,
        id: PharmacyId,
        status: PharmacyStatus,
    ) -> DbResult<Option<Pharmacy>>;

    // One-time codes
    async fn insert_code(&self, code: NewOneTimeCode) -> DbResult<OneTimeCode>;
    async fn latest_unused_code(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> DbResult<Option<OneTimeCode>>;
    /// Flip `used` from false to true; returns false if someone else won
    async fn consume_code(&self, id: CodeId) -> DbResult<bool>;
    async fn delete_expired_codes(&self, now: DateTime<Utc>) -> DbResult<u64>;

    // Payments
    async fn insert_payment(&self, payment: NewPayment) -> DbResult<Payment>;
    async fn find_payment_by_reference(&self, reference: &str) -> DbResult<Option<Payment>>;
    /// Move a pending payment to failed; returns false if it was not pending
    async fn fail_payment(&self, reference: &str) -> DbResult<bool>;

    // Withdrawal intents
    async fn insert_intent(&self, intent: NewWithdrawalIntent) -> DbResult<WithdrawalIntent>;
    async fn find_intent(&self, id: IntentId) -> DbResult<Option<WithdrawalIntent>>;
    async fn list_pending_intents(
        &self,
        wallet: WalletId,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<WithdrawalIntent>>;
    /// Cancel a pending intent owned by `pharmacy`; returns false otherwise
    async fn cancel_intent(&self, id: IntentId, pharmacy: PharmacyId) -> DbResult<bool>;
    async fn expire_intents(&self, now: DateTime<Utc>) -> DbResult<u64>;

    // Token blacklist
    async fn blacklist_token(
        &self,
        jti: &str,
        user: UserId,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()>;
    async fn is_token_blacklisted(&self, jti: &str) -> DbResult<bool>;
    async fn delete_expired_blacklist(&self, now: DateTime<Utc>) -> DbResult<u64>;
}

/// An open unit of work
#[async_trait]
pub trait LedgerTx: Send {
    /// Apply `delta` to the wallet balance and return the new balance.
    ///
    /// Fails with `InsufficientBalance` when the result would be negative
    /// and `NotFound` when the wallet does not exist. The wallet row stays
    /// locked until commit or rollback.
    async fn adjust_balance(&mut self, wallet: WalletId, delta: Decimal) -> DbResult<Decimal>;

    async fn insert_transaction(&mut self, tx: NewTransaction) -> DbResult<Transaction>;

    /// Move a pending payment to completed; `None` if it was not pending
    async fn complete_payment(
        &mut self,
        reference: &str,
        gateway_reference: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Payment>>;

    /// Move a pending, unexpired intent to completed and link its
    /// transaction; returns false if it was not open
    async fn complete_intent(
        &mut self,
        id: IntentId,
        transaction: TransactionId,
        now: DateTime<Utc>,
    ) -> DbResult<bool>;

    async fn commit(&mut self) -> DbResult<()>;
}
