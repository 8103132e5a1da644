//! PostgreSQL implementation of [`Store`]

use async_trait::async_trait;
use carewallet_types::{
    CodeId, IntentId, NewOneTimeCode, NewPayment, NewPharmacy, NewTransaction, NewWallet,
    NewWithdrawalIntent, OneTimeCode, OtpPurpose, Payment, Pharmacy, PharmacyId, PharmacyStatus,
    Transaction, TransactionId, UserId, Wallet, WalletDetails, WalletId, WithdrawalIntent,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres};

use crate::models::convert_all;
use crate::{
    DbError, DbResult, IntentRepo, LedgerTx, OneTimeCodeRepo, PaymentRepo, PharmacyRepo, Store,
    TokenBlacklistRepo, TransactionRepo, WalletDeletion, WalletRepo,
};

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn wallets(&self) -> WalletRepo {
        WalletRepo::new(self.pool.clone())
    }

    fn transactions(&self) -> TransactionRepo {
        TransactionRepo::new(self.pool.clone())
    }

    fn codes(&self) -> OneTimeCodeRepo {
        OneTimeCodeRepo::new(self.pool.clone())
    }

    fn pharmacies(&self) -> PharmacyRepo {
        PharmacyRepo::new(self.pool.clone())
    }

    fn payments(&self) -> PaymentRepo {
        PaymentRepo::new(self.pool.clone())
    }

    fn intents(&self) -> IntentRepo {
        IntentRepo::new(self.pool.clone())
    }

    fn blacklist(&self) -> TokenBlacklistRepo {
        TokenBlacklistRepo::new(self.pool.clone())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> DbResult<Box<dyn LedgerTx>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::Transaction(e.to_string()))?;
        Ok(Box::new(PgLedgerTx { tx: Some(tx) }))
    }

    async fn insert_wallet(&self, wallet: NewWallet) -> DbResult<Wallet> {
        self.wallets().create(&wallet).await?.try_into()
    }

    async fn find_wallet(&self, id: WalletId) -> DbResult<Option<Wallet>> {
        self.wallets()
            .find_by_id(id.as_uuid())
            .await?
            .map(Wallet::try_from)
            .transpose()
    }

    async fn find_wallet_by_code(&self, code: &str) -> DbResult<Option<Wallet>> {
        self.wallets()
            .find_active_by_code(code)
            .await?
            .map(Wallet::try_from)
            .transpose()
    }

    async fn list_wallets_for_user(&self, user: UserId) -> DbResult<Vec<Wallet>> {
        convert_all(self.wallets().list_for_user(user.as_uuid()).await?)
    }

    async fn shareable_code_exists(&self, code: &str) -> DbResult<bool> {
        self.wallets().code_exists(code).await
    }

    async fn update_wallet_details(
        &self,
        id: WalletId,
        details: &WalletDetails,
    ) -> DbResult<Option<Wallet>> {
        self.wallets()
            .update_details(id.as_uuid(), details)
            .await?
            .map(Wallet::try_from)
            .transpose()
    }

    async fn delete_wallet_if_empty(&self, id: WalletId) -> DbResult<WalletDeletion> {
        self.wallets().delete_if_empty(id.as_uuid()).await
    }

    async fn find_transaction(&self, id: TransactionId) -> DbResult<Option<Transaction>> {
        self.transactions()
            .find_by_id(id.as_uuid())
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    async fn list_transactions(
        &self,
        wallet: WalletId,
        limit: u32,
        offset: u64,
    ) -> DbResult<(Vec<Transaction>, u64)> {
        let offset = i64::try_from(offset)
            .map_err(|_| DbError::InvalidInput(format!("Offset {} out of range", offset)))?;
        let repo = self.transactions();
        let rows = repo
            .list_by_wallet(wallet.as_uuid(), i64::from(limit), offset)
            .await?;
        let total = repo.count_by_wallet(wallet.as_uuid()).await?;
        Ok((convert_all(rows)?, total.max(0) as u64))
    }

    async fn insert_pharmacy(&self, pharmacy: NewPharmacy) -> DbResult<Pharmacy> {
        self.pharmacies().create(&pharmacy).await?.try_into()
    }

    async fn find_pharmacy(&self, id: PharmacyId) -> DbResult<Option<Pharmacy>> {
        self.pharmacies()
            .find_by_id(id.as_uuid())
            .await?
            .map(Pharmacy::try_from)
            .transpose()
    }

    async fn set_pharmacy_status(
        &self,
        id: PharmacyId,
        status: PharmacyStatus,
    ) -> DbResult<Option<Pharmacy>> {
        self.pharmacies()
            .set_status(id.as_uuid(), status.as_str())
            .await?
            .map(Pharmacy::try_from)
            .transpose()
    }

    async fn insert_code(&self, code: NewOneTimeCode) -> DbResult<OneTimeCode> {
        self.codes().create(&code).await?.try_into()
    }

    async fn latest_unused_code(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> DbResult<Option<OneTimeCode>> {
        self.codes()
            .latest_unused(email, purpose.as_str())
            .await?
            .map(OneTimeCode::try_from)
            .transpose()
    }

    async fn consume_code(&self, id: CodeId) -> DbResult<bool> {
        self.codes().mark_used(id.as_uuid()).await
    }

    async fn delete_expired_codes(&self, now: DateTime<Utc>) -> DbResult<u64> {
        self.codes().delete_expired(now).await
    }

    async fn insert_payment(&self, payment: NewPayment) -> DbResult<Payment> {
        self.payments().create(&payment).await?.try_into()
    }

    async fn find_payment_by_reference(&self, reference: &str) -> DbResult<Option<Payment>> {
        self.payments()
            .find_by_reference(reference)
            .await?
            .map(Payment::try_from)
            .transpose()
    }

    async fn fail_payment(&self, reference: &str) -> DbResult<bool> {
        self.payments().fail(reference).await
    }

    async fn insert_intent(&self, intent: NewWithdrawalIntent) -> DbResult<WithdrawalIntent> {
        self.intents().create(&intent).await?.try_into()
    }

    async fn find_intent(&self, id: IntentId) -> DbResult<Option<WithdrawalIntent>> {
        self.intents()
            .find_by_id(id.as_uuid())
            .await?
            .map(WithdrawalIntent::try_from)
            .transpose()
    }

    async fn list_pending_intents(
        &self,
        wallet: WalletId,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<WithdrawalIntent>> {
        convert_all(self.intents().list_pending(wallet.as_uuid(), now).await?)
    }

    async fn cancel_intent(&self, id: IntentId, pharmacy: PharmacyId) -> DbResult<bool> {
        self.intents().cancel(id.as_uuid(), pharmacy.as_uuid()).await
    }

    async fn expire_intents(&self, now: DateTime<Utc>) -> DbResult<u64> {
        self.intents().expire_stale(now).await
    }

    async fn blacklist_token(
        &self,
        jti: &str,
        user: UserId,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        self.blacklist().add(jti, user.as_uuid(), expires_at).await
    }

    async fn is_token_blacklisted(&self, jti: &str) -> DbResult<bool> {
        self.blacklist().contains(jti).await
    }

    async fn delete_expired_blacklist(&self, now: DateTime<Utc>) -> DbResult<u64> {
        self.blacklist().delete_expired(now).await
    }
}

/// A PostgreSQL transaction; rolled back by sqlx on drop unless committed
pub struct PgLedgerTx {
    tx: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PgLedgerTx {
    fn conn(&mut self) -> DbResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| DbError::Transaction("Transaction already finished".to_string()))
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn adjust_balance(&mut self, wallet: WalletId, delta: Decimal) -> DbResult<Decimal> {
        WalletRepo::adjust_balance(self.conn()?, wallet.as_uuid(), delta).await
    }

    async fn insert_transaction(&mut self, tx: NewTransaction) -> DbResult<Transaction> {
        TransactionRepo::insert(self.conn()?, &tx).await?.try_into()
    }

    async fn complete_payment(
        &mut self,
        reference: &str,
        gateway_reference: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Payment>> {
        PaymentRepo::complete(self.conn()?, reference, gateway_reference, now)
            .await?
            .map(Payment::try_from)
            .transpose()
    }

    async fn complete_intent(
        &mut self,
        id: IntentId,
        transaction: TransactionId,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        IntentRepo::complete(self.conn()?, id.as_uuid(), transaction.as_uuid(), now).await
    }

    async fn commit(&mut self) -> DbResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DbError::Transaction("Transaction already finished".to_string()))?;
        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(e.to_string()))
    }
}
