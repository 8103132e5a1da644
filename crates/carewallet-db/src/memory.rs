//! In-memory [`Store`] for tests and local runs
//!
//! A unit of work holds the state lock for its whole lifetime and writes to
//! a private copy that replaces the shared state on commit. Dropping it
//! discards the copy. Callers must not use the store itself while holding
//! an open `LedgerTx`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use carewallet_types::{
    CodeId, IntentId, IntentStatus, NewOneTimeCode, NewPayment, NewPharmacy, NewTransaction,
    NewWallet, NewWithdrawalIntent, OneTimeCode, OtpPurpose, Payment, PaymentId, PaymentStatus,
    Pharmacy, PharmacyId, PharmacyStatus, Transaction, TransactionId, UserId, Wallet,
    WalletDetails, WalletId, WalletStatus, WithdrawalIntent,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{DbError, DbResult, LedgerTx, Store, WalletDeletion};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    wallets: HashMap<WalletId, Wallet>,
    transactions: Vec<Transaction>,
    codes: Vec<OneTimeCode>,
    pharmacies: HashMap<PharmacyId, Pharmacy>,
    payments: Vec<Payment>,
    intents: HashMap<IntentId, WithdrawalIntent>,
    blacklist: HashMap<String, (UserId, DateTime<Utc>)>,
}

/// Mock store keeping everything in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_next_transaction_insert: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next ledger-row insert fail, to exercise rollback paths
    pub fn fail_next_transaction_insert(&self) {
        self.fail_next_transaction_insert.store(true, Ordering::SeqCst);
    }

    /// Every ledger row of a wallet, oldest first
    pub async fn transactions_for(&self, wallet: WalletId) -> Vec<Transaction> {
        let state = self.state.lock().await;
        state
            .transactions
            .iter()
            .filter(|t| t.wallet_id == wallet)
            .cloned()
            .collect()
    }

    /// Move an intent's deadline, e.g. into the past
    pub async fn set_intent_expiry(&self, id: IntentId, expires_at: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        if let Some(intent) = state.intents.get_mut(&id) {
            intent.expires_at = expires_at;
        }
    }

    /// Move the deadline of every code issued to `email`
    pub async fn set_code_expiry(&self, email: &str, expires_at: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        for code in state.codes.iter_mut().filter(|c| c.email == email) {
            code.expires_at = expires_at;
        }
    }

    pub async fn code_count(&self) -> usize {
        self.state.lock().await.codes.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> DbResult<Box<dyn LedgerTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryLedgerTx {
            guard: Some(guard),
            working,
            fail_insert: self.fail_next_transaction_insert.clone(),
        }))
    }

    async fn insert_wallet(&self, wallet: NewWallet) -> DbResult<Wallet> {
        let mut state = self.state.lock().await;
        if state
            .wallets
            .values()
            .any(|w| w.shareable_code == wallet.shareable_code)
        {
            return Err(DbError::Duplicate("Shareable code already exists".to_string()));
        }
        let now = Utc::now();
        let created = Wallet {
            id: WalletId::new(),
            creator_id: wallet.creator_id,
            beneficiary_id: wallet.beneficiary_id,
            name: wallet.name,
            description: wallet.description,
            photo_url: wallet.photo_url,
            balance: Decimal::ZERO,
            funding_goal: wallet.funding_goal,
            shareable_code: wallet.shareable_code,
            status: WalletStatus::Active,
            created_at: now,
            updated_at: now,
        };
        state.wallets.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_wallet(&self, id: WalletId) -> DbResult<Option<Wallet>> {
        Ok(self.state.lock().await.wallets.get(&id).cloned())
    }

    async fn find_wallet_by_code(&self, code: &str) -> DbResult<Option<Wallet>> {
        let state = self.state.lock().await;
        Ok(state
            .wallets
            .values()
            .find(|w| w.shareable_code == code && w.is_active())
            .cloned())
    }

    async fn list_wallets_for_user(&self, user: UserId) -> DbResult<Vec<Wallet>> {
        let state = self.state.lock().await;
        let mut wallets: Vec<Wallet> = state
            .wallets
            .values()
            .filter(|w| w.creator_id == user || w.beneficiary_id == Some(user))
            .cloned()
            .collect();
        wallets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(wallets)
    }

    async fn shareable_code_exists(&self, code: &str) -> DbResult<bool> {
        let state = self.state.lock().await;
        Ok(state.wallets.values().any(|w| w.shareable_code == code))
    }

    async fn update_wallet_details(
        &self,
        id: WalletId,
        details: &WalletDetails,
    ) -> DbResult<Option<Wallet>> {
        let mut state = self.state.lock().await;
        Ok(state.wallets.get_mut(&id).map(|wallet| {
            details.apply_to(wallet);
            wallet.updated_at = Utc::now();
            wallet.clone()
        }))
    }

    async fn delete_wallet_if_empty(&self, id: WalletId) -> DbResult<WalletDeletion> {
        let mut state = self.state.lock().await;
        match state.wallets.get(&id) {
            None => Ok(WalletDeletion::NotFound),
            Some(w) if !w.can_be_deleted() => Ok(WalletDeletion::HasBalance),
            Some(_) => {
                state.wallets.remove(&id);
                state.transactions.retain(|t| t.wallet_id != id);
                state.payments.retain(|p| p.wallet_id != id);
                state.intents.retain(|_, i| i.wallet_id != id);
                Ok(WalletDeletion::Deleted)
            }
        }
    }

    async fn find_transaction(&self, id: TransactionId) -> DbResult<Option<Transaction>> {
        let state = self.state.lock().await;
        Ok(state.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn list_transactions(
        &self,
        wallet: WalletId,
        limit: u32,
        offset: u64,
    ) -> DbResult<(Vec<Transaction>, u64)> {
        let state = self.state.lock().await;
        let matching: Vec<&Transaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.wallet_id == wallet)
            .collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn insert_pharmacy(&self, pharmacy: NewPharmacy) -> DbResult<Pharmacy> {
        let mut state = self.state.lock().await;
        if state
            .pharmacies
            .values()
            .any(|p| p.short_code == pharmacy.short_code)
        {
            return Err(DbError::Duplicate("Pharmacy short code already exists".to_string()));
        }
        let now = Utc::now();
        let created = Pharmacy {
            id: PharmacyId::new(),
            name: pharmacy.name,
            short_code: pharmacy.short_code,
            registration_number: pharmacy.registration_number,
            address: pharmacy.address,
            phone: pharmacy.phone,
            email: pharmacy.email,
            status: PharmacyStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.pharmacies.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_pharmacy(&self, id: PharmacyId) -> DbResult<Option<Pharmacy>> {
        Ok(self.state.lock().await.pharmacies.get(&id).cloned())
    }

    async fn set_pharmacy_status(
        &self,
        id: PharmacyId,
        status: PharmacyStatus,
    ) -> DbResult<Option<Pharmacy>> {
        let mut state = self.state.lock().await;
        Ok(state.pharmacies.get_mut(&id).map(|p| {
            p.status = status;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn insert_code(&self, code: NewOneTimeCode) -> DbResult<OneTimeCode> {
        let mut state = self.state.lock().await;
        let created = OneTimeCode {
            id: CodeId::new(),
            email: code.email,
            purpose: code.purpose,
            code_hash: code.code_hash,
            expires_at: code.expires_at,
            used: false,
            created_at: Utc::now(),
        };
        state.codes.push(created.clone());
        Ok(created)
    }

    async fn latest_unused_code(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> DbResult<Option<OneTimeCode>> {
        let state = self.state.lock().await;
        Ok(state
            .codes
            .iter()
            .rev()
            .find(|c| c.email == email && c.purpose == purpose && !c.used)
            .cloned())
    }

    async fn consume_code(&self, id: CodeId) -> DbResult<bool> {
        let mut state = self.state.lock().await;
        match state.codes.iter_mut().find(|c| c.id == id && !c.used) {
            Some(code) => {
                code.used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_expired_codes(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.codes.len();
        state.codes.retain(|c| c.expires_at >= now);
        Ok((before - state.codes.len()) as u64)
    }

    async fn insert_payment(&self, payment: NewPayment) -> DbResult<Payment> {
        let mut state = self.state.lock().await;
        if state.payments.iter().any(|p| p.reference == payment.reference) {
            return Err(DbError::Duplicate("Payment reference already exists".to_string()));
        }
        let now = Utc::now();
        let created = Payment {
            id: PaymentId::new(),
            wallet_id: payment.wallet_id,
            reference: payment.reference,
            amount: payment.amount,
            email: payment.email,
            message: payment.message,
            status: PaymentStatus::Pending,
            gateway_reference: None,
            verified_at: None,
            created_at: now,
            updated_at: now,
        };
        state.payments.push(created.clone());
        Ok(created)
    }

    async fn find_payment_by_reference(&self, reference: &str) -> DbResult<Option<Payment>> {
        let state = self.state.lock().await;
        Ok(state.payments.iter().find(|p| p.reference == reference).cloned())
    }

    async fn fail_payment(&self, reference: &str) -> DbResult<bool> {
        let mut state = self.state.lock().await;
        match state
            .payments
            .iter_mut()
            .find(|p| p.reference == reference && p.status == PaymentStatus::Pending)
        {
            Some(payment) => {
                payment.status = PaymentStatus::Failed;
                payment.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_intent(&self, intent: NewWithdrawalIntent) -> DbResult<WithdrawalIntent> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let created = WithdrawalIntent {
            id: IntentId::new(),
            pharmacy_id: intent.pharmacy_id,
            wallet_id: intent.wallet_id,
            amount: intent.amount,
            status: IntentStatus::Pending,
            expires_at: intent.expires_at,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        };
        state.intents.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_intent(&self, id: IntentId) -> DbResult<Option<WithdrawalIntent>> {
        Ok(self.state.lock().await.intents.get(&id).cloned())
    }

    async fn list_pending_intents(
        &self,
        wallet: WalletId,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<WithdrawalIntent>> {
        let state = self.state.lock().await;
        let mut intents: Vec<WithdrawalIntent> = state
            .intents
            .values()
            .filter(|i| i.wallet_id == wallet && i.is_open(now))
            .cloned()
            .collect();
        intents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(intents)
    }

    async fn cancel_intent(&self, id: IntentId, pharmacy: PharmacyId) -> DbResult<bool> {
        let mut state = self.state.lock().await;
        match state.intents.get_mut(&id) {
            Some(intent)
                if intent.pharmacy_id == pharmacy && intent.status == IntentStatus::Pending =>
            {
                intent.status = IntentStatus::Cancelled;
                intent.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn expire_intents(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let mut state = self.state.lock().await;
        let mut expired = 0;
        for intent in state.intents.values_mut() {
            if intent.status == IntentStatus::Pending && intent.expires_at <= now {
                intent.status = IntentStatus::Expired;
                intent.updated_at = now;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn blacklist_token(
        &self,
        jti: &str,
        user: UserId,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let mut state = self.state.lock().await;
        state
            .blacklist
            .entry(jti.to_string())
            .or_insert((user, expires_at));
        Ok(())
    }

    async fn is_token_blacklisted(&self, jti: &str) -> DbResult<bool> {
        Ok(self.state.lock().await.blacklist.contains_key(jti))
    }

    async fn delete_expired_blacklist(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.blacklist.len();
        state.blacklist.retain(|_, (_, expires_at)| *expires_at >= now);
        Ok((before - state.blacklist.len()) as u64)
    }
}

struct MemoryLedgerTx {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    working: MemoryState,
    fail_insert: Arc<AtomicBool>,
}

impl MemoryLedgerTx {
    fn ensure_open(&self) -> DbResult<()> {
        if self.guard.is_none() {
            return Err(DbError::Transaction("Transaction already finished".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn adjust_balance(&mut self, wallet: WalletId, delta: Decimal) -> DbResult<Decimal> {
        self.ensure_open()?;
        let entry = self
            .working
            .wallets
            .get_mut(&wallet)
            .ok_or_else(|| DbError::NotFound(format!("Wallet {}", wallet)))?;
        let next = entry.balance + delta;
        if next < Decimal::ZERO {
            return Err(DbError::InsufficientBalance(format!(
                "Wallet {}: have {}, need {}",
                wallet, entry.balance, -delta
            )));
        }
        entry.balance = next;
        entry.updated_at = Utc::now();
        Ok(next)
    }

    async fn insert_transaction(&mut self, tx: NewTransaction) -> DbResult<Transaction> {
        self.ensure_open()?;
        if self.fail_insert.swap(false, Ordering::SeqCst) {
            return Err(DbError::Transaction("Injected insert failure".to_string()));
        }
        if !self.working.wallets.contains_key(&tx.wallet_id) {
            return Err(DbError::NotFound(format!("Wallet {}", tx.wallet_id)));
        }
        let created = tx.into_transaction(TransactionId::new(), Utc::now());
        self.working.transactions.push(created.clone());
        Ok(created)
    }

    async fn complete_payment(
        &mut self,
        reference: &str,
        gateway_reference: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Payment>> {
        self.ensure_open()?;
        Ok(self
            .working
            .payments
            .iter_mut()
            .find(|p| p.reference == reference && p.status == PaymentStatus::Pending)
            .map(|payment| {
                payment.status = PaymentStatus::Completed;
                payment.gateway_reference = gateway_reference.map(str::to_string);
                payment.verified_at = Some(now);
                payment.updated_at = now;
                payment.clone()
            }))
    }

    async fn complete_intent(
        &mut self,
        id: IntentId,
        transaction: TransactionId,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        self.ensure_open()?;
        match self.working.intents.get_mut(&id) {
            Some(intent) if intent.is_open(now) => {
                intent.status = IntentStatus::Completed;
                intent.transaction_id = Some(transaction);
                intent.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit(&mut self) -> DbResult<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| DbError::Transaction("Transaction already finished".to_string()))?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carewallet_types::ContributorInfo;
    use rust_decimal_macros::dec;

    async fn wallet(store: &MemoryStore) -> Wallet {
        store
            .insert_wallet(NewWallet {
                creator_id: UserId::new(),
                beneficiary_id: None,
                name: "Test".to_string(),
                description: None,
                photo_url: None,
                funding_goal: dec!(100),
                shareable_code: "ABCD2345".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_commit_applies_writes() {
        let store = MemoryStore::new();
        let w = wallet(&store).await;

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.adjust_balance(w.id, dec!(25)).await.unwrap(), dec!(25));
        tx.insert_transaction(NewTransaction::deposit(w.id, dec!(25), ContributorInfo::default()))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let stored = store.find_wallet(w.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, dec!(25));
        assert_eq!(store.transactions_for(w.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = MemoryStore::new();
        let w = wallet(&store).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.adjust_balance(w.id, dec!(25)).await.unwrap();
        }

        let stored = store.find_wallet(w.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_negative_balance_refused() {
        let store = MemoryStore::new();
        let w = wallet(&store).await;

        let mut tx = store.begin().await.unwrap();
        let err = tx.adjust_balance(w.id, dec!(-0.01)).await.unwrap_err();
        assert!(matches!(err, DbError::InsufficientBalance(_)));
    }

    #[tokio::test]
    async fn test_code_consumed_once() {
        let store = MemoryStore::new();
        let code = store
            .insert_code(NewOneTimeCode {
                email: "a@b.c".to_string(),
                purpose: OtpPurpose::Withdrawal,
                code_hash: "hash".to_string(),
                expires_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(store.consume_code(code.id).await.unwrap());
        assert!(!store.consume_code(code.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_wallet_hidden_by_code() {
        let store = MemoryStore::new();
        let w = wallet(&store).await;
        let details = WalletDetails {
            status: Some(WalletStatus::Inactive),
            ..Default::default()
        };
        store.update_wallet_details(w.id, &details).await.unwrap();

        assert!(store.find_wallet_by_code("ABCD2345").await.unwrap().is_none());
        assert!(store.find_wallet(w.id).await.unwrap().is_some());
    }
}
