//! Wallet balance mutation
//!
//! Every balance change is a single conditional add in storage, never a
//! read-modify-write here. Credits and debits come in two forms: `*_in`
//! joins a caller's unit of work so a transaction row can commit with it,
//! the plain form opens and commits its own.

use std::sync::Arc;

use carewallet_db::{DbError, LedgerTx, Store, WalletDeletion};
use carewallet_types::{ensure_positive, WalletError, WalletId, WalletResult};
use rust_decimal::Decimal;
use tracing::{debug, info};

#[derive(Clone)]
pub struct WalletLedger {
    store: Arc<dyn Store>,
}

impl WalletLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Add `amount` inside `tx`; returns the new balance
    pub async fn credit_in(
        &self,
        tx: &mut dyn LedgerTx,
        wallet: WalletId,
        amount: Decimal,
    ) -> WalletResult<Decimal> {
        let amount = ensure_positive(amount)?;
        let balance = tx.adjust_balance(wallet, amount).await.map_err(ledger_error)?;
        debug!(wallet_id = %wallet, amount = %amount, balance = %balance, "Wallet credited");
        Ok(balance)
    }

    /// Remove `amount` inside `tx`; `InsufficientBalance` leaves the
    /// balance untouched
    pub async fn debit_in(
        &self,
        tx: &mut dyn LedgerTx,
        wallet: WalletId,
        amount: Decimal,
    ) -> WalletResult<Decimal> {
        let amount = ensure_positive(amount)?;
        let balance = tx.adjust_balance(wallet, -amount).await.map_err(ledger_error)?;
        debug!(wallet_id = %wallet, amount = %amount, balance = %balance, "Wallet debited");
        Ok(balance)
    }

    pub async fn credit(&self, wallet: WalletId, amount: Decimal) -> WalletResult<Decimal> {
        let mut tx = self.store.begin().await?;
        let balance = self.credit_in(tx.as_mut(), wallet, amount).await?;
        tx.commit().await?;
        Ok(balance)
    }

    pub async fn debit(&self, wallet: WalletId, amount: Decimal) -> WalletResult<Decimal> {
        let mut tx = self.store.begin().await?;
        let balance = self.debit_in(tx.as_mut(), wallet, amount).await?;
        tx.commit().await?;
        Ok(balance)
    }

    /// Delete a wallet whose balance is exactly zero
    pub async fn delete_wallet(&self, wallet: WalletId) -> WalletResult<()> {
        match self.store.delete_wallet_if_empty(wallet).await? {
            WalletDeletion::Deleted => {
                info!(wallet_id = %wallet, "Wallet deleted");
                Ok(())
            }
            WalletDeletion::HasBalance => Err(WalletError::WalletHasBalance),
            WalletDeletion::NotFound => Err(WalletError::WalletNotFound),
        }
    }
}

fn ledger_error(e: DbError) -> WalletError {
    match e {
        DbError::NotFound(_) => WalletError::WalletNotFound,
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carewallet_db::MemoryStore;
    use carewallet_types::{NewWallet, UserId};
    use rust_decimal_macros::dec;

    async fn setup() -> (WalletLedger, MemoryStore, WalletId) {
        let store = MemoryStore::new();
        let wallet = store
            .insert_wallet(NewWallet {
                creator_id: UserId::new(),
                beneficiary_id: None,
                name: "Chemo co-pay".to_string(),
                description: None,
                photo_url: None,
                funding_goal: dec!(2000),
                shareable_code: "HJKL2345".to_string(),
            })
            .await
            .unwrap();
        (WalletLedger::new(Arc::new(store.clone())), store, wallet.id)
    }

    #[tokio::test]
    async fn test_credit_and_debit() {
        let (ledger, _, wallet) = setup().await;

        assert_eq!(ledger.credit(wallet, dec!(100.00)).await.unwrap(), dec!(100.00));
        assert_eq!(ledger.debit(wallet, dec!(30.00)).await.unwrap(), dec!(70.00));
    }

    #[tokio::test]
    async fn test_overdraft_refused_without_mutation() {
        let (ledger, store, wallet) = setup().await;
        ledger.credit(wallet, dec!(10)).await.unwrap();

        let err = ledger.debit(wallet, dec!(10.01)).await.unwrap_err();
        assert_eq!(err, WalletError::InsufficientBalance);

        let stored = store.find_wallet(wallet).await.unwrap().unwrap();
        assert_eq!(stored.balance, dec!(10));
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let (ledger, _, wallet) = setup().await;

        assert_eq!(ledger.credit(wallet, Decimal::ZERO).await.unwrap_err(), WalletError::InvalidAmount);
        assert_eq!(ledger.debit(wallet, dec!(-1)).await.unwrap_err(), WalletError::InvalidAmount);
    }

    #[tokio::test]
    async fn test_unknown_wallet() {
        let (ledger, _, _) = setup().await;
        let err = ledger.credit(WalletId::new(), dec!(5)).await.unwrap_err();
        assert_eq!(err, WalletError::WalletNotFound);
    }

    #[tokio::test]
    async fn test_delete_guard() {
        let (ledger, _, wallet) = setup().await;
        ledger.credit(wallet, dec!(0.01)).await.unwrap();

        assert_eq!(ledger.delete_wallet(wallet).await.unwrap_err(), WalletError::WalletHasBalance);

        ledger.debit(wallet, dec!(0.01)).await.unwrap();
        ledger.delete_wallet(wallet).await.unwrap();
        assert_eq!(ledger.delete_wallet(wallet).await.unwrap_err(), WalletError::WalletNotFound);
    }
}
