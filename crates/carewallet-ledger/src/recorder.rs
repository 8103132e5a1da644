//! Transaction record
//!
//! Appends immutable ledger rows and pages through them. Recording never
//! moves a balance; callers pair it with a [`crate::WalletLedger`] call in
//! the same unit of work.

use std::sync::Arc;

use carewallet_db::{LedgerTx, Store};
use carewallet_types::{
    ensure_positive, NewTransaction, Page, Transaction, TransactionId, WalletError, WalletId,
    WalletResult,
};
use rust_decimal::Decimal;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct TransactionRecorder {
    store: Arc<dyn Store>,
}

impl TransactionRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate and append a row inside `tx`
    pub async fn record_in(
        &self,
        tx: &mut dyn LedgerTx,
        new: NewTransaction,
    ) -> WalletResult<Transaction> {
        validate(&new)?;
        Ok(tx.insert_transaction(new).await?)
    }

    /// Newest first. Page numbers start at 1; `page_size` defaults to 20
    /// and is clamped to `[1, 100]`.
    pub async fn list_by_wallet(
        &self,
        wallet: WalletId,
        page: u32,
        page_size: Option<u32>,
    ) -> WalletResult<Page<Transaction>> {
        let page = page.max(1);
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = u64::from(page - 1) * u64::from(page_size);

        let (items, total) = self
            .store
            .list_transactions(wallet, page_size, offset)
            .await?;

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    pub async fn get(&self, id: TransactionId) -> WalletResult<Transaction> {
        self.store
            .find_transaction(id)
            .await?
            .ok_or(WalletError::TransactionNotFound)
    }
}

fn validate(new: &NewTransaction) -> WalletResult<()> {
    ensure_positive(new.amount)?;
    if new.fee < Decimal::ZERO || new.net_amount != new.amount - new.fee {
        return Err(WalletError::InvalidAmount);
    }
    Ok(())
}
