//! Pharmacy-initiated withdrawal intents
//!
//! A pharmacy opens an intent against a wallet's shareable code. Nothing
//! moves until the wallet's owner completes it with their withdrawal code
//! through the withdrawal orchestrator. Open intents expire after the
//! configured TTL.

use std::sync::Arc;
use std::time::Duration;

use carewallet_auth::AccessController;
use carewallet_db::Store;
use carewallet_types::{
    ensure_positive, CallerIdentity, IntentId, NewWithdrawalIntent, PharmacyId, WalletError,
    WalletId, WalletResult, WithdrawalIntent,
};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::pharmacies::PharmacyRegistry;
use crate::wallets::WalletDirectory;

#[derive(Clone)]
pub struct WithdrawalIntents {
    store: Arc<dyn Store>,
    access: AccessController,
    pharmacies: PharmacyRegistry,
    wallets: WalletDirectory,
    ttl: Duration,
}

impl WithdrawalIntents {
    pub fn new(
        store: Arc<dyn Store>,
        pharmacies: PharmacyRegistry,
        wallets: WalletDirectory,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            access: AccessController::new(),
            pharmacies,
            wallets,
            ttl,
        }
    }

    pub async fn open(
        &self,
        pharmacy_id: PharmacyId,
        shareable_code: &str,
        amount: Decimal,
    ) -> WalletResult<WithdrawalIntent> {
        let amount = ensure_positive(amount)?;
        let pharmacy = self.pharmacies.eligible(pharmacy_id).await?;
        let wallet = self.wallets.active_by_code(shareable_code).await?;

        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| WalletError::Config(format!("Intent ttl out of range: {}", e)))?;

        let intent = self
            .store
            .insert_intent(NewWithdrawalIntent {
                pharmacy_id: pharmacy.id,
                wallet_id: wallet.id,
                amount,
                expires_at: Utc::now() + ttl,
            })
            .await?;

        info!(
            intent_id = %intent.id,
            pharmacy_id = %pharmacy.id,
            wallet_id = %wallet.id,
            amount = %amount,
            "Withdrawal intent opened"
        );
        Ok(intent)
    }

    /// Open intents on a wallet the caller may access, newest first
    pub async fn pending(
        &self,
        caller: &CallerIdentity,
        wallet_id: WalletId,
    ) -> WalletResult<Vec<WithdrawalIntent>> {
        let wallet = self
            .store
            .find_wallet(wallet_id)
            .await?
            .ok_or(WalletError::WalletNotFound)?;
        self.access.require(&wallet, caller)?;
        Ok(self.store.list_pending_intents(wallet_id, Utc::now()).await?)
    }

    /// Withdraw a pending intent; only the pharmacy that opened it may
    pub async fn cancel(&self, pharmacy_id: PharmacyId, intent_id: IntentId) -> WalletResult<()> {
        if self.store.cancel_intent(intent_id, pharmacy_id).await? {
            info!(intent_id = %intent_id, pharmacy_id = %pharmacy_id, "Withdrawal intent cancelled");
            return Ok(());
        }

        match self.store.find_intent(intent_id).await? {
            Some(intent) if intent.pharmacy_id == pharmacy_id => {
                Err(WalletError::WithdrawalIntentClosed)
            }
            _ => Err(WalletError::WithdrawalIntentNotFound),
        }
    }
}
