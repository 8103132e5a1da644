//! Wallet directory
//!
//! Creation, lookup and descriptive edits. Balances are never written here;
//! the only balance-related rule is the zero-balance delete guard, which
//! the ledger enforces.

use std::sync::Arc;

use carewallet_auth::AccessController;
use carewallet_db::{DbError, Store};
use carewallet_ledger::WalletLedger;
use carewallet_types::{
    CallerIdentity, NewWallet, PublicWallet, UserId, Wallet, WalletDetails, WalletError, WalletId,
    WalletResult, SHAREABLE_CODE_ALPHABET, SHAREABLE_CODE_LENGTH,
};
use rand::rngs::OsRng;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const MAX_CODE_ATTEMPTS: usize = 10;

/// Fields a creator supplies for a new wallet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateWallet {
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub funding_goal: Decimal,
    pub beneficiary_id: Option<UserId>,
}

#[derive(Clone)]
pub struct WalletDirectory {
    store: Arc<dyn Store>,
    access: AccessController,
    ledger: WalletLedger,
}

impl WalletDirectory {
    pub fn new(store: Arc<dyn Store>, ledger: WalletLedger) -> Self {
        Self {
            store,
            access: AccessController::new(),
            ledger,
        }
    }

    /// Create an active, empty wallet with a fresh shareable code
    pub async fn create(&self, creator: &CallerIdentity, input: CreateWallet) -> WalletResult<Wallet> {
        if input.funding_goal < Decimal::ZERO {
            return Err(WalletError::InvalidAmount);
        }

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_shareable_code();
            if self.store.shareable_code_exists(&code).await? {
                continue;
            }

            let new = NewWallet {
                creator_id: creator.id,
                beneficiary_id: input.beneficiary_id,
                name: input.name.trim().to_string(),
                description: input.description.clone(),
                photo_url: input.photo_url.clone(),
                funding_goal: input.funding_goal,
                shareable_code: code,
            };

            match self.store.insert_wallet(new).await {
                Ok(wallet) => {
                    info!(wallet_id = %wallet.id, creator_id = %creator.id, "Wallet created");
                    return Ok(wallet);
                }
                Err(DbError::Duplicate(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        warn!(creator_id = %creator.id, "Could not find a free shareable code");
        Err(WalletError::Storage("Shareable code space exhausted".to_string()))
    }

    /// A wallet the caller may see
    pub async fn get(&self, caller: &CallerIdentity, id: WalletId) -> WalletResult<Wallet> {
        let wallet = self
            .store
            .find_wallet(id)
            .await?
            .ok_or(WalletError::WalletNotFound)?;
        self.access.require(&wallet, caller)?;
        Ok(wallet)
    }

    /// Contributor-facing view; only active wallets are visible
    pub async fn public(&self, shareable_code: &str) -> WalletResult<PublicWallet> {
        let code = shareable_code.trim().to_ascii_uppercase();
        self.store
            .find_wallet_by_code(&code)
            .await?
            .map(|w| w.public_view())
            .ok_or(WalletError::WalletNotFound)
    }

    /// Active wallet behind a shareable code, for internal callers
    pub async fn active_by_code(&self, shareable_code: &str) -> WalletResult<Wallet> {
        let code = shareable_code.trim().to_ascii_uppercase();
        self.store
            .find_wallet_by_code(&code)
            .await?
            .ok_or(WalletError::WalletNotFound)
    }

    /// Wallets the caller created or benefits from, newest first
    pub async fn list_for(&self, caller: &CallerIdentity) -> WalletResult<Vec<Wallet>> {
        Ok(self.store.list_wallets_for_user(caller.id).await?)
    }

    pub async fn update(
        &self,
        caller: &CallerIdentity,
        id: WalletId,
        details: WalletDetails,
    ) -> WalletResult<Wallet> {
        if matches!(details.funding_goal, Some(goal) if goal < Decimal::ZERO) {
            return Err(WalletError::InvalidAmount);
        }
        let wallet = self.get(caller, id).await?;
        if details.is_empty() {
            return Ok(wallet);
        }

        let updated = self
            .store
            .update_wallet_details(id, &details)
            .await?
            .ok_or(WalletError::WalletNotFound)?;
        info!(wallet_id = %id, "Wallet details updated");
        Ok(updated)
    }

    /// Delete a wallet the caller can access, only when its balance is zero
    pub async fn delete(&self, caller: &CallerIdentity, id: WalletId) -> WalletResult<()> {
        self.get(caller, id).await?;
        self.ledger.delete_wallet(id).await
    }
}

fn generate_shareable_code() -> String {
    let mut rng = OsRng;
    (0..SHAREABLE_CODE_LENGTH)
        .map(|_| char::from(SHAREABLE_CODE_ALPHABET[rng.gen_range(0..SHAREABLE_CODE_ALPHABET.len())]))
        .collect()
}
