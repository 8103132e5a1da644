//! Withdrawal protocol
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. wallet exists
//! 2. caller may access it
//! 3. amount is positive
//! 4. pharmacy exists and is active
//! 5. the caller's withdrawal code verifies (and is consumed)
//! 6. fee split
//! 7. debit, then 8. record, in one unit of work
//!
//! A code consumed in step 5 stays consumed if step 7 later finds the
//! balance too low.

use std::sync::Arc;

use carewallet_auth::{AccessController, OneTimeCodeAuthorizer};
use carewallet_db::Store;
use carewallet_ledger::{FeeCalculator, TransactionRecorder, WalletLedger};
use carewallet_types::{
    ensure_positive, CallerIdentity, IntentId, NewTransaction, OtpPurpose, Pharmacy, PharmacyId,
    Transaction, WalletError, WalletId, WalletResult,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::pharmacies::PharmacyRegistry;

/// An owner-initiated withdrawal at a pharmacy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub wallet_id: WalletId,
    pub amount: Decimal,
    pub pharmacy_id: PharmacyId,
    pub otp_code: String,
}

#[derive(Clone)]
pub struct WithdrawalOrchestrator {
    store: Arc<dyn Store>,
    access: AccessController,
    otp: OneTimeCodeAuthorizer,
    pharmacies: PharmacyRegistry,
    fees: FeeCalculator,
    ledger: WalletLedger,
    recorder: TransactionRecorder,
}

impl WithdrawalOrchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        otp: OneTimeCodeAuthorizer,
        pharmacies: PharmacyRegistry,
        fees: FeeCalculator,
        ledger: WalletLedger,
        recorder: TransactionRecorder,
    ) -> Self {
        Self {
            store,
            access: AccessController::new(),
            otp,
            pharmacies,
            fees,
            ledger,
            recorder,
        }
    }

    pub async fn withdraw(
        &self,
        caller: &CallerIdentity,
        request: WithdrawalRequest,
    ) -> WalletResult<Transaction> {
        self.execute(
            caller,
            request.wallet_id,
            request.amount,
            request.pharmacy_id,
            &request.otp_code,
            None,
        )
        .await
    }

    /// Complete a pharmacy's pending intent with the owner's code
    pub async fn complete_intent(
        &self,
        caller: &CallerIdentity,
        intent_id: IntentId,
        otp_code: &str,
    ) -> WalletResult<Transaction> {
        let intent = self
            .store
            .find_intent(intent_id)
            .await?
            .ok_or(WalletError::WithdrawalIntentNotFound)?;
        if !intent.is_open(Utc::now()) {
            return Err(WalletError::WithdrawalIntentClosed);
        }

        self.execute(
            caller,
            intent.wallet_id,
            intent.amount,
            intent.pharmacy_id,
            otp_code,
            Some(intent_id),
        )
        .await
    }

    async fn execute(
        &self,
        caller: &CallerIdentity,
        wallet_id: WalletId,
        amount: Decimal,
        pharmacy_id: PharmacyId,
        otp_code: &str,
        intent: Option<IntentId>,
    ) -> WalletResult<Transaction> {
        let wallet = self
            .store
            .find_wallet(wallet_id)
            .await?
            .ok_or(WalletError::WalletNotFound)?;
        self.access.require(&wallet, caller)?;
        let amount = ensure_positive(amount)?;
        let pharmacy = self.pharmacies.eligible(pharmacy_id).await?;

        self.otp
            .verify_outcome(&caller.email, OtpPurpose::Withdrawal, otp_code)
            .await?
            .into_result()?;

        let split = self.fees.compute(amount);

        let result = self
            .commit(wallet_id, amount, split.fee, split.net, &pharmacy, intent)
            .await;

        match &result {
            Ok(tx) => info!(
                wallet_id = %wallet_id,
                transaction_id = %tx.id,
                pharmacy_id = %pharmacy.id,
                amount = %amount,
                fee = %split.fee,
                net = %split.net,
                "Withdrawal completed"
            ),
            Err(e) if !e.is_domain() => error!(
                op = "withdraw",
                wallet_id = %wallet_id,
                amount = %amount,
                error = %e,
                "Withdrawal failed"
            ),
            Err(_) => {}
        }
        result
    }

    /// Steps 7 and 8, plus closing the intent when there is one
    async fn commit(
        &self,
        wallet_id: WalletId,
        amount: Decimal,
        fee: Decimal,
        net: Decimal,
        pharmacy: &Pharmacy,
        intent: Option<IntentId>,
    ) -> WalletResult<Transaction> {
        let mut tx = self.store.begin().await?;
        self.ledger.debit_in(tx.as_mut(), wallet_id, amount).await?;
        let recorded = self
            .recorder
            .record_in(
                tx.as_mut(),
                NewTransaction::withdrawal(wallet_id, amount, fee, net, pharmacy.id, pharmacy.name.clone()),
            )
            .await?;
        if let Some(intent_id) = intent {
            if !tx.complete_intent(intent_id, recorded.id, Utc::now()).await? {
                return Err(WalletError::WithdrawalIntentClosed);
            }
        }
        tx.commit().await?;
        Ok(recorded)
    }
}
