//! The `CareWallet` facade
//!
//! One entry point over the directory, registry, orchestrators and sweep.
//! Callers arrive already authenticated as a [`CallerIdentity`]; public
//! operations (deposits, public wallet lookup, pharmacy-side intents) take
//! no identity.

use std::sync::Arc;

use carewallet_auth::{CodeNotifier, OneTimeCodeAuthorizer, TokenRevocation};
use carewallet_db::Store;
use carewallet_ledger::{FeeCalculator, TransactionRecorder, WalletLedger};
use carewallet_types::{
    CallerIdentity, ContributorInfo, IntentId, NewPharmacy, OtpPurpose, Page, PaymentSession,
    Pharmacy, PharmacyId, PharmacyStatus, PublicWallet, Transaction, TransactionId, UserId,
    Wallet, WalletDetails, WalletId, WalletResult, WithdrawalIntent,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::CoreConfig;
use crate::deposit::DepositOrchestrator;
use crate::gateway::PaymentGateway;
use crate::intents::WithdrawalIntents;
use crate::pharmacies::PharmacyRegistry;
use crate::sweeper::{ExpirySweeper, SweepReport};
use crate::wallets::{CreateWallet, WalletDirectory};
use crate::withdrawal::{WithdrawalOrchestrator, WithdrawalRequest};

#[derive(Clone)]
pub struct CareWallet {
    wallets: WalletDirectory,
    pharmacies: PharmacyRegistry,
    recorder: TransactionRecorder,
    otp: OneTimeCodeAuthorizer,
    revocation: TokenRevocation,
    deposits: DepositOrchestrator,
    withdrawals: WithdrawalOrchestrator,
    intents: WithdrawalIntents,
    sweeper: ExpirySweeper,
}

impl CareWallet {
    /// Wire every component over one store. Fails only on an invalid fee.
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn CodeNotifier>,
        config: CoreConfig,
    ) -> WalletResult<Self> {
        let fees = FeeCalculator::new(config.ledger.platform_fee_percentage)?;
        let ledger = WalletLedger::new(store.clone());
        let recorder = TransactionRecorder::new(store.clone());
        let otp = OneTimeCodeAuthorizer::new(store.clone(), notifier, config.otp);
        let pharmacies = PharmacyRegistry::new(store.clone());
        let wallets = WalletDirectory::new(store.clone(), ledger.clone());

        let deposits = DepositOrchestrator::new(
            store.clone(),
            ledger.clone(),
            recorder.clone(),
            gateway,
            config.payment.currency,
        );
        let withdrawals = WithdrawalOrchestrator::new(
            store.clone(),
            otp.clone(),
            pharmacies.clone(),
            fees,
            ledger,
            recorder.clone(),
        );
        let intents = WithdrawalIntents::new(
            store.clone(),
            pharmacies.clone(),
            wallets.clone(),
            config.intents.ttl,
        );

        Ok(Self {
            wallets,
            pharmacies,
            recorder,
            otp,
            revocation: TokenRevocation::new(store.clone()),
            deposits,
            withdrawals,
            intents,
            sweeper: ExpirySweeper::new(store),
        })
    }

    // ------------------------------------------------------------------
    // Money movement
    // ------------------------------------------------------------------

    pub async fn deposit(
        &self,
        wallet_id: WalletId,
        amount: Decimal,
        contributor: Option<ContributorInfo>,
    ) -> WalletResult<Transaction> {
        self.deposits
            .deposit(wallet_id, amount, contributor.unwrap_or_default())
            .await
    }

    pub async fn initiate_payment(
        &self,
        wallet_id: WalletId,
        email: &str,
        amount: Decimal,
        message: Option<String>,
    ) -> WalletResult<PaymentSession> {
        self.deposits
            .initiate_payment(wallet_id, email, amount, message)
            .await
    }

    pub async fn confirm_payment(&self, reference: &str) -> WalletResult<Transaction> {
        self.deposits.confirm_payment(reference).await
    }

    pub async fn withdraw(
        &self,
        caller: &CallerIdentity,
        wallet_id: WalletId,
        amount: Decimal,
        pharmacy_id: PharmacyId,
        otp_code: &str,
    ) -> WalletResult<Transaction> {
        self.withdrawals
            .withdraw(
                caller,
                WithdrawalRequest {
                    wallet_id,
                    amount,
                    pharmacy_id,
                    otp_code: otp_code.to_string(),
                },
            )
            .await
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    pub async fn list_wallet_transactions(
        &self,
        caller: &CallerIdentity,
        wallet_id: WalletId,
        page: u32,
        page_size: Option<u32>,
    ) -> WalletResult<Page<Transaction>> {
        self.wallets.get(caller, wallet_id).await?;
        self.recorder.list_by_wallet(wallet_id, page, page_size).await
    }

    /// A single transaction, visible to whoever may access its wallet
    pub async fn transaction(
        &self,
        caller: &CallerIdentity,
        id: TransactionId,
    ) -> WalletResult<Transaction> {
        let transaction = self.recorder.get(id).await?;
        self.wallets.get(caller, transaction.wallet_id).await?;
        Ok(transaction)
    }

    // ------------------------------------------------------------------
    // One-time codes and tokens
    // ------------------------------------------------------------------

    pub async fn issue_one_time_code(&self, email: &str, purpose: OtpPurpose) -> WalletResult<()> {
        Ok(self.otp.issue(email, purpose).await?)
    }

    pub async fn verify_one_time_code(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> WalletResult<bool> {
        Ok(self.otp.verify(email, purpose, code).await?)
    }

    /// Refuse a signed-out token until it would have expired anyway
    pub async fn revoke_token(
        &self,
        jti: &str,
        user: UserId,
        expires_at: DateTime<Utc>,
    ) -> WalletResult<()> {
        Ok(self.revocation.revoke(jti, user, expires_at).await?)
    }

    pub async fn ensure_token_active(&self, jti: &str) -> WalletResult<()> {
        Ok(self.revocation.ensure_active(jti).await?)
    }

    // ------------------------------------------------------------------
    // Wallets
    // ------------------------------------------------------------------

    pub async fn create_wallet(
        &self,
        creator: &CallerIdentity,
        input: CreateWallet,
    ) -> WalletResult<Wallet> {
        self.wallets.create(creator, input).await
    }

    pub async fn wallet(&self, caller: &CallerIdentity, id: WalletId) -> WalletResult<Wallet> {
        self.wallets.get(caller, id).await
    }

    pub async fn public_wallet(&self, shareable_code: &str) -> WalletResult<PublicWallet> {
        self.wallets.public(shareable_code).await
    }

    pub async fn wallets_for(&self, caller: &CallerIdentity) -> WalletResult<Vec<Wallet>> {
        self.wallets.list_for(caller).await
    }

    pub async fn update_wallet(
        &self,
        caller: &CallerIdentity,
        id: WalletId,
        details: WalletDetails,
    ) -> WalletResult<Wallet> {
        self.wallets.update(caller, id, details).await
    }

    pub async fn delete_wallet(&self, caller: &CallerIdentity, id: WalletId) -> WalletResult<()> {
        self.wallets.delete(caller, id).await
    }

    // ------------------------------------------------------------------
    // Pharmacies and intents
    // ------------------------------------------------------------------

    pub async fn register_pharmacy(&self, pharmacy: NewPharmacy) -> WalletResult<Pharmacy> {
        self.pharmacies.register(pharmacy).await
    }

    pub async fn set_pharmacy_status(
        &self,
        id: PharmacyId,
        status: PharmacyStatus,
    ) -> WalletResult<Pharmacy> {
        self.pharmacies.set_status(id, status).await
    }

    pub async fn open_withdrawal_intent(
        &self,
        pharmacy_id: PharmacyId,
        shareable_code: &str,
        amount: Decimal,
    ) -> WalletResult<WithdrawalIntent> {
        self.intents.open(pharmacy_id, shareable_code, amount).await
    }

    pub async fn pending_intents(
        &self,
        caller: &CallerIdentity,
        wallet_id: WalletId,
    ) -> WalletResult<Vec<WithdrawalIntent>> {
        self.intents.pending(caller, wallet_id).await
    }

    pub async fn cancel_withdrawal_intent(
        &self,
        pharmacy_id: PharmacyId,
        intent_id: IntentId,
    ) -> WalletResult<()> {
        self.intents.cancel(pharmacy_id, intent_id).await
    }

    pub async fn complete_withdrawal_intent(
        &self,
        caller: &CallerIdentity,
        intent_id: IntentId,
        otp_code: &str,
    ) -> WalletResult<Transaction> {
        self.withdrawals
            .complete_intent(caller, intent_id, otp_code)
            .await
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    pub async fn sweep_expired(&self) -> WalletResult<SweepReport> {
        self.sweeper.sweep_once().await
    }

    /// The sweeper, for callers that run it on a schedule
    pub fn sweeper(&self) -> &ExpirySweeper {
        &self.sweeper
    }
}
