//! Contribution flows
//!
//! Two ways money comes in: a direct deposit, and a deposit confirmed by
//! the payment gateway. Either way the ledger row and the credit commit
//! together, and only active wallets accept money.

use std::sync::Arc;

use carewallet_db::{LedgerTx, Store};
use carewallet_ledger::{TransactionRecorder, WalletLedger};
use carewallet_types::{
    ensure_positive, from_minor_units, round_money, to_minor_units, ContributorInfo, NewPayment,
    NewTransaction, Payment, PaymentSession, PaymentStatus, Transaction, Wallet, WalletError,
    WalletId, WalletResult,
};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::gateway::{CheckoutRequest, PaymentGateway};

#[derive(Clone)]
pub struct DepositOrchestrator {
    store: Arc<dyn Store>,
    ledger: WalletLedger,
    recorder: TransactionRecorder,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl DepositOrchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        ledger: WalletLedger,
        recorder: TransactionRecorder,
        gateway: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            ledger,
            recorder,
            gateway,
            currency: currency.into(),
        }
    }

    /// Direct public deposit; no authentication
    pub async fn deposit(
        &self,
        wallet_id: WalletId,
        amount: Decimal,
        contributor: ContributorInfo,
    ) -> WalletResult<Transaction> {
        let amount = ensure_positive(amount)?;
        self.active_wallet(wallet_id).await?;

        let result = self
            .record_and_credit(NewTransaction::deposit(wallet_id, amount, contributor), None)
            .await;
        log_deposit(&result, "deposit", wallet_id, amount);
        result
    }

    /// Persist a pending payment, then open a checkout with the gateway.
    /// Amounts finer than a cent are rejected so the stored amount is the
    /// charged amount.
    pub async fn initiate_payment(
        &self,
        wallet_id: WalletId,
        email: &str,
        amount: Decimal,
        message: Option<String>,
    ) -> WalletResult<PaymentSession> {
        let amount = ensure_positive(amount)?;
        let amount_minor = to_minor_units(amount)?;
        if round_money(amount) != amount || amount_minor <= 0 {
            return Err(WalletError::InvalidAmount);
        }
        self.active_wallet(wallet_id).await?;

        let payment = self
            .store
            .insert_payment(NewPayment {
                wallet_id,
                reference: generate_reference(),
                amount,
                email: email.trim().to_string(),
                message: message.clone(),
            })
            .await?;

        let request = CheckoutRequest {
            email: payment.email.clone(),
            amount_minor,
            currency: self.currency.clone(),
            reference: payment.reference.clone(),
            wallet_id,
            message,
        };

        match self.gateway.initialize(&request).await {
            Ok(session) => {
                info!(wallet_id = %wallet_id, reference = %payment.reference, amount = %amount, "Payment initiated");
                Ok(session)
            }
            Err(e) => {
                error!(
                    op = "initiate_payment",
                    wallet_id = %wallet_id,
                    reference = %payment.reference,
                    amount = %amount,
                    error = %e,
                    "Gateway checkout failed"
                );
                Err(e)
            }
        }
    }

    /// Settle a payment the gateway reports as successful. Each reference
    /// credits the wallet at most once.
    pub async fn confirm_payment(&self, reference: &str) -> WalletResult<Transaction> {
        let payment = self
            .store
            .find_payment_by_reference(reference)
            .await?
            .ok_or(WalletError::PaymentNotFound)?;

        match payment.status {
            PaymentStatus::Completed => return Err(WalletError::PaymentAlreadyVerified),
            PaymentStatus::Failed => return Err(WalletError::PaymentFailed),
            PaymentStatus::Pending => {}
        }

        let verification = self.gateway.verify(reference).await.map_err(|e| {
            error!(op = "confirm_payment", reference = %reference, error = %e, "Gateway verification failed");
            e
        })?;

        if !verification.successful || verification.amount_minor <= 0 {
            if self.store.fail_payment(reference).await? {
                warn!(
                    reference = %reference,
                    wallet_id = %payment.wallet_id,
                    reported_minor = verification.amount_minor,
                    "Payment marked failed"
                );
            }
            return Err(WalletError::PaymentFailed);
        }

        let amount = from_minor_units(verification.amount_minor);
        if amount != payment.amount {
            warn!(
                reference = %reference,
                expected = %payment.amount,
                reported = %amount,
                "Gateway amount differs from the initiated amount"
            );
        }

        let deposit = NewTransaction::deposit(payment.wallet_id, amount, contributor_of(&payment))
            .with_payment_reference(reference);
        let settlement = Settlement {
            reference,
            gateway_reference: verification.gateway_reference.as_deref(),
        };

        let result = self.record_and_credit(deposit, Some(settlement)).await;
        log_deposit(&result, "confirm_payment", payment.wallet_id, amount);
        result
    }

    async fn active_wallet(&self, id: WalletId) -> WalletResult<Wallet> {
        match self.store.find_wallet(id).await? {
            Some(wallet) if wallet.is_active() => Ok(wallet),
            _ => Err(WalletError::WalletNotFound),
        }
    }

    /// One unit of work: close the payment if any, record, credit
    async fn record_and_credit(
        &self,
        deposit: NewTransaction,
        settlement: Option<Settlement<'_>>,
    ) -> WalletResult<Transaction> {
        let mut tx = self.store.begin().await?;
        if let Some(settlement) = settlement {
            settle(tx.as_mut(), settlement).await?;
        }
        let wallet_id = deposit.wallet_id;
        let amount = deposit.net_amount;
        let recorded = self.recorder.record_in(tx.as_mut(), deposit).await?;
        self.ledger.credit_in(tx.as_mut(), wallet_id, amount).await?;
        tx.commit().await?;
        Ok(recorded)
    }
}

struct Settlement<'a> {
    reference: &'a str,
    gateway_reference: Option<&'a str>,
}

async fn settle(tx: &mut dyn LedgerTx, settlement: Settlement<'_>) -> WalletResult<()> {
    let completed = tx
        .complete_payment(settlement.reference, settlement.gateway_reference, Utc::now())
        .await?;
    match completed {
        Some(_) => Ok(()),
        None => Err(WalletError::PaymentAlreadyVerified),
    }
}

fn contributor_of(payment: &Payment) -> ContributorInfo {
    ContributorInfo {
        email: Some(payment.email.clone()),
        name: None,
        message: payment.message.clone(),
    }
}

/// `CW_<8 hex>_<unix seconds>`
fn generate_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("CW_{}_{}", &id[..8], Utc::now().timestamp())
}

fn log_deposit(result: &WalletResult<Transaction>, op: &str, wallet_id: WalletId, amount: Decimal) {
    match result {
        Ok(tx) => info!(
            wallet_id = %wallet_id,
            transaction_id = %tx.id,
            amount = %amount,
            "Deposit completed"
        ),
        Err(e) if !e.is_domain() => error!(
            op = op,
            wallet_id = %wallet_id,
            amount = %amount,
            error = %e,
            "Deposit failed"
        ),
        Err(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_format() {
        let reference = generate_reference();
        let parts: Vec<&str> = reference.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CW");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_hexdigit()));
        assert!(parts[2].parse::<i64>().is_ok());
    }
}
