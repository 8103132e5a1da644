//! Ledger transactions
//!
//! Every balance change has exactly one transaction record, written in the
//! same unit of work as the balance mutation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{string_enum, PharmacyId, TransactionId, WalletId};

/// Direction of value movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

string_enum!(TransactionKind {
    Deposit => "deposit",
    Withdrawal => "withdrawal",
});

/// Transaction lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

string_enum!(TransactionStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

/// Optional contributor details attached to a deposit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorInfo {
    pub email: Option<String>,
    pub name: Option<String>,
    pub message: Option<String>,
}

/// A persisted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub fee: Decimal,
    /// `amount - fee`
    pub net_amount: Decimal,
    pub status: TransactionStatus,
    pub contributor: ContributorInfo,
    pub pharmacy_id: Option<PharmacyId>,
    pub pharmacy_name: Option<String>,
    /// Gateway reference for card-funded deposits
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Signed effect of this transaction on its wallet balance.
    ///
    /// Deposits credit their net amount, withdrawals debit their gross amount,
    /// and anything not completed has no effect.
    pub fn balance_effect(&self) -> Decimal {
        if self.status != TransactionStatus::Completed {
            return Decimal::ZERO;
        }
        match self.kind {
            TransactionKind::Deposit => self.net_amount,
            TransactionKind::Withdrawal => -self.amount,
        }
    }
}

/// Insert payload for a transaction; id and timestamps are server-assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub wallet_id: WalletId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub status: TransactionStatus,
    pub contributor: ContributorInfo,
    pub pharmacy_id: Option<PharmacyId>,
    pub pharmacy_name: Option<String>,
    pub payment_reference: Option<String>,
}

impl NewTransaction {
    /// A completed deposit: no fee, net equals amount
    pub fn deposit(wallet_id: WalletId, amount: Decimal, contributor: ContributorInfo) -> Self {
        Self {
            wallet_id,
            kind: TransactionKind::Deposit,
            amount,
            fee: Decimal::ZERO,
            net_amount: amount,
            status: TransactionStatus::Completed,
            contributor,
            pharmacy_id: None,
            pharmacy_name: None,
            payment_reference: None,
        }
    }

    /// A completed withdrawal disbursed through a pharmacy
    pub fn withdrawal(
        wallet_id: WalletId,
        amount: Decimal,
        fee: Decimal,
        net_amount: Decimal,
        pharmacy_id: PharmacyId,
        pharmacy_name: impl Into<String>,
    ) -> Self {
        Self {
            wallet_id,
            kind: TransactionKind::Withdrawal,
            amount,
            fee,
            net_amount,
            status: TransactionStatus::Completed,
            contributor: ContributorInfo::default(),
            pharmacy_id: Some(pharmacy_id),
            pharmacy_name: Some(pharmacy_name.into()),
            payment_reference: None,
        }
    }

    pub fn with_payment_reference(mut self, reference: impl Into<String>) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }

    /// Materialize with server-assigned fields
    pub fn into_transaction(self, id: TransactionId, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            wallet_id: self.wallet_id,
            kind: self.kind,
            amount: self.amount,
            fee: self.fee,
            net_amount: self.net_amount,
            status: self.status,
            contributor: self.contributor,
            pharmacy_id: self.pharmacy_id,
            pharmacy_name: self.pharmacy_name,
            payment_reference: self.payment_reference,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One page of a newest-first listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_effect() {
        let wallet = WalletId::new();
        let now = Utc::now();

        let deposit = NewTransaction::deposit(wallet, dec!(50), ContributorInfo::default())
            .into_transaction(TransactionId::new(), now);
        assert_eq!(deposit.balance_effect(), dec!(50));

        let withdrawal = NewTransaction::withdrawal(
            wallet,
            dec!(30.00),
            dec!(1.20),
            dec!(28.80),
            PharmacyId::new(),
            "Main St Pharmacy",
        )
        .into_transaction(TransactionId::new(), now);
        assert_eq!(withdrawal.balance_effect(), dec!(-30.00));

        let mut failed = deposit.clone();
        failed.status = TransactionStatus::Failed;
        assert_eq!(failed.balance_effect(), Decimal::ZERO);
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&TransactionKind::Withdrawal).unwrap();
        assert_eq!(json, "\"withdrawal\"");
        assert_eq!("deposit".parse::<TransactionKind>().unwrap(), TransactionKind::Deposit);
    }
}
