//! Pending withdrawal intents
//!
//! A pharmacy opens an intent for (wallet, amount) at the counter. The wallet
//! owner then completes it with a one-time code; completion goes through the
//! same withdrawal protocol as an owner-initiated withdrawal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{string_enum, IntentId, PharmacyId, TransactionId, WalletId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Pending,
    Completed,
    Cancelled,
    Expired,
}

string_enum!(IntentStatus {
    Pending => "pending",
    Completed => "completed",
    Cancelled => "cancelled",
    Expired => "expired",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalIntent {
    pub id: IntentId,
    pub pharmacy_id: PharmacyId,
    pub wallet_id: WalletId,
    pub amount: Decimal,
    pub status: IntentStatus,
    pub expires_at: DateTime<Utc>,
    pub transaction_id: Option<TransactionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WithdrawalIntent {
    /// Still pending and not past its expiry
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == IntentStatus::Pending && now < self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWithdrawalIntent {
    pub pharmacy_id: PharmacyId,
    pub wallet_id: WalletId,
    pub amount: Decimal,
    pub expires_at: DateTime<Utc>,
}
