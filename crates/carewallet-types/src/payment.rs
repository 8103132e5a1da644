//! Gateway-funded payments
//!
//! A payment row is created `pending` before the contributor is redirected to
//! the gateway, and moves exactly once to `completed` or `failed`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{string_enum, PaymentId, WalletId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

string_enum!(PaymentStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub wallet_id: WalletId,
    /// Internal reference handed to the gateway
    pub reference: String,
    pub amount: Decimal,
    pub email: String,
    pub message: Option<String>,
    pub status: PaymentStatus,
    /// Gateway-side transaction id, set on completion
    pub gateway_reference: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub wallet_id: WalletId,
    pub reference: String,
    pub amount: Decimal,
    pub email: String,
    pub message: Option<String>,
}

/// What the contributor needs to continue at the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub reference: String,
    pub access_code: String,
    pub authorization_url: String,
}
