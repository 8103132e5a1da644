//! Error types for CareWallet
//!
//! Domain errors are business-rule violations: they are returned to the
//! caller for translation and never retried. `Storage` and `Gateway` wrap
//! collaborator faults; their detail is for logs, not for clients.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for CareWallet operations
pub type WalletResult<T> = std::result::Result<T, WalletError>;

/// CareWallet error taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    // ========================================================================
    // Wallet Errors
    // ========================================================================
    #[error("Wallet not found")]
    WalletNotFound,

    #[error("You do not have access to this wallet")]
    WalletAccessDenied,

    #[error("Cannot delete wallet with remaining balance")]
    WalletHasBalance,

    // ========================================================================
    // Money Errors
    // ========================================================================
    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Insufficient wallet balance")]
    InsufficientBalance,

    #[error("Transaction not found")]
    TransactionNotFound,

    // ========================================================================
    // Pharmacy Errors
    // ========================================================================
    #[error("Pharmacy not found")]
    PharmacyNotFound,

    #[error("Pharmacy is not active")]
    PharmacyInactive,

    #[error("Withdrawal intent not found")]
    WithdrawalIntentNotFound,

    #[error("Withdrawal intent is no longer pending")]
    WithdrawalIntentClosed,

    // ========================================================================
    // One-Time Code Errors
    // ========================================================================
    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("OTP has already been used")]
    OtpAlreadyUsed,

    // ========================================================================
    // Payment Errors
    // ========================================================================
    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Payment already verified")]
    PaymentAlreadyVerified,

    #[error("Payment failed")]
    PaymentFailed,

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// Payment gateway unreachable or returned garbage
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Persistence fault (should not be exposed to clients)
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WalletError {
    /// HTTP status code the presentation layer should use
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount | Self::InsufficientBalance | Self::InvalidOtp | Self::OtpExpired
            | Self::OtpAlreadyUsed | Self::PaymentFailed => 400,

            Self::WalletAccessDenied => 403,

            Self::WalletNotFound
            | Self::TransactionNotFound
            | Self::PharmacyNotFound
            | Self::WithdrawalIntentNotFound
            | Self::PaymentNotFound => 404,

            Self::WalletHasBalance
            | Self::PharmacyInactive
            | Self::WithdrawalIntentClosed
            | Self::PaymentAlreadyVerified => 409,

            Self::Gateway(_) => 502,

            Self::Storage(_) | Self::Config(_) => 500,
        }
    }

    /// Machine-readable code (safe to expose)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::WalletNotFound => "WALLET_NOT_FOUND",
            Self::WalletAccessDenied => "WALLET_ACCESS_DENIED",
            Self::WalletHasBalance => "WALLET_HAS_BALANCE",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            Self::PharmacyNotFound => "PHARMACY_NOT_FOUND",
            Self::PharmacyInactive => "PHARMACY_INACTIVE",
            Self::WithdrawalIntentNotFound => "WITHDRAWAL_INTENT_NOT_FOUND",
            Self::WithdrawalIntentClosed => "WITHDRAWAL_INTENT_CLOSED",
            Self::InvalidOtp => "INVALID_OTP",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpAlreadyUsed => "OTP_ALREADY_USED",
            Self::PaymentNotFound => "PAYMENT_NOT_FOUND",
            Self::PaymentAlreadyVerified => "PAYMENT_ALREADY_VERIFIED",
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Storage(_) | Self::Config(_) => "INTERNAL_ERROR",
        }
    }

    /// Business-rule violation, as opposed to a collaborator fault
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Gateway(_) | Self::Storage(_) | Self::Config(_))
    }

    /// Collaborator faults may be retried at the transport boundary
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Gateway(_) | Self::Storage(_))
    }

    /// Message for the client (doesn't leak internal details)
    pub fn client_message(&self) -> String {
        match self {
            Self::Storage(_) | Self::Config(_) => "An internal error occurred".to_string(),
            Self::Gateway(_) => "Payment provider unavailable".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Error response for API clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub code: String,
    /// Error message (human-readable)
    pub message: String,
}

impl From<&WalletError> for ErrorResponse {
    fn from(error: &WalletError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.client_message(),
        }
    }
}
