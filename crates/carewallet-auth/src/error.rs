//! Authorization error types
//!
//! Errors are designed to be:
//! - Informative for logging/debugging
//! - Safe for external exposure (no code values, no storage detail)

use carewallet_db::DbError;
use carewallet_types::WalletError;
use thiserror::Error;

/// Result type alias for authorization operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authorization error types
#[derive(Debug, Error)]
pub enum AuthError {
    // =========================================================================
    // One-Time Code Errors
    // =========================================================================
    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("OTP has already been used")]
    OtpAlreadyUsed,

    // =========================================================================
    // Access Errors
    // =========================================================================
    #[error("You do not have access to this wallet")]
    AccessDenied,

    #[error("Token has been revoked")]
    TokenRevoked,

    // =========================================================================
    // Delivery Errors
    // =========================================================================
    #[error("Code delivery failed: {0}")]
    Delivery(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidOtp | Self::OtpExpired | Self::OtpAlreadyUsed => 400,
            Self::TokenRevoked => 401,
            Self::AccessDenied => 403,
            Self::Delivery(_) => 502,
            Self::Storage(_) | Self::Config(_) => 500,
        }
    }

    /// Machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidOtp => "INVALID_OTP",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpAlreadyUsed => "OTP_ALREADY_USED",
            Self::AccessDenied => "WALLET_ACCESS_DENIED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::Delivery(_) => "DELIVERY_ERROR",
            Self::Storage(_) | Self::Config(_) => "INTERNAL_ERROR",
        }
    }

    /// Message for the client (doesn't leak internal details)
    pub fn client_message(&self) -> String {
        match self {
            Self::Storage(_) | Self::Config(_) => "An internal error occurred".to_string(),
            Self::Delivery(_) => "Could not deliver the code".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<AuthError> for WalletError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidOtp => WalletError::InvalidOtp,
            AuthError::OtpExpired => WalletError::OtpExpired,
            AuthError::OtpAlreadyUsed => WalletError::OtpAlreadyUsed,
            AuthError::AccessDenied | AuthError::TokenRevoked => WalletError::WalletAccessDenied,
            AuthError::Delivery(msg) => WalletError::Gateway(msg),
            AuthError::Storage(db) => db.into(),
            AuthError::Config(msg) => WalletError::Config(msg),
        }
    }
}
