//! Database error types

use carewallet_types::WalletError;
use thiserror::Error;

/// Database operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The conditional balance update matched no row because the result
    /// would have been negative
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

impl From<WalletError> for DbError {
    fn from(e: WalletError) -> Self {
        DbError::Corrupt(e.to_string())
    }
}

/// Persistence faults are opaque to callers; only the ledger's
/// insufficient-balance signal is a domain outcome.
impl From<DbError> for WalletError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::InsufficientBalance(_) => WalletError::InsufficientBalance,
            other => WalletError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_maps_to_domain_error() {
        let err: WalletError = DbError::InsufficientBalance("wallet".to_string()).into();
        assert_eq!(err, WalletError::InsufficientBalance);
    }

    #[test]
    fn test_other_errors_are_opaque_storage() {
        let err: WalletError = DbError::Connection("refused".to_string()).into();
        assert!(matches!(err, WalletError::Storage(_)));
        assert!(!err.is_domain());
    }
}
