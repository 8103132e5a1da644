//! Repository implementations

mod wallet;
mod transaction;
mod otp;
mod pharmacy;
mod payment;
mod intent;
mod blacklist;

pub use wallet::WalletRepo;
pub use transaction::TransactionRepo;
pub use otp::OneTimeCodeRepo;
pub use pharmacy::PharmacyRepo;
pub use payment::PaymentRepo;
pub use intent::IntentRepo;
pub use blacklist::TokenBlacklistRepo;

use crate::DbError;

/// Turn a unique-constraint violation into `Duplicate`, pass the rest through
pub(crate) fn map_unique(err: sqlx::Error, what: &str) -> DbError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DbError::Duplicate(format!("{} already exists", what))
        }
        _ => DbError::Query(err),
    }
}
