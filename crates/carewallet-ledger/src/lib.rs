//! CareWallet Ledger - the balance-bearing state of a wallet
//!
//! The ledger is:
//! - Exact-decimal (two places, half-up rounding)
//! - Append-only (transactions are never edited or removed individually)
//! - Atomic (a balance change commits together with its transaction row)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. `balance == Σ net(completed deposits) − Σ amount(completed withdrawals)`
//! 3. `fee + net == amount` for every withdrawal

pub mod fee;
pub mod ledger;
pub mod recorder;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use fee::{FeeBreakdown, FeeCalculator, DEFAULT_PLATFORM_FEE};
pub use ledger::WalletLedger;
pub use recorder::{TransactionRecorder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Platform fee taken from withdrawals, as a fraction (0.04 = 4%)
    #[serde(default = "default_fee")]
    pub platform_fee_percentage: Decimal,
}

fn default_fee() -> Decimal {
    DEFAULT_PLATFORM_FEE
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            platform_fee_percentage: DEFAULT_PLATFORM_FEE,
        }
    }
}
