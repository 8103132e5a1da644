//! CareWallet Types - Canonical domain types for custodial care wallets
//!
//! This crate contains the foundational types shared by every CareWallet
//! crate, with zero dependencies on the others:
//!
//! - Identity types (WalletId, UserId, PharmacyId, ...)
//! - Exact-decimal money helpers
//! - Wallets, transactions, payments and withdrawal intents
//! - One-time codes and pharmacies
//! - The domain error taxonomy
//!
//! # Ledger Invariants
//!
//! 1. A wallet balance is never negative
//! 2. `balance == Σ net(completed deposits) − Σ amount(completed withdrawals)`
//! 3. Money is `rust_decimal::Decimal`; floats only exist at the transport edge
//! 4. A transaction record and its balance mutation commit together or not at all

/// Generates `as_str`, `Display` and `FromStr` for a snake_case status enum
/// so storage can persist it as text.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Storage representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::WalletError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::error::WalletError::Storage(format!(
                        "unknown {} value: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

pub(crate) use string_enum;

pub mod identity;
pub mod money;
pub mod wallet;
pub mod transaction;
pub mod pharmacy;
pub mod payment;
pub mod intent;
pub mod otp;
pub mod error;

pub use identity::*;
pub use money::*;
pub use wallet::*;
pub use transaction::*;
pub use pharmacy::*;
pub use payment::*;
pub use intent::*;
pub use otp::*;
pub use error::*;
