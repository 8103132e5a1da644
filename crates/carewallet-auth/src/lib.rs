//! CareWallet Authorization Layer
//!
//! Everything that decides whether a money movement is allowed to proceed,
//! short of the ledger itself:
//!
//! - **One-time codes**: 6-digit, single-use, short-lived codes per
//!   (email, purpose), stored only as SHA-256 digests
//! - **Wallet access**: creator or beneficiary only
//! - **Token revocation**: blacklisted access-token ids
//! - **Code delivery**: the [`CodeNotifier`] seam
//!
//! Caller identity is established upstream; this crate trusts the
//! [`carewallet_types::CallerIdentity`] it is handed.

pub mod config;
pub mod error;
pub mod otp;
pub mod access;
pub mod notify;
pub mod revocation;

pub use config::{AuthConfig, OtpConfig};
pub use error::{AuthError, AuthResult};
pub use otp::{OneTimeCodeAuthorizer, VerifyOutcome};
pub use access::AccessController;
pub use notify::{CodeNotifier, LogNotifier};
pub use revocation::TokenRevocation;
