//! CareWallet Core - money movement for custodial care wallets
//!
//! Contributors deposit into a wallet directly or through the payment
//! gateway. The wallet's owner spends it only at active pharmacies, and
//! only with a fresh one-time code. Every balance change commits together
//! with its ledger row.
//!
//! Start from [`CareWallet`], which wires the components below over one
//! [`carewallet_db::Store`]:
//!
//! - [`WalletDirectory`]: creation, lookup, edits, the zero-balance delete guard
//! - [`PharmacyRegistry`]: onboarding and status transitions
//! - [`DepositOrchestrator`]: direct and gateway-confirmed deposits
//! - [`WithdrawalOrchestrator`]: the OTP-gated withdrawal protocol
//! - [`WithdrawalIntents`]: pharmacy-opened requests awaiting the owner's code
//! - [`ExpirySweeper`]: periodic cleanup of stale codes, tokens and intents

pub mod config;
pub mod deposit;
pub mod gateway;
pub mod intents;
pub mod pharmacies;
pub mod service;
pub mod sweeper;
pub mod wallets;
pub mod withdrawal;

pub use config::{CoreConfig, IntentConfig, PaymentConfig, SweeperConfig};
pub use deposit::DepositOrchestrator;
pub use gateway::{CheckoutRequest, GatewayVerification, PaymentGateway, PaystackClient, PaystackConfig};
pub use intents::WithdrawalIntents;
pub use pharmacies::PharmacyRegistry;
pub use service::CareWallet;
pub use sweeper::{ExpirySweeper, SweepReport};
pub use wallets::{CreateWallet, WalletDirectory};
pub use withdrawal::{WithdrawalOrchestrator, WithdrawalRequest};
