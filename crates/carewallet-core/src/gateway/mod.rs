//! Payment provider seam
//!
//! Amounts cross this boundary as integer minor units (cents).

mod paystack;

use async_trait::async_trait;
use carewallet_types::{PaymentSession, WalletId, WalletResult};
use serde::{Deserialize, Serialize};

pub use paystack::{PaystackClient, PaystackConfig};

/// Checkout request sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    pub amount_minor: i64,
    pub currency: String,
    pub reference: String,
    pub wallet_id: WalletId,
    pub message: Option<String>,
}

/// The provider's view of a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayVerification {
    pub successful: bool,
    pub amount_minor: i64,
    /// The provider's own id for the charge
    pub gateway_reference: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout for `request.reference`
    async fn initialize(&self, request: &CheckoutRequest) -> WalletResult<PaymentSession>;

    /// Ask the provider whether the payment went through
    async fn verify(&self, reference: &str) -> WalletResult<GatewayVerification>;
}
