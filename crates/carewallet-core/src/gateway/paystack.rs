//! Paystack REST client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use carewallet_types::{PaymentSession, WalletError, WalletResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CheckoutRequest, GatewayVerification, PaymentGateway};

/// Paystack client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaystackConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Secret API key (sk_live_... / sk_test_...)
    #[serde(default)]
    pub secret_key: String,
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
}

fn default_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            secret_key: String::new(),
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    currency: &'a str,
    reference: &'a str,
    metadata: HashMap<&'static str, String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    id: i64,
    status: String,
    amount: i64,
}

/// Paystack implementation of [`PaymentGateway`]
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    config: PaystackConfig,
}

impl PaystackClient {
    pub fn new(config: PaystackConfig) -> WalletResult<Self> {
        if config.secret_key.is_empty() {
            return Err(WalletError::Config("Paystack secret key is not set".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WalletError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn read<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> WalletResult<Envelope<T>> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(WalletError::Gateway(format!("Paystack HTTP {}: {}", status, body)));
        }
        resp.json::<Envelope<T>>()
            .await
            .map_err(|e| WalletError::Gateway(format!("Paystack response: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(&self, request: &CheckoutRequest) -> WalletResult<PaymentSession> {
        let url = format!("{}/transaction/initialize", self.config.base_url);
        let mut metadata = HashMap::new();
        metadata.insert("wallet_id", request.wallet_id.as_uuid().to_string());
        if let Some(message) = &request.message {
            metadata.insert("message", message.clone());
        }

        let body = InitializeBody {
            email: &request.email,
            amount: request.amount_minor,
            currency: &request.currency,
            reference: &request.reference,
            metadata,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| WalletError::Gateway(e.to_string()))?;

        let envelope: Envelope<InitializeData> = Self::read(resp).await?;
        if !envelope.status {
            return Err(WalletError::Gateway(envelope.message));
        }
        let data = envelope
            .data
            .ok_or_else(|| WalletError::Gateway("Paystack returned no checkout data".to_string()))?;

        debug!(reference = %data.reference, "Paystack checkout opened");
        Ok(PaymentSession {
            reference: data.reference,
            access_code: data.access_code,
            authorization_url: data.authorization_url,
        })
    }

    async fn verify(&self, reference: &str) -> WalletResult<GatewayVerification> {
        let url = format!("{}/transaction/verify/{}", self.config.base_url, reference);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| WalletError::Gateway(e.to_string()))?;

        let envelope: Envelope<VerifyData> = Self::read(resp).await?;
        Ok(verification_from(envelope))
    }
}

fn verification_from(envelope: Envelope<VerifyData>) -> GatewayVerification {
    match envelope.data {
        Some(data) if envelope.status => GatewayVerification {
            successful: data.status == "success",
            amount_minor: data.amount,
            gateway_reference: Some(data.id.to_string()),
        },
        _ => GatewayVerification {
            successful: false,
            amount_minor: 0,
            gateway_reference: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_is_config_error() {
        assert!(matches!(
            PaystackClient::new(PaystackConfig::default()),
            Err(WalletError::Config(_))
        ));
    }

    #[test]
    fn test_verify_payload_parsing() {
        let raw = r#"{
            "status": true,
            "message": "Verification successful",
            "data": {"id": 4099260516, "status": "success", "amount": 3000, "currency": "ZAR"}
        }"#;
        let envelope: Envelope<VerifyData> = serde_json::from_str(raw).unwrap();
        let verification = verification_from(envelope);
        assert!(verification.successful);
        assert_eq!(verification.amount_minor, 3000);
        assert_eq!(verification.gateway_reference.as_deref(), Some("4099260516"));
    }

    #[test]
    fn test_abandoned_payment_is_unsuccessful() {
        let raw = r#"{
            "status": true,
            "message": "Verification successful",
            "data": {"id": 1, "status": "abandoned", "amount": 3000}
        }"#;
        let envelope: Envelope<VerifyData> = serde_json::from_str(raw).unwrap();
        assert!(!verification_from(envelope).successful);

        let missing = r#"{"status": false, "message": "Transaction reference not found", "data": null}"#;
        let envelope: Envelope<VerifyData> = serde_json::from_str(missing).unwrap();
        assert!(!verification_from(envelope).successful);
    }

    #[test]
    fn test_initialize_body_shape() {
        let mut metadata = HashMap::new();
        metadata.insert("wallet_id", "abc".to_string());
        let body = InitializeBody {
            email: "donor@example.com",
            amount: 5000,
            currency: "ZAR",
            reference: "CW_deadbeef_1700000000",
            metadata,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["amount"], 5000);
        assert_eq!(json["currency"], "ZAR");
        assert_eq!(json["metadata"]["wallet_id"], "abc");
    }
}
