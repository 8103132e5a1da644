//! Core configuration

use std::time::Duration;

use carewallet_auth::OtpConfig;
use carewallet_ledger::LedgerConfig;
use serde::{Deserialize, Serialize};

use crate::gateway::PaystackConfig;

/// Everything the `CareWallet` facade needs besides its collaborators
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub intents: IntentConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
}

/// Payment gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// ISO currency sent to the gateway
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub paystack: PaystackConfig,
}

fn default_currency() -> String {
    "ZAR".to_string()
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            paystack: PaystackConfig::default(),
        }
    }
}

/// Pending withdrawal intents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    /// How long a pharmacy's request waits for the beneficiary's code
    #[serde(with = "humantime_serde", default = "default_intent_ttl")]
    pub ttl: Duration,
}

fn default_intent_ttl() -> Duration {
    Duration::from_secs(15 * 60)
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            ttl: default_intent_ttl(),
        }
    }
}

/// Background expiry sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    #[serde(with = "humantime_serde", default = "default_sweep_interval")]
    pub interval: Duration,
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: default_sweep_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.payment.currency, "ZAR");
        assert_eq!(config.intents.ttl, Duration::from_secs(900));
        assert_eq!(config.otp.ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: CoreConfig =
            serde_json::from_str(r#"{"intents": {"ttl": "2m"}, "ledger": {"platform_fee_percentage": "0.05"}}"#)
                .unwrap();
        assert_eq!(config.intents.ttl, Duration::from_secs(120));
        assert_eq!(config.ledger.platform_fee_percentage.to_string(), "0.05");
        assert_eq!(config.sweeper.interval, Duration::from_secs(300));
    }
}
