//! Authorization configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main authorization configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// One-time code configuration
    #[serde(default)]
    pub otp: OtpConfig,
}

/// One-time code configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    /// How long an issued code stays valid
    #[serde(with = "humantime_serde", default = "default_ttl")]
    pub ttl: Duration,
    /// Number of digits per code
    #[serde(default = "default_code_length")]
    pub code_length: usize,
}

fn default_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_code_length() -> usize {
    6
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            code_length: default_code_length(),
        }
    }
}
