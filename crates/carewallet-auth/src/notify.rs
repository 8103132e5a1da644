//! One-time code delivery

use async_trait::async_trait;
use carewallet_types::OtpPurpose;
use tracing::info;

use crate::AuthResult;

/// Delivers a freshly issued code to its subject (email, SMS, ...)
#[async_trait]
pub trait CodeNotifier: Send + Sync {
    async fn deliver(&self, email: &str, purpose: OtpPurpose, code: &str) -> AuthResult<()>;
}

/// Notifier that only records that a code went out. The code itself is
/// never written to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl CodeNotifier for LogNotifier {
    async fn deliver(&self, email: &str, purpose: OtpPurpose, _code: &str) -> AuthResult<()> {
        info!(email = %email, purpose = %purpose, "One-time code ready for delivery");
        Ok(())
    }
}
