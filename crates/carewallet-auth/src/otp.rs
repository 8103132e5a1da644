//! One-time code service
//!
//! Codes are numeric, drawn from the OS CSPRNG and stored only as a
//! SHA-256 hex digest. Only the newest unused code for an (email, purpose)
//! pair is ever checked, so issuing a new code supersedes older ones.
//! Consumption is a conditional `used = false -> true` update: of several
//! concurrent verifiers exactly one succeeds.

use std::sync::Arc;

use carewallet_db::Store;
use carewallet_types::{NewOneTimeCode, OtpPurpose};
use chrono::Utc;
use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::OtpConfig;
use crate::error::{AuthError, AuthResult};
use crate::notify::CodeNotifier;

/// Why a verification succeeded or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    /// No unused code, a malformed code, or a mismatch
    Rejected,
    Expired,
    /// Matched, but a concurrent verifier consumed it first
    AlreadyUsed,
}

impl VerifyOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Map a failed outcome onto its error
    pub fn into_result(self) -> AuthResult<()> {
        match self {
            Self::Verified => Ok(()),
            Self::Rejected => Err(AuthError::InvalidOtp),
            Self::Expired => Err(AuthError::OtpExpired),
            Self::AlreadyUsed => Err(AuthError::OtpAlreadyUsed),
        }
    }
}

/// Issues and verifies single-use codes
#[derive(Clone)]
pub struct OneTimeCodeAuthorizer {
    store: Arc<dyn Store>,
    notifier: Arc<dyn CodeNotifier>,
    config: OtpConfig,
}

impl OneTimeCodeAuthorizer {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn CodeNotifier>, config: OtpConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Issue a fresh code and hand it to the notifier.
    ///
    /// The code is never returned. A delivery failure is logged; the code
    /// stays valid and the caller can ask for another.
    pub async fn issue(&self, email: &str, purpose: OtpPurpose) -> AuthResult<()> {
        let email = normalize_email(email);
        let ttl = chrono::Duration::from_std(self.config.ttl)
            .map_err(|e| AuthError::Config(format!("OTP ttl out of range: {}", e)))?;
        let code = generate_code(self.config.code_length);

        let stored = self
            .store
            .insert_code(NewOneTimeCode {
                email: email.clone(),
                purpose,
                code_hash: hash_code(&code),
                expires_at: Utc::now() + ttl,
            })
            .await?;

        if let Err(e) = self.notifier.deliver(&email, purpose, &code).await {
            warn!(email = %email, purpose = %purpose, error = %e, "One-time code delivery failed");
        }

        info!(code_id = %stored.id, purpose = %purpose, "One-time code issued");
        Ok(())
    }

    /// True exactly once per issued code
    pub async fn verify(&self, email: &str, purpose: OtpPurpose, code: &str) -> AuthResult<bool> {
        Ok(self.verify_outcome(email, purpose, code).await?.is_verified())
    }

    /// Verify and consume, reporting why a code was refused
    pub async fn verify_outcome(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> AuthResult<VerifyOutcome> {
        if !is_well_formed(code, self.config.code_length) {
            debug!(purpose = %purpose, "One-time code rejected: malformed");
            return Ok(VerifyOutcome::Rejected);
        }

        let email = normalize_email(email);
        let Some(stored) = self.store.latest_unused_code(&email, purpose).await? else {
            debug!(purpose = %purpose, "One-time code rejected: none outstanding");
            return Ok(VerifyOutcome::Rejected);
        };

        if stored.is_expired(Utc::now()) {
            debug!(code_id = %stored.id, "One-time code rejected: expired");
            return Ok(VerifyOutcome::Expired);
        }

        if !constant_time_compare(&hash_code(code), &stored.code_hash) {
            debug!(code_id = %stored.id, "One-time code rejected: mismatch");
            return Ok(VerifyOutcome::Rejected);
        }

        if !self.store.consume_code(stored.id).await? {
            debug!(code_id = %stored.id, "One-time code rejected: consumed concurrently");
            return Ok(VerifyOutcome::AlreadyUsed);
        }

        Ok(VerifyOutcome::Verified)
    }
}

/// Trimmed, lower-cased subject
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_code(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn is_well_formed(code: &str, length: usize) -> bool {
    code.len() == length && code.bytes().all(|b| b.is_ascii_digit())
}

fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Constant-time string comparison
fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    if a.len() != b.len() {
        return false;
    }

    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use carewallet_db::MemoryStore;
    use std::sync::Mutex;

    /// Keeps the last code handed out so tests can play the user
    #[derive(Default)]
    struct Capture {
        last: Mutex<Option<String>>,
    }

    impl Capture {
        fn last(&self) -> String {
            self.last.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl CodeNotifier for Capture {
        async fn deliver(&self, _email: &str, _purpose: OtpPurpose, code: &str) -> AuthResult<()> {
            *self.last.lock().unwrap() = Some(code.to_string());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl CodeNotifier for Failing {
        async fn deliver(&self, _email: &str, _purpose: OtpPurpose, _code: &str) -> AuthResult<()> {
            Err(AuthError::Delivery("smtp down".to_string()))
        }
    }

    fn setup() -> (OneTimeCodeAuthorizer, Arc<Capture>, MemoryStore) {
        let store = MemoryStore::new();
        let capture = Arc::new(Capture::default());
        let authorizer = OneTimeCodeAuthorizer::new(
            Arc::new(store.clone()),
            capture.clone(),
            OtpConfig::default(),
        );
        (authorizer, capture, store)
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code(6);
            assert!(is_well_formed(&code, 6), "bad code {}", code);
        }
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = hash_code("123456");
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, "123456");
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[tokio::test]
    async fn test_code_verifies_once() {
        let (otp, capture, _) = setup();
        otp.issue("nurse@clinic.co.za", OtpPurpose::Withdrawal).await.unwrap();
        let code = capture.last();

        assert!(otp.verify("nurse@clinic.co.za", OtpPurpose::Withdrawal, &code).await.unwrap());
        assert!(!otp.verify("nurse@clinic.co.za", OtpPurpose::Withdrawal, &code).await.unwrap());
    }

    #[tokio::test]
    async fn test_email_is_normalized() {
        let (otp, capture, _) = setup();
        otp.issue("  Nurse@Clinic.co.za ", OtpPurpose::Withdrawal).await.unwrap();
        let code = capture.last();

        assert!(otp.verify("nurse@clinic.co.za", OtpPurpose::Withdrawal, &code).await.unwrap());
    }

    #[tokio::test]
    async fn test_purpose_is_part_of_the_key() {
        let (otp, capture, _) = setup();
        otp.issue("a@b.co", OtpPurpose::EmailVerify).await.unwrap();
        let code = capture.last();

        assert!(!otp.verify("a@b.co", OtpPurpose::Withdrawal, &code).await.unwrap());
        assert!(otp.verify("a@b.co", OtpPurpose::EmailVerify, &code).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let (otp, capture, store) = setup();
        otp.issue("a@b.co", OtpPurpose::Withdrawal).await.unwrap();
        let code = capture.last();
        store
            .set_code_expiry("a@b.co", Utc::now() - chrono::Duration::seconds(1))
            .await;

        let outcome = otp.verify_outcome("a@b.co", OtpPurpose::Withdrawal, &code).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Expired);
        assert!(matches!(outcome.into_result(), Err(AuthError::OtpExpired)));
    }

    #[tokio::test]
    async fn test_new_code_supersedes_old() {
        let (otp, capture, _) = setup();
        otp.issue("a@b.co", OtpPurpose::Withdrawal).await.unwrap();
        let first = capture.last();
        otp.issue("a@b.co", OtpPurpose::Withdrawal).await.unwrap();
        let second = capture.last();

        if first != second {
            assert!(!otp.verify("a@b.co", OtpPurpose::Withdrawal, &first).await.unwrap());
        }
        assert!(otp.verify("a@b.co", OtpPurpose::Withdrawal, &second).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_code_never_hits_storage() {
        let (otp, _, store) = setup();
        for bad in ["", "12345", "1234567", "12a456", "١٢٣٤٥٦"] {
            let outcome = otp.verify_outcome("a@b.co", OtpPurpose::Withdrawal, bad).await.unwrap();
            assert_eq!(outcome, VerifyOutcome::Rejected);
        }
        assert_eq!(store.code_count().await, 0);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_not_fatal() {
        let store = MemoryStore::new();
        let otp = OneTimeCodeAuthorizer::new(
            Arc::new(store.clone()),
            Arc::new(Failing),
            OtpConfig::default(),
        );

        otp.issue("a@b.co", OtpPurpose::PasswordReset).await.unwrap();
        assert_eq!(store.code_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_verify_has_one_winner() {
        let (otp, capture, _) = setup();
        otp.issue("a@b.co", OtpPurpose::Withdrawal).await.unwrap();
        let code = capture.last();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let otp = otp.clone();
            let code = code.clone();
            handles.push(tokio::spawn(async move {
                otp.verify("a@b.co", OtpPurpose::Withdrawal, &code).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
