//! One-time codes
//!
//! The latest unused code per (email, purpose) is the only one that counts;
//! issuing a new one silently supersedes the older ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{string_enum, CodeId};

/// What a code authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Withdrawal,
    EmailVerify,
    PasswordReset,
}

string_enum!(OtpPurpose {
    Withdrawal => "withdrawal",
    EmailVerify => "email_verify",
    PasswordReset => "password_reset",
});

/// A stored code. `code_hash` is the hex SHA-256 of the code, never the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeCode {
    pub id: CodeId,
    pub email: String,
    pub purpose: OtpPurpose,
    #[serde(skip_serializing)]
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl OneTimeCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOneTimeCode {
    pub email: String,
    pub purpose: OtpPurpose,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}
