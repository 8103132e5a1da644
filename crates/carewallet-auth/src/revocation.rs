//! Revoked access tokens

use std::sync::Arc;

use carewallet_db::Store;
use carewallet_types::UserId;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{AuthError, AuthResult};

/// Token blacklist keyed by token id (`jti`). Entries are kept until the
/// token would have expired anyway; the expiry sweeper removes them after.
#[derive(Clone)]
pub struct TokenRevocation {
    store: Arc<dyn Store>,
}

impl TokenRevocation {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Revoke a token (logout)
    pub async fn revoke(&self, jti: &str, user: UserId, expires_at: DateTime<Utc>) -> AuthResult<()> {
        self.store.blacklist_token(jti, user, expires_at).await?;
        info!(user_id = %user, "Access token revoked");
        Ok(())
    }

    pub async fn is_revoked(&self, jti: &str) -> AuthResult<bool> {
        Ok(self.store.is_token_blacklisted(jti).await?)
    }

    /// Fail with `TokenRevoked` if the token is blacklisted
    pub async fn ensure_active(&self, jti: &str) -> AuthResult<()> {
        if self.is_revoked(jti).await? {
            return Err(AuthError::TokenRevoked);
        }
        Ok(())
    }
}
