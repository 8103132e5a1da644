//! Wallet access rules

use carewallet_types::{CallerIdentity, Wallet};

use crate::{AuthError, AuthResult};

/// Decides who may view or move money out of a wallet
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessController;

impl AccessController {
    pub fn new() -> Self {
        Self
    }

    /// Creator or beneficiary
    pub fn can_access(&self, wallet: &Wallet, caller: &CallerIdentity) -> bool {
        wallet.creator_id == caller.id || wallet.beneficiary_id == Some(caller.id)
    }

    pub fn require(&self, wallet: &Wallet, caller: &CallerIdentity) -> AuthResult<()> {
        if self.can_access(wallet, caller) {
            Ok(())
        } else {
            Err(AuthError::AccessDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carewallet_types::{UserId, WalletId, WalletStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn wallet(creator: UserId, beneficiary: Option<UserId>) -> Wallet {
        Wallet {
            id: WalletId::new(),
            creator_id: creator,
            beneficiary_id: beneficiary,
            name: "Insulin".to_string(),
            description: None,
            photo_url: None,
            balance: Decimal::ZERO,
            funding_goal: Decimal::ZERO,
            shareable_code: "QWERTY23".to_string(),
            status: WalletStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_creator_and_beneficiary_allowed() {
        let creator = UserId::new();
        let beneficiary = UserId::new();
        let w = wallet(creator, Some(beneficiary));
        let access = AccessController::new();

        assert!(access.can_access(&w, &CallerIdentity::new(creator, "c@x.io")));
        assert!(access.can_access(&w, &CallerIdentity::new(beneficiary, "b@x.io")));
    }

    #[test]
    fn test_stranger_denied() {
        let w = wallet(UserId::new(), None);
        let stranger = CallerIdentity::new(UserId::new(), "s@x.io");

        assert!(!AccessController::new().can_access(&w, &stranger));
        assert!(matches!(
            AccessController::new().require(&w, &stranger),
            Err(AuthError::AccessDenied)
        ));
    }
}
