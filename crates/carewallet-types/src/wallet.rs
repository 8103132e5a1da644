//! Care wallets
//!
//! A wallet is created by a user, funded by anyone holding its shareable code,
//! and drawn down only through a partner pharmacy.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{string_enum, UserId, WalletId};

/// Alphabet for shareable codes (no I, O, 0 or 1 to avoid misreading)
pub const SHAREABLE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a shareable code
pub const SHAREABLE_CODE_LENGTH: usize = 8;

/// Wallet lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    Active,
    Inactive,
    Closed,
}

string_enum!(WalletStatus {
    Active => "active",
    Inactive => "inactive",
    Closed => "closed",
});

/// A custodial care wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub creator_id: UserId,
    pub beneficiary_id: Option<UserId>,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    /// Never negative; only the ledger moves it
    pub balance: Decimal,
    /// Informational target, not enforced
    pub funding_goal: Decimal,
    pub shareable_code: String,
    pub status: WalletStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Whether deposits and withdrawals may target this wallet
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }

    /// Only an empty wallet may be deleted
    pub fn can_be_deleted(&self) -> bool {
        self.balance.is_zero()
    }

    /// Contributor-facing view, without owner identities
    pub fn public_view(&self) -> PublicWallet {
        PublicWallet {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            photo_url: self.photo_url.clone(),
            balance: self.balance,
            funding_goal: self.funding_goal,
            shareable_code: self.shareable_code.clone(),
        }
    }
}

/// What a contributor sees when looking a wallet up by its shareable code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicWallet {
    pub id: WalletId,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub balance: Decimal,
    pub funding_goal: Decimal,
    pub shareable_code: String,
}

/// Insert payload for a new wallet (balance always starts at zero)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWallet {
    pub creator_id: UserId,
    pub beneficiary_id: Option<UserId>,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub funding_goal: Decimal,
    pub shareable_code: String,
}

/// Administrative edit of descriptive fields. `None` leaves a field as is.
///
/// Balances are not editable here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletDetails {
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub funding_goal: Option<Decimal>,
    pub status: Option<WalletStatus>,
}

impl WalletDetails {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.photo_url.is_none()
            && self.funding_goal.is_none()
            && self.status.is_none()
    }

    /// Apply the edit to a wallet value
    pub fn apply_to(&self, wallet: &mut Wallet) {
        if let Some(name) = &self.name {
            wallet.name = name.clone();
        }
        if let Some(description) = &self.description {
            wallet.description = Some(description.clone());
        }
        if let Some(photo_url) = &self.photo_url {
            wallet.photo_url = Some(photo_url.clone());
        }
        if let Some(goal) = self.funding_goal {
            wallet.funding_goal = goal;
        }
        if let Some(status) = self.status {
            wallet.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn wallet() -> Wallet {
        Wallet {
            id: WalletId::new(),
            creator_id: UserId::new(),
            beneficiary_id: None,
            name: "Gran's meds".to_string(),
            description: None,
            photo_url: None,
            balance: dec!(12.50),
            funding_goal: dec!(500),
            shareable_code: "ABCD2345".to_string(),
            status: WalletStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_text() {
        assert_eq!(WalletStatus::Closed.as_str(), "closed");
        assert_eq!("inactive".parse::<WalletStatus>().unwrap(), WalletStatus::Inactive);
        assert!("frozen".parse::<WalletStatus>().is_err());
    }

    #[test]
    fn test_details_never_touch_balance() {
        let mut w = wallet();
        let edit = WalletDetails {
            name: Some("Renamed".to_string()),
            funding_goal: Some(dec!(750)),
            status: Some(WalletStatus::Inactive),
            ..Default::default()
        };
        edit.apply_to(&mut w);
        assert_eq!(w.name, "Renamed");
        assert_eq!(w.funding_goal, dec!(750));
        assert_eq!(w.status, WalletStatus::Inactive);
        assert_eq!(w.balance, dec!(12.50));
    }

    #[test]
    fn test_delete_guard() {
        let mut w = wallet();
        assert!(!w.can_be_deleted());
        w.balance = Decimal::ZERO;
        assert!(w.can_be_deleted());
    }
}
