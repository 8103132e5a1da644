//! Partner pharmacies (withdrawal agents)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{string_enum, PharmacyId};

/// Pharmacy onboarding status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PharmacyStatus {
    /// Registered, awaiting approval
    Pending,
    Active,
    Inactive,
}

string_enum!(PharmacyStatus {
    Pending => "pending",
    Active => "active",
    Inactive => "inactive",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pharmacy {
    pub id: PharmacyId,
    pub name: String,
    pub short_code: String,
    pub registration_number: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: PharmacyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pharmacy {
    /// Only active pharmacies may disburse funds
    pub fn can_disburse(&self) -> bool {
        self.status == PharmacyStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPharmacy {
    pub name: String,
    pub short_code: String,
    pub registration_number: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}
