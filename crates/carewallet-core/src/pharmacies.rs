//! Pharmacy registry

use std::sync::Arc;

use carewallet_db::Store;
use carewallet_types::{
    NewPharmacy, Pharmacy, PharmacyId, PharmacyStatus, WalletError, WalletResult,
};
use tracing::info;

#[derive(Clone)]
pub struct PharmacyRegistry {
    store: Arc<dyn Store>,
}

impl PharmacyRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Onboard a pharmacy. It cannot disburse until activated.
    pub async fn register(&self, mut pharmacy: NewPharmacy) -> WalletResult<Pharmacy> {
        pharmacy.short_code = pharmacy.short_code.trim().to_ascii_uppercase();
        let created = self.store.insert_pharmacy(pharmacy).await?;
        info!(pharmacy_id = %created.id, short_code = %created.short_code, "Pharmacy registered");
        Ok(created)
    }

    pub async fn get(&self, id: PharmacyId) -> WalletResult<Pharmacy> {
        self.store
            .find_pharmacy(id)
            .await?
            .ok_or(WalletError::PharmacyNotFound)
    }

    /// A pharmacy that may take part in a withdrawal right now
    pub async fn eligible(&self, id: PharmacyId) -> WalletResult<Pharmacy> {
        let pharmacy = self.get(id).await?;
        if !pharmacy.can_disburse() {
            return Err(WalletError::PharmacyInactive);
        }
        Ok(pharmacy)
    }

    /// Activate or deactivate. A pharmacy never returns to pending.
    pub async fn set_status(&self, id: PharmacyId, status: PharmacyStatus) -> WalletResult<Pharmacy> {
        let current = self.get(id).await?;
        if status == PharmacyStatus::Pending && current.status != PharmacyStatus::Pending {
            return Err(WalletError::PharmacyInactive);
        }

        let updated = self
            .store
            .set_pharmacy_status(id, status)
            .await?
            .ok_or(WalletError::PharmacyNotFound)?;
        info!(pharmacy_id = %id, from = %current.status, to = %status, "Pharmacy status changed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carewallet_db::MemoryStore;

    fn new_pharmacy() -> NewPharmacy {
        NewPharmacy {
            name: "Soweto Community Pharmacy".to_string(),
            short_code: " sow01 ".to_string(),
            registration_number: "P-2024-0099".to_string(),
            address: Some("12 Vilakazi St".to_string()),
            phone: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let registry = PharmacyRegistry::new(Arc::new(MemoryStore::new()));
        let pharmacy = registry.register(new_pharmacy()).await.unwrap();

        assert_eq!(pharmacy.short_code, "SOW01");
        assert_eq!(pharmacy.status, PharmacyStatus::Pending);
        assert_eq!(registry.eligible(pharmacy.id).await.unwrap_err(), WalletError::PharmacyInactive);

        registry.set_status(pharmacy.id, PharmacyStatus::Active).await.unwrap();
        assert!(registry.eligible(pharmacy.id).await.is_ok());

        registry.set_status(pharmacy.id, PharmacyStatus::Inactive).await.unwrap();
        assert_eq!(registry.eligible(pharmacy.id).await.unwrap_err(), WalletError::PharmacyInactive);

        assert_eq!(
            registry.set_status(pharmacy.id, PharmacyStatus::Pending).await.unwrap_err(),
            WalletError::PharmacyInactive
        );
    }

    #[tokio::test]
    async fn test_unknown_pharmacy() {
        let registry = PharmacyRegistry::new(Arc::new(MemoryStore::new()));
        assert_eq!(
            registry.eligible(PharmacyId::new()).await.unwrap_err(),
            WalletError::PharmacyNotFound
        );
    }

    #[tokio::test]
    async fn test_duplicate_short_code_is_storage_error() {
        let registry = PharmacyRegistry::new(Arc::new(MemoryStore::new()));
        registry.register(new_pharmacy()).await.unwrap();
        assert!(matches!(
            registry.register(new_pharmacy()).await.unwrap_err(),
            WalletError::Storage(_)
        ));
    }
}
