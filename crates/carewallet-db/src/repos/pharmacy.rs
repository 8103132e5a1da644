//! Pharmacy repository

use carewallet_types::NewPharmacy;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::map_unique;
use crate::{DbPharmacy, DbResult};

pub struct PharmacyRepo {
    pool: PgPool,
}

impl PharmacyRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a pharmacy; it starts out pending
    pub async fn create(&self, pharmacy: &NewPharmacy) -> DbResult<DbPharmacy> {
        let row = sqlx::query_as::<_, DbPharmacy>(
            r#"
            INSERT INTO pharmacies (id, name, short_code, registration_number, address, phone, email, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(&pharmacy.name)
        .bind(&pharmacy.short_code)
        .bind(&pharmacy.registration_number)
        .bind(&pharmacy.address)
        .bind(&pharmacy.phone)
        .bind(&pharmacy.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "Pharmacy short code"))?;
        Ok(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbPharmacy>> {
        let row = sqlx::query_as::<_, DbPharmacy>("SELECT * FROM pharmacies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn set_status(&self, id: Uuid, status: &str) -> DbResult<Option<DbPharmacy>> {
        let row = sqlx::query_as::<_, DbPharmacy>(
            "UPDATE pharmacies SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *"
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
