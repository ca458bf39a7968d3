/// Donation handling
///
/// A donator pledges toward a patient's case; the donation is attributed to
/// the clinic that owns the patient and the donator is sent on to the
/// clinic's external payment link. Donations are immutable once recorded.

use crate::{
    db::models::Donation,
    error::{AppError, AppResult},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Donation submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDonation {
    pub price: f64,
    pub country: String,
    pub payment_method: String,
}

/// Result of a recorded donation: the row plus where to send the donator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationReceipt {
    pub donation: Donation,
    pub donation_link: String,
}

/// Donation service
pub struct DonationManager {
    db: SqlitePool,
}

impl DonationManager {
    /// Create a new donation manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Record a donation toward a patient's clinic
    pub async fn donate(
        &self,
        patient_id: i64,
        donator_id: i64,
        new: NewDonation,
    ) -> AppResult<DonationReceipt> {
        if new.price <= 0.0 {
            return Err(AppError::Validation(
                "Donation amount must be positive".to_string(),
            ));
        }

        // Resolve the clinic owning the patient
        let clinic_id: i64 = sqlx::query_scalar("SELECT clinic_id FROM patient WHERE id = ?1")
            .bind(patient_id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO donation (price, country, payment_method, clinic_id, donator_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(new.price)
        .bind(&new.country)
        .bind(&new.payment_method)
        .bind(clinic_id)
        .bind(donator_id)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(AppError::Database)?;

        let donation_id = result.last_insert_rowid();

        let donation_link: String =
            sqlx::query_scalar("SELECT donation_link FROM clinic WHERE id = ?1")
                .bind(clinic_id)
                .fetch_optional(&self.db)
                .await
                .map_err(AppError::Database)?
                .ok_or_else(|| AppError::NotFound("Clinic not found".to_string()))?;

        tracing::info!(donation_id, clinic_id, donator_id, "donation recorded");

        Ok(DonationReceipt {
            donation: Donation {
                id: donation_id,
                price: new.price,
                country: new.country,
                payment_method: new.payment_method,
                clinic_id,
                donator_id,
                created_at: now,
            },
            donation_link,
        })
    }

    /// Donations received by a clinic
    pub async fn list_for_clinic(&self, clinic_id: i64) -> AppResult<Vec<Donation>> {
        let donations = sqlx::query_as::<_, Donation>(
            "SELECT id, price, country, payment_method, clinic_id, donator_id, created_at
             FROM donation WHERE clinic_id = ?1 ORDER BY id DESC",
        )
        .bind(clinic_id)
        .fetch_all(&self.db)
        .await
        .map_err(AppError::Database)?;

        Ok(donations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountManager, RegisterPatientRequest, SignUpRequest};
    use crate::db::models::Role;

    async fn setup() -> (DonationManager, i64, i64) {
        let db = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&db).await.unwrap();

        let accounts = AccountManager::new(db.clone());
        accounts
            .sign_up(SignUpRequest {
                role: Role::Clinic,
                email: "c@x.com".to_string(),
                password: "password123".to_string(),
                first_name: None,
                last_name: None,
                name: Some("Hope Clinic".to_string()),
                address: Some("12 Olive St".to_string()),
                donation_link: Some("https://pay.example/hope".to_string()),
            })
            .await
            .unwrap();
        accounts
            .sign_up(SignUpRequest {
                role: Role::Donator,
                email: "d@x.com".to_string(),
                password: "password123".to_string(),
                first_name: Some("A".to_string()),
                last_name: Some("B".to_string()),
                name: None,
                address: None,
                donation_link: None,
            })
            .await
            .unwrap();
        let patient = accounts
            .register_patient(
                1,
                RegisterPatientRequest {
                    email: "p@x.com".to_string(),
                    password: "secret".to_string(),
                    first_name: "Omar".to_string(),
                    last_name: "K".to_string(),
                    phone: None,
                    age: None,
                    gender: None,
                },
            )
            .await
            .unwrap();

        (DonationManager::new(db), patient.id, 1)
    }

    #[tokio::test]
    async fn test_donate_resolves_clinic_and_link() {
        let (manager, patient_id, donator_id) = setup().await;

        let receipt = manager
            .donate(
                patient_id,
                donator_id,
                NewDonation {
                    price: 50.0,
                    country: "TN".to_string(),
                    payment_method: "visa".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(receipt.donation.clinic_id, 1);
        assert_eq!(receipt.donation_link, "https://pay.example/hope");

        let listed = manager.list_for_clinic(1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].price, 50.0);
    }

    #[tokio::test]
    async fn test_donate_unknown_patient() {
        let (manager, _, donator_id) = setup().await;

        let result = manager
            .donate(
                999,
                donator_id,
                NewDonation {
                    price: 50.0,
                    country: "TN".to_string(),
                    payment_method: "visa".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_donate_rejects_non_positive_amount() {
        let (manager, patient_id, donator_id) = setup().await;

        let result = manager
            .donate(
                patient_id,
                donator_id,
                NewDonation {
                    price: 0.0,
                    country: "TN".to_string(),
                    payment_method: "visa".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
