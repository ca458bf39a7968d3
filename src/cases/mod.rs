/// Medical case management
///
/// Cases are created by a clinic on behalf of a patient, start out pending,
/// and are mutated only through partial updates. They are never deleted.

use crate::{
    db::models::MedicalCase,
    error::{AppError, AppResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// New case submitted by a clinic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseDraft {
    pub blood_type: Option<String>,
    pub price: Option<f64>,
    pub type_of_limb: Option<String>,
    pub side: Option<String>,
    pub description: Option<String>,
    /// Stored filename of the uploaded image, if any
    pub image: Option<String>,
}

/// Partial case update; absent fields keep their previous value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseUpdate {
    pub status: Option<String>,
    pub blood_type: Option<String>,
    pub price: Option<f64>,
    pub type_of_limb: Option<String>,
    pub side: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Case joined with the patient it belongs to, for the clinic view
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ClinicCase {
    pub id: i64,
    pub patient_id: i64,
    pub status: String,
    pub blood_type: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub type_of_limb: Option<String>,
    pub side: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
}

/// Medical case service
pub struct CaseManager {
    db: SqlitePool,
}

const CASE_COLUMNS: &str =
    "id, patient_id, status, blood_type, price, image, type_of_limb, side, description, created_at";

impl CaseManager {
    /// Create a new case manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a case for a patient; status starts as pending
    pub async fn create_case(&self, patient_id: i64, draft: CaseDraft) -> AppResult<MedicalCase> {
        // The patient must exist before a case can reference it
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patient WHERE id = ?1")
            .bind(patient_id)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::Database)?;

        if exists == 0 {
            return Err(AppError::NotFound("Patient not found".to_string()));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO medical_case
             (patient_id, status, blood_type, price, image, type_of_limb, side, description, created_at)
             VALUES (?1, 'pending', ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(patient_id)
        .bind(&draft.blood_type)
        .bind(draft.price)
        .bind(&draft.image)
        .bind(&draft.type_of_limb)
        .bind(&draft.side)
        .bind(&draft.description)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(AppError::Database)?;

        let case_id = result.last_insert_rowid();

        tracing::info!(case_id, patient_id, "medical case created");

        self.get_case(case_id).await
    }

    /// Get a case by id
    pub async fn get_case(&self, case_id: i64) -> AppResult<MedicalCase> {
        sqlx::query_as::<_, MedicalCase>(&format!(
            "SELECT {} FROM medical_case WHERE id = ?1",
            CASE_COLUMNS
        ))
        .bind(case_id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Case not found".to_string()))
    }

    /// All cases, newest first (the public home feed)
    pub async fn list_all(&self) -> AppResult<Vec<MedicalCase>> {
        let cases = sqlx::query_as::<_, MedicalCase>(&format!(
            "SELECT {} FROM medical_case ORDER BY id DESC",
            CASE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await
        .map_err(AppError::Database)?;

        Ok(cases)
    }

    /// Pending cases (the donator dashboard feed)
    pub async fn list_pending(&self) -> AppResult<Vec<MedicalCase>> {
        let cases = sqlx::query_as::<_, MedicalCase>(&format!(
            "SELECT {} FROM medical_case WHERE status = 'pending' ORDER BY id DESC",
            CASE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await
        .map_err(AppError::Database)?;

        Ok(cases)
    }

    /// Cases belonging to a clinic's patients
    pub async fn list_for_clinic(&self, clinic_id: i64) -> AppResult<Vec<ClinicCase>> {
        let cases = sqlx::query_as::<_, ClinicCase>(
            "SELECT medical_case.id, medical_case.patient_id, medical_case.status,
                    medical_case.blood_type, medical_case.price, medical_case.image,
                    medical_case.type_of_limb, medical_case.side, medical_case.description,
                    medical_case.created_at, patient.first_name, patient.last_name
             FROM medical_case
             JOIN patient ON patient.id = medical_case.patient_id
             WHERE patient.clinic_id = ?1
             ORDER BY medical_case.id DESC",
        )
        .bind(clinic_id)
        .fetch_all(&self.db)
        .await
        .map_err(AppError::Database)?;

        Ok(cases)
    }

    /// Partially update a case
    ///
    /// Absent fields keep their previous value via COALESCE; the caller is
    /// responsible for coercing empty form fields to None.
    pub async fn update_case(&self, case_id: i64, update: CaseUpdate) -> AppResult<MedicalCase> {
        // Surface NotFound for an unknown case rather than a silent no-op
        self.get_case(case_id).await?;

        sqlx::query(
            "UPDATE medical_case
             SET status = COALESCE(?1, status),
                 blood_type = COALESCE(?2, blood_type),
                 price = COALESCE(?3, price),
                 type_of_limb = COALESCE(?4, type_of_limb),
                 side = COALESCE(?5, side),
                 description = COALESCE(?6, description),
                 image = COALESCE(?7, image)
             WHERE id = ?8",
        )
        .bind(clean(update.status))
        .bind(clean(update.blood_type))
        .bind(update.price)
        .bind(clean(update.type_of_limb))
        .bind(clean(update.side))
        .bind(clean(update.description))
        .bind(update.image)
        .bind(case_id)
        .execute(&self.db)
        .await
        .map_err(AppError::Database)?;

        self.get_case(case_id).await
    }
}

/// Treat empty form fields as absent
fn clean(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountManager, RegisterPatientRequest, SignUpRequest};
    use crate::db::models::Role;

    async fn setup() -> (CaseManager, i64) {
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

        (CaseManager::new(db), patient.id)
    }

    #[tokio::test]
    async fn test_create_case_starts_pending() {
        let (manager, patient_id) = setup().await;

        let case = manager
            .create_case(
                patient_id,
                CaseDraft {
                    blood_type: Some("O+".to_string()),
                    price: Some(1200.0),
                    type_of_limb: Some("leg".to_string()),
                    side: Some("left".to_string()),
                    description: Some("below-knee".to_string()),
                    image: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(case.status, "pending");
        assert_eq!(case.patient_id, patient_id);
        assert_eq!(case.blood_type.as_deref(), Some("O+"));
    }

    #[tokio::test]
    async fn test_create_case_unknown_patient() {
        let (manager, _) = setup().await;

        let result = manager.create_case(999, CaseDraft::default()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_case_empty_fields_keep_values() {
        let (manager, patient_id) = setup().await;
        let case = manager
            .create_case(
                patient_id,
                CaseDraft {
                    blood_type: Some("O+".to_string()),
                    price: Some(1200.0),
                    type_of_limb: Some("leg".to_string()),
                    side: Some("left".to_string()),
                    description: Some("below-knee".to_string()),
                    image: Some("x.png".to_string()),
                },
            )
            .await
            .unwrap();

        let updated = manager
            .update_case(
                case.id,
                CaseUpdate {
                    status: Some(String::new()),
                    blood_type: Some(String::new()),
                    price: None,
                    type_of_limb: Some(String::new()),
                    side: Some(String::new()),
                    description: Some(String::new()),
                    image: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, case.status);
        assert_eq!(updated.blood_type, case.blood_type);
        assert_eq!(updated.price, case.price);
        assert_eq!(updated.image, case.image);
    }

    #[tokio::test]
    async fn test_update_case_single_field() {
        let (manager, patient_id) = setup().await;
        let case = manager
            .create_case(
                patient_id,
                CaseDraft {
                    blood_type: Some("O+".to_string()),
                    price: Some(1200.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = manager
            .update_case(
                case.id,
                CaseUpdate {
                    status: Some("funded".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, "funded");
        assert_eq!(updated.blood_type.as_deref(), Some("O+"));
        assert_eq!(updated.price, Some(1200.0));
    }

    #[tokio::test]
    async fn test_list_pending_filters_status() {
        let (manager, patient_id) = setup().await;
        let first = manager.create_case(patient_id, CaseDraft::default()).await.unwrap();
        let second = manager.create_case(patient_id, CaseDraft::default()).await.unwrap();

        manager
            .update_case(
                second.id,
                CaseUpdate {
                    status: Some("funded".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let pending = manager.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, first.id);

        let all = manager.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        // Newest first
        assert_eq!(all[0].id, second.id);
    }

    #[tokio::test]
    async fn test_list_for_clinic_joins_patient() {
        let (manager, patient_id) = setup().await;
        manager.create_case(patient_id, CaseDraft::default()).await.unwrap();

        let cases = manager.list_for_clinic(1).await.unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].first_name, "Omar");

        let other = manager.list_for_clinic(2).await.unwrap();
        assert!(other.is_empty());
    }
}
