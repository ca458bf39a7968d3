/// Account manager implementation using runtime queries
///
/// Uses sqlx runtime query building instead of compile-time macros to avoid
/// needing DATABASE_URL during compilation.

use crate::{
    account::{
        PatientProfileResponse, PatientProfileUpdate, RegisterPatientRequest, RoleProfile,
        SignUpRequest, ValidatedSession,
    },
    db::models::{Account, Clinic, Donator, Patient, Role, Session},
    error::{AppError, AppResult},
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create an account with its role profile row
    ///
    /// Account and profile are inserted inside one transaction so a failure
    /// between the two cannot leave an orphaned account.
    pub async fn sign_up(&self, req: SignUpRequest) -> AppResult<(Account, RoleProfile)> {
        self.validate_email(&req.email)?;
        self.validate_password(&req.password)?;

        if self.email_exists(&req.email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let now = Utc::now();
        let mut tx = self.db.begin().await.map_err(AppError::Database)?;

        let result = sqlx::query(
            "INSERT INTO account (email, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&req.email)
        .bind(&password_hash)
        .bind(req.role)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        let account_id = result.last_insert_rowid();

        let profile = match req.role {
            Role::Clinic => {
                let name = required(req.name, "name")?;
                let address = required(req.address, "address")?;
                let donation_link = required(req.donation_link, "donation_link")?;

                let result = sqlx::query(
                    "INSERT INTO clinic (account_id, name, address, donation_link) VALUES (?1, ?2, ?3, ?4)",
                )
                .bind(account_id)
                .bind(&name)
                .bind(&address)
                .bind(&donation_link)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;

                RoleProfile::Clinic {
                    clinic_id: result.last_insert_rowid(),
                    name,
                    address,
                    donation_link,
                }
            }
            Role::Donator => {
                let first_name = required(req.first_name, "first_name")?;
                let last_name = required(req.last_name, "last_name")?;

                let result = sqlx::query(
                    "INSERT INTO donator (account_id, first_name, last_name) VALUES (?1, ?2, ?3)",
                )
                .bind(account_id)
                .bind(&first_name)
                .bind(&last_name)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;

                RoleProfile::Donator {
                    donator_id: result.last_insert_rowid(),
                    first_name,
                    last_name,
                    account_id,
                }
            }
            Role::Patient => {
                // Patients are created by their clinic, not through sign-up.
                return Err(AppError::Validation(
                    "Patient accounts are registered by a clinic".to_string(),
                ));
            }
        };

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(account_id, role = %req.role, "account created");

        Ok((
            Account {
                id: account_id,
                email: req.email,
                password_hash,
                role: req.role,
                created_at: now,
            },
            profile,
        ))
    }

    /// Register a patient account on behalf of a clinic
    ///
    /// Same transaction boundary as sign-up: account and patient row commit
    /// together or not at all.
    pub async fn register_patient(
        &self,
        clinic_id: i64,
        req: RegisterPatientRequest,
    ) -> AppResult<Patient> {
        self.validate_email(&req.email)?;
        self.validate_password(&req.password)?;

        if self.email_exists(&req.email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let now = Utc::now();
        let mut tx = self.db.begin().await.map_err(AppError::Database)?;

        let result = sqlx::query(
            "INSERT INTO account (email, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&req.email)
        .bind(&password_hash)
        .bind(Role::Patient)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        let account_id = result.last_insert_rowid();

        let result = sqlx::query(
            "INSERT INTO patient (account_id, first_name, last_name, phone, age, gender, clinic_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(account_id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.phone)
        .bind(req.age)
        .bind(&req.gender)
        .bind(clinic_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let patient_id = result.last_insert_rowid();

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(patient_id, clinic_id, "patient registered");

        Ok(Patient {
            id: patient_id,
            account_id,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            age: req.age,
            gender: req.gender,
            clinic_id,
        })
    }

    /// Verify credentials and resolve the account
    ///
    /// NotFound for an unknown email, Authentication for a bad password.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<Account> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, role, created_at FROM account WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        let valid = bcrypt::verify(password, &account.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        Ok(account)
    }

    /// Authenticate and create a session
    ///
    /// Dispatches on the account role to load the matching profile row; the
    /// session payload carries exactly that role's fields.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<(Account, Session, RoleProfile)> {
        let account = self.verify_credentials(email, password).await?;
        let profile = self.profile_for_account(&account).await?;
        let session = self.create_session(account.id).await?;

        Ok((account, session, profile))
    }

    /// Load the role profile for a verified account
    pub async fn profile_for_account(&self, account: &Account) -> AppResult<RoleProfile> {
        match account.role {
            Role::Clinic => {
                let clinic = self.clinic_for_account(account.id).await?;
                Ok(RoleProfile::Clinic {
                    clinic_id: clinic.id,
                    name: clinic.name,
                    address: clinic.address,
                    donation_link: clinic.donation_link,
                })
            }
            Role::Donator => {
                let donator = self.donator_for_account(account.id).await?;
                Ok(RoleProfile::Donator {
                    donator_id: donator.id,
                    first_name: donator.first_name,
                    last_name: donator.last_name,
                    account_id: account.id,
                })
            }
            Role::Patient => {
                let patient = self.patient_for_account(account.id).await?;
                Ok(RoleProfile::Patient {
                    patient_id: patient.id,
                    account_id: account.id,
                })
            }
        }
    }

    /// Create a session keyed by an opaque token
    pub async fn create_session(&self, account_id: i64) -> AppResult<Session> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query("INSERT INTO session (token, account_id, created_at) VALUES (?1, ?2, ?3)")
            .bind(&token)
            .bind(account_id)
            .bind(now)
            .execute(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(Session {
            token,
            account_id,
            created_at: now,
        })
    }

    /// Resolve a bearer token to its session and backing account
    ///
    /// A session is valid only while its account still exists; there is no
    /// expiry check because sessions have no timeout transition.
    pub async fn validate_token(&self, token: &str) -> AppResult<ValidatedSession> {
        let row = sqlx::query_as::<_, (String, i64, Role)>(
            "SELECT session.token, account.id, account.role
             FROM session JOIN account ON account.id = session.account_id
             WHERE session.token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::Authentication("Invalid session".to_string()))?;

        Ok(ValidatedSession {
            token: row.0,
            account_id: row.1,
            role: row.2,
        })
    }

    /// Delete a session (logout)
    pub async fn delete_session(&self, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM session WHERE token = ?1")
            .bind(token)
            .execute(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Get account by id
    pub async fn get_account(&self, account_id: i64) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, role, created_at FROM account WHERE id = ?1",
        )
        .bind(account_id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    /// Get the clinic profile backing an account
    pub async fn clinic_for_account(&self, account_id: i64) -> AppResult<Clinic> {
        sqlx::query_as::<_, Clinic>(
            "SELECT id, account_id, name, address, donation_link FROM clinic WHERE account_id = ?1",
        )
        .bind(account_id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Clinic profile not found".to_string()))
    }

    /// Get the donator profile backing an account
    pub async fn donator_for_account(&self, account_id: i64) -> AppResult<Donator> {
        sqlx::query_as::<_, Donator>(
            "SELECT id, account_id, first_name, last_name FROM donator WHERE account_id = ?1",
        )
        .bind(account_id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Donator profile not found".to_string()))
    }

    /// Get the patient profile backing an account
    pub async fn patient_for_account(&self, account_id: i64) -> AppResult<Patient> {
        sqlx::query_as::<_, Patient>(
            "SELECT id, account_id, first_name, last_name, phone, age, gender, clinic_id
             FROM patient WHERE account_id = ?1",
        )
        .bind(account_id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Patient profile not found".to_string()))
    }

    /// Patient profile view: the patient row plus the account email
    pub async fn patient_profile(&self, account_id: i64) -> AppResult<PatientProfileResponse> {
        let patient = self.patient_for_account(account_id).await?;
        let account = self.get_account(account_id).await?;

        Ok(PatientProfileResponse {
            patient,
            email: account.email,
        })
    }

    /// Partially update a patient profile
    ///
    /// Empty-string fields are coerced to "keep previous value" via COALESCE,
    /// matching the edit form contract.
    pub async fn update_patient_profile(
        &self,
        account_id: i64,
        update: PatientProfileUpdate,
    ) -> AppResult<Patient> {
        let patient = self.patient_for_account(account_id).await?;

        sqlx::query(
            "UPDATE patient
             SET first_name = COALESCE(?1, first_name),
                 last_name = COALESCE(?2, last_name),
                 phone = COALESCE(?3, phone),
                 age = COALESCE(?4, age),
                 gender = COALESCE(?5, gender)
             WHERE id = ?6",
        )
        .bind(clean(update.first_name))
        .bind(clean(update.last_name))
        .bind(clean(update.phone))
        .bind(update.age)
        .bind(clean(update.gender))
        .bind(patient.id)
        .execute(&self.db)
        .await
        .map_err(AppError::Database)?;

        self.patient_for_account(account_id).await
    }

    /// Check if email exists
    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(count > 0)
    }

    /// Validate email format
    fn validate_email(&self, email: &str) -> AppResult<()> {
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }

        Ok(())
    }

    /// Validate password
    fn validate_password(&self, password: &str) -> AppResult<()> {
        if password.is_empty() {
            return Err(AppError::Validation("Password cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Treat missing or empty fields as absent
fn clean(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Require a profile field at sign-up
fn required(value: Option<String>, field: &str) -> AppResult<String> {
    clean(value).ok_or_else(|| AppError::Validation(format!("Missing field: {}", field)))
}

/// Surface unique-constraint violations on account inserts as conflicts
///
/// The email precheck runs outside the insert transaction, so a concurrent
/// sign-up can still trip the UNIQUE constraint on account.email.
fn map_insert_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            AppError::Conflict("Email already registered".to_string())
        }
        _ => AppError::Database(e),
    }
}
