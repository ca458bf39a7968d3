/// Database row models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role
///
/// A closed set; unknown role strings are rejected at the request boundary
/// and cannot reach the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Role {
    Clinic,
    Donator,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Clinic => "Clinic",
            Role::Donator => "Donator",
            Role::Patient => "Patient",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Clinic profile row, 1:1 with an Account
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Clinic {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub address: String,
    pub donation_link: String,
}

/// Donator profile row, 1:1 with an Account
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Donator {
    pub id: i64,
    pub account_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Patient profile row, 1:1 with an Account, owned by a Clinic
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub account_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub clinic_id: i64,
}

/// Fundraising case tied to a Patient
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MedicalCase {
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
}

/// Donation record, immutable after insert
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Donation {
    pub id: i64,
    pub price: f64,
    pub country: String,
    pub payment_method: String,
    pub clinic_id: i64,
    pub donator_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Session record, keyed by opaque token
///
/// Created at login, destroyed at logout. No expiry column: the session
/// state machine has no timeout transition.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub account_id: i64,
    pub created_at: DateTime<Utc>,
}
