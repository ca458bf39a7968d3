/// Account management system
///
/// Handles sign-up, credential verification, role dispatch, and sessions.

mod manager;

pub use manager::AccountManager;

use crate::db::models::Role;
use serde::{Deserialize, Serialize};

/// Sign-up request
///
/// Role-specific profile fields are flattened into the same form, matching
/// the single sign-up entry point: a Clinic supplies name/address/
/// donation_link, a Donator supplies first/last name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub role: Role,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub donation_link: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Role-specific session payload
///
/// Closed tagged union: each role carries exactly the profile fields its
/// landing view is fed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum RoleProfile {
    Clinic {
        clinic_id: i64,
        name: String,
        address: String,
        donation_link: String,
    },
    Donator {
        donator_id: i64,
        first_name: String,
        last_name: String,
        account_id: i64,
    },
    Patient {
        patient_id: i64,
        account_id: i64,
    },
}

/// Session response, returned from sign-up and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub account_id: i64,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

/// Current session info, without the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub account_id: i64,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

/// Validated session resolved from a bearer token
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub token: String,
    pub account_id: i64,
    pub role: Role,
}

/// Request for a clinic registering a patient account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPatientRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

/// Partial patient profile update; empty strings keep the previous value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

/// Patient profile with the account email, for the profile view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfileResponse {
    pub patient: crate::db::models::Patient,
    pub email: String,
}
