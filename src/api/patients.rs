/// Patient registration and profile endpoints
use crate::{
    account::{PatientProfileResponse, PatientProfileUpdate, RegisterPatientRequest},
    api::Json,
    auth::AuthContext,
    context::AppContext,
    db::models::Patient,
    error::AppResult,
};
use axum::{
    extract::State,
    routing::{get, post, put},
    Router,
};

/// Build patient routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/patients", post(register_patient))
        .route("/api/patients/profile", get(get_profile))
        .route("/api/patients/profile", put(update_profile))
}

/// A clinic registers one of its patients
///
/// The caller's clinic row is resolved from the session; callers with no
/// clinic profile get NotFound.
async fn register_patient(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<RegisterPatientRequest>,
) -> AppResult<Json<Patient>> {
    let clinic = ctx
        .accounts
        .clinic_for_account(auth.session.account_id)
        .await?;

    let patient = ctx.accounts.register_patient(clinic.id, req).await?;

    Ok(Json(patient))
}

/// Patient's own profile, with the account email
async fn get_profile(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> AppResult<Json<PatientProfileResponse>> {
    let profile = ctx.accounts.patient_profile(auth.session.account_id).await?;

    Ok(Json(profile))
}

/// Partial profile update; empty-string fields keep previous values
async fn update_profile(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(update): Json<PatientProfileUpdate>,
) -> AppResult<Json<Patient>> {
    let patient = ctx
        .accounts
        .update_patient_profile(auth.session.account_id, update)
        .await?;

    Ok(Json(patient))
}
