/// Donation endpoints
use crate::{
    api::Json,
    auth::AuthContext,
    context::AppContext,
    db::models::Donation,
    donations::{DonationReceipt, NewDonation},
    error::AppResult,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};

/// Build donation routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/patients/:id/donations", post(donate))
        .route("/api/clinic/donations", get(list_clinic_donations))
}

/// Record a donation toward a patient's clinic
///
/// The response carries the clinic's external payment link, which the
/// client follows to complete the pledge.
async fn donate(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(patient_id): Path<i64>,
    Json(req): Json<NewDonation>,
) -> AppResult<Json<DonationReceipt>> {
    let donator = ctx
        .accounts
        .donator_for_account(auth.session.account_id)
        .await?;

    let receipt = ctx.donations.donate(patient_id, donator.id, req).await?;

    Ok(Json(receipt))
}

/// Donations received by the caller's clinic
async fn list_clinic_donations(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> AppResult<Json<Vec<Donation>>> {
    let clinic = ctx
        .accounts
        .clinic_for_account(auth.session.account_id)
        .await?;

    Ok(Json(ctx.donations.list_for_clinic(clinic.id).await?))
}
