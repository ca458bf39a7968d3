/// Medical case endpoints
///
/// Case creation and editing arrive as multipart forms because they can
/// carry an image alongside the text fields.
use crate::{
    api::Json,
    auth::AuthContext,
    cases::{CaseDraft, CaseUpdate, ClinicCase},
    context::AppContext,
    db::models::MedicalCase,
    error::{AppError, AppResult},
};
use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post, put},
    Router,
};

/// Build case routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/cases", get(list_cases))
        .route("/api/cases/pending", get(list_pending))
        .route("/api/cases/:id", put(update_case))
        .route("/api/clinic/cases", get(list_clinic_cases))
        .route("/api/patients/:id/cases", post(create_case))
}

/// Case form fields collected from a multipart body
#[derive(Debug, Default)]
struct CaseForm {
    status: Option<String>,
    blood_type: Option<String>,
    price: Option<f64>,
    type_of_limb: Option<String>,
    side: Option<String>,
    description: Option<String>,
    /// Stored filename, written to disk while the form was read
    image: Option<String>,
}

impl CaseForm {
    /// Drain a multipart body, storing the image field as it streams in
    async fn collect(ctx: &AppContext, mut multipart: Multipart) -> AppResult<Self> {
        let mut form = CaseForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read image: {}", e)))?;

                // An empty file input means "no image"
                if !data.is_empty() {
                    form.image = Some(ctx.uploads.save(&file_name, &data).await?);
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read field {}: {}", name, e)))?;

            match name.as_str() {
                "status" => form.status = Some(text),
                "blood_type" => form.blood_type = Some(text),
                "price" => {
                    if !text.is_empty() {
                        form.price = Some(text.parse().map_err(|_| {
                            AppError::Validation("Invalid price".to_string())
                        })?);
                    }
                }
                "type_of_limb" => form.type_of_limb = Some(text),
                "side" => form.side = Some(text),
                "description" => form.description = Some(text),
                _ => {} // Unknown fields are ignored
            }
        }

        Ok(form)
    }
}

/// Public feed: all cases, newest first
async fn list_cases(State(ctx): State<AppContext>) -> AppResult<Json<Vec<MedicalCase>>> {
    Ok(Json(ctx.cases.list_all().await?))
}

/// Pending cases for the donator dashboard
async fn list_pending(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
) -> AppResult<Json<Vec<MedicalCase>>> {
    Ok(Json(ctx.cases.list_pending().await?))
}

/// Cases belonging to the caller's clinic
async fn list_clinic_cases(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> AppResult<Json<Vec<ClinicCase>>> {
    let clinic = ctx
        .accounts
        .clinic_for_account(auth.session.account_id)
        .await?;

    Ok(Json(ctx.cases.list_for_clinic(clinic.id).await?))
}

/// Create a case for a patient, with an optional image
async fn create_case(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    Path(patient_id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<MedicalCase>> {
    let form = CaseForm::collect(&ctx, multipart).await?;

    let case = ctx
        .cases
        .create_case(
            patient_id,
            CaseDraft {
                blood_type: form.blood_type,
                price: form.price,
                type_of_limb: form.type_of_limb,
                side: form.side,
                description: form.description,
                image: form.image,
            },
        )
        .await?;

    Ok(Json(case))
}

/// Partial case update; empty fields and a missing image keep previous values
async fn update_case(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    Path(case_id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<MedicalCase>> {
    let form = CaseForm::collect(&ctx, multipart).await?;

    let case = ctx
        .cases
        .update_case(
            case_id,
            CaseUpdate {
                status: form.status,
                blood_type: form.blood_type,
                price: form.price,
                type_of_limb: form.type_of_limb,
                side: form.side,
                description: form.description,
                image: form.image,
            },
        )
        .await?;

    Ok(Json(case))
}
