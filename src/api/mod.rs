/// API routes and handlers
pub mod accounts;
pub mod cases;
pub mod donations;
pub mod patients;

use crate::{context::AppContext, error::AppError};
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
    Router,
};
use serde::{de::DeserializeOwned, Serialize};

/// JSON extractor backed by the shared error type
///
/// Malformed request bodies are validation failures (400), including a
/// sign-up body carrying an unrecognized role. axum's built-in rejection
/// would answer 422 instead.
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        Ok(Json(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(accounts::routes())
        .merge(patients::routes())
        .merge(cases::routes())
        .merge(donations::routes())
}
