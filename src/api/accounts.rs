/// Account and session endpoints
use crate::{
    account::{LoginRequest, SessionInfo, SessionResponse, SignUpRequest},
    api::Json,
    auth::AuthContext,
    context::AppContext,
    error::AppResult,
};
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};

/// Build account routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/signup", post(sign_up))
        .route("/api/login", post(login))
        .route("/api/session", get(get_session))
        .route("/api/logout", post(logout))
}

/// Sign-up endpoint
///
/// Creates the account and its role profile in one transaction, then opens
/// a session so the client lands directly on the role's landing view.
async fn sign_up(
    State(ctx): State<AppContext>,
    Json(req): Json<SignUpRequest>,
) -> AppResult<Json<SessionResponse>> {
    tracing::info!(role = %req.role, "sign_up: creating account");

    let (account, profile) = ctx.accounts.sign_up(req).await?;
    let session = ctx.accounts.create_session(account.id).await?;

    Ok(Json(SessionResponse {
        token: session.token,
        account_id: account.id,
        profile,
    }))
}

/// Login endpoint: credential verification plus role dispatch
async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let (account, session, profile) = ctx.accounts.login(&req.email, &req.password).await?;

    tracing::info!(account_id = account.id, role = %account.role, "login succeeded");

    Ok(Json(SessionResponse {
        token: session.token,
        account_id: account.id,
        profile,
    }))
}

/// Current session info endpoint
async fn get_session(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> AppResult<Json<SessionInfo>> {
    let account = ctx.accounts.get_account(auth.session.account_id).await?;
    let profile = ctx.accounts.profile_for_account(&account).await?;

    Ok(Json(SessionInfo {
        account_id: account.id,
        profile,
    }))
}

/// Logout endpoint: destroys the session row
async fn logout(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> AppResult<Json<serde_json::Value>> {
    ctx.accounts.delete_session(&auth.session.token).await?;

    Ok(Json(serde_json::json!({})))
}
