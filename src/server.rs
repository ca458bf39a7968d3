/// HTTP server setup and routing
use crate::{
    context::AppContext,
    error::{AppError, AppResult},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let upload_limit = ctx.config.service.upload_limit;
    let uploads_dir = ctx.config.storage.uploads_directory.clone();

    Router::new()
        // Health check endpoint (no middleware)
        .route("/health", get(health_check))
        // API routes - merge before with_state
        .merge(crate::api::routes())
        // Stored case images, served by generated filename
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        // Provide state - converts Router<AppContext> to Router<()>
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> AppResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Rahma server listening on {}", addr);
    info!("   Service URL: {}", ctx.service_url());

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        account::AccountManager,
        cases::CaseManager,
        config::{LoggingConfig, ServiceConfig, StorageConfig},
        donations::DonationManager,
        uploads::UploadStore,
    };
    use axum::body::Body;
    use axum::http::Request;
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_context(uploads_dir: std::path::PathBuf) -> AppContext {
        let db = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&db).await.unwrap();

        let config = crate::config::ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 3000,
                version: "0.1.0".to_string(),
                upload_limit: 5242880,
            },
            storage: StorageConfig {
                data_directory: uploads_dir.clone(),
                database: uploads_dir.join("test.sqlite"),
                uploads_directory: uploads_dir.clone(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        };

        AppContext {
            config: Arc::new(config),
            db: db.clone(),
            accounts: Arc::new(AccountManager::new(db.clone())),
            cases: Arc::new(CaseManager::new(db.clone())),
            donations: Arc::new(DonationManager::new(db)),
            uploads: Arc::new(UploadStore::new(uploads_dir)),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_session_guard_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_context(dir.path().to_path_buf()).await);

        // Anonymous request is redirected to login
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["redirect"], "/api/login");

        // Sign up a donator
        let signup = serde_json::json!({
            "role": "Donator",
            "email": "a@x.com",
            "password": "p",
            "first_name": "A",
            "last_name": "B",
        });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(signup.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["role"], "Donator");
        assert_eq!(body["first_name"], "A");
        let token = body["token"].as_str().unwrap().to_string();

        // The session passes the guard
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/session")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Logout destroys the session
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/logout")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // A subsequent guarded request is rejected again
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/session")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signup_unknown_role_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_context(dir.path().to_path_buf()).await);

        let signup = serde_json::json!({
            "role": "Prosthetist",
            "email": "a@x.com",
            "password": "p",
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(signup.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        // The closed role enum rejects the body before any row is written,
        // answered as a validation failure
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "InvalidRequest");
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_context(dir.path().to_path_buf()).await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
