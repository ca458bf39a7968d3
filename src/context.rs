/// Application context and dependency injection
use crate::{
    account::AccountManager,
    cases::CaseManager,
    config::ServerConfig,
    db,
    donations::DonationManager,
    error::AppResult,
    uploads::UploadStore,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub accounts: Arc<AccountManager>,
    pub cases: Arc<CaseManager>,
    pub donations: Arc<DonationManager>,
    pub uploads: Arc<UploadStore>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AppResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let pool = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let accounts = Arc::new(AccountManager::new(pool.clone()));
        let cases = Arc::new(CaseManager::new(pool.clone()));
        let donations = Arc::new(DonationManager::new(pool.clone()));
        let uploads = Arc::new(UploadStore::new(config.storage.uploads_directory.clone()));

        Ok(Self {
            config: Arc::new(config),
            db: pool,
            accounts,
            cases,
            donations,
            uploads,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> AppResult<()> {
        tokio::fs::create_dir_all(&config.storage.data_directory).await?;
        tokio::fs::create_dir_all(&config.storage.uploads_directory).await?;

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
