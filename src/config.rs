/// Configuration management for the Rahma server
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
    /// Maximum accepted size for a case image upload, in bytes
    pub upload_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub uploads_directory: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("RAHMA_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("RAHMA_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid port number".to_string()))?;

        let version = env::var("RAHMA_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let upload_limit = env::var("RAHMA_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "5242880".to_string())
            .parse()
            .unwrap_or(5242880);

        let data_directory: PathBuf = env::var("RAHMA_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("RAHMA_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("rahma.sqlite"));
        let uploads_directory = env::var("RAHMA_UPLOADS_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("uploads"));

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
                upload_limit,
            },
            storage: StorageConfig {
                data_directory,
                database,
                uploads_directory,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.service.upload_limit == 0 {
            return Err(AppError::Validation(
                "Upload limit must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
