/// Rahma - donation and medical case management server
///
/// Serves the account, medical case, and donation operations behind the
/// Rahma donation platform: clinics register patients and publish cases,
/// donators pledge toward them.

mod account;
mod api;
mod auth;
mod cases;
mod config;
mod context;
mod db;
mod donations;
mod error;
mod server;
mod uploads;

use config::ServerConfig;
use context::AppContext;
use error::AppResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rahma=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
