use std::sync::Arc;

use dotenv::dotenv;
use pms_core::config::AppConfig;
use pms_core::db;
use pms_core::handlers::{create_router, AppState};
use pms_core::store::PgStore;
use pms_core::workspace::Workspace;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting project ledger server...");

    let config = AppConfig::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::migrate(&pool).await?;
    info!("Database connection pool established");

    let store = Arc::new(PgStore::new(pool));
    let workspace = Workspace::start(store, config.super_admin_emails.clone()).await;
    if let Some(e) = workspace.sync_error().await {
        tracing::warn!("Starting with a sync error: {}", e);
    }

    let address = config.bind_address();
    let app = create_router(AppState {
        workspace: workspace.clone(),
        config: Arc::new(config),
    });

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", address, e))?;

    info!("Server listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, shutting down gracefully...");
            }
        })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    workspace.shutdown();
    info!("Server stopped");

    Ok(())
}
