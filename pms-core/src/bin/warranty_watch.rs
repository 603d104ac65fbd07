use std::sync::Arc;

use dotenv::dotenv;
use pms_core::config::AppConfig;
use pms_core::db;
use pms_core::store::PgStore;
use pms_core::workspace::Workspace;
use tokio::signal;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Warranty watch entry point.
///
/// Follows the project and user collections and logs warranty notices each
/// time either one changes. Nothing runs on a timer: a quiet store produces
/// no output after the first pass.
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

    info!("Starting warranty watch...");

    let config = AppConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;

    let workspace = Workspace::start(Arc::new(PgStore::new(pool)), config.super_admin_emails).await;
    let mut revisions = workspace.revisions();

    loop {
        let status = workspace.status().await;
        match status.error {
            Some(e) => warn!("Sync error: {}", e),
            None => info!(
                "{} projects watched, {} active warranty notices",
                status.projects,
                workspace.notices().await.len()
            ),
        }

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down gracefully...");
                break;
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    workspace.shutdown();
    info!("Warranty watch stopped");
    Ok(())
}
