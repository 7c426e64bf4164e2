/// Main application entry point
use astro_planner::config::AppConfig;
use astro_planner::handlers::AppState;
use astro_planner::repo::{CalculationCache, EquipmentRepo};
use astro_planner::routes::build_router;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");

    // Load equipment inventory
    let equipment = match &config.equipment_file {
        Some(path) => {
            let repo = EquipmentRepo::from_file(path)?;
            info!("Equipment inventory loaded from {}", path.display());
            repo
        }
        None => {
            info!("No EQUIPMENT_FILE set, starting with an empty inventory");
            EquipmentRepo::empty()
        }
    };

    // Initialize application state
    let state = AppState::new(&config, equipment);

    // Start background tasks
    start_background_tasks(&config, state.cache.clone());

    // Build router
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("astro_planner listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Start the periodic cache cleanup task
fn start_background_tasks(config: &AppConfig, cache: Arc<CalculationCache>) {
    let interval = config.cache_cleanup_seconds;
    tokio::spawn(async move {
        info!("Starting cache cleanup task (interval: {}s)", interval);
        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            let evicted = cache.cleanup_expired();
            debug!("Cache cleanup evicted {} entries, {} remain", evicted, cache.len());
        }
    });
}
