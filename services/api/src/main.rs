use std::time::Duration;

use anyhow::Result;
use auth::{JwtConfig, JwtService};
use booking_api::{
    AppState,
    config::{Settings, StoreBackend},
    routes,
    seed::SeedData,
};
use common::{
    Store,
    database::{DatabaseConfig, init_pool},
};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting booking API service");

    let settings = Settings::from_env()?;

    let store = match settings.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Store::Memory
        }
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            Store::Postgres(init_pool(&db_config).await?)
        }
    };

    // Check store connectivity
    if store.health_check().await {
        info!("Store connection successful");
    } else {
        anyhow::bail!("Failed to connect to store");
    }

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;
    let state = AppState::new(store.clone(), jwt_service, settings.rate_limiter_config());

    if let Some(path) = &settings.seed_file {
        info!("Provisioning from seed file {}", path.display());
        SeedData::from_file(path)?.apply(&state).await?;
    }

    let sweeper = spawn_session_sweeper(state.clone(), settings.session_sweep_interval);

    // Start the web server
    let app = routes::create_router(state);
    let address = settings.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Booking API service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down booking API service");
    sweeper.abort();
    store.close().await;

    Ok(())
}

/// Periodically drop expired sessions and stale sign-in throttle entries
fn spawn_session_sweeper(state: AppState, interval_seconds: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
        loop {
            interval.tick().await;
            let purged = state.authenticator.purge_expired_sessions().await;
            if purged > 0 {
                info!("Purged {} expired sessions", purged);
            }
            state.rate_limiter.purge_expired().await;
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
