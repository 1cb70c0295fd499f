//! Lead portal binary entry point.

use lead_portal::{handlers, PortalConfig, PortalState};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_portal=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting lead-portal");

    // Load configuration
    let config = PortalConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", *e);
        PortalConfig::default()
    });
    let addr = config.bind_address();
    let sweep_interval = config.forms.ttl().max(Duration::from_secs(1));

    let state = PortalState::hosted(config)?;

    // Sweep abandoned form instances
    let registries = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let evicted =
                registries.login_forms.evict_expired() + registries.signup_forms.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, "Expired form instances removed");
            }
        }
    });

    let app = handlers::router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
