mod api;
mod middleware;

use std::sync::Arc;

use parkfind_aggregator::{
    AggregatorSettings, HaversineDistanceResolver, InMemoryProviderLocator, ParkingAggregator,
};
use parkfind_providers::{HttpSettings, ProviderClientResolver};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = parkfind_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let providers = parkfind_core::load_providers(&config.providers_path)?;
    let provider_count = providers.len();
    let clients = ProviderClientResolver::with_default_clients(&HttpSettings::from_app_config(
        &config,
    ))?;
    tracing::info!(
        env = %config.env,
        providers = provider_count,
        clients = ?clients,
        failure_policy = %config.failure_policy,
        "starting parkfind server"
    );

    let aggregator = ParkingAggregator::new(
        Arc::new(InMemoryProviderLocator::new(providers)),
        clients,
        Arc::new(HaversineDistanceResolver),
        AggregatorSettings::from_app_config(&config),
    );
    let app = build_app(AppState {
        aggregator: Arc::new(aggregator),
        provider_count,
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
