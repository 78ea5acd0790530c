use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use parkfind_aggregator::{
    AggregatorSettings, HaversineDistanceResolver, InMemoryProviderLocator, ParkingAggregator,
};
use parkfind_core::{AppConfig, FailurePolicy, ParkingItem, ParkingRecord};
use parkfind_providers::{HttpSettings, ProviderClientResolver};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "parkfind-cli")]
#[command(about = "Query nearby parkings from the command line")]
struct Cli {
    /// Providers registry file (overrides `PARKFIND_PROVIDERS_PATH`)
    #[arg(long, global = true)]
    providers: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print parkings near a point as JSON, nearest first
    Nearby {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Fail instead of printing an empty list when no provider can answer
        #[arg(long)]
        strict: bool,
    },
    /// List the configured providers
    Providers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let mut config = parkfind_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Some(path) = cli.providers {
        config.providers_path = path;
    }

    match cli.command {
        Commands::Nearby { lat, lng, strict } => {
            if strict {
                config.failure_policy = FailurePolicy::Strict;
            }
            run_nearby(&config, lat, lng).await
        }
        Commands::Providers => run_providers(&config),
    }
}

async fn run_nearby(config: &AppConfig, lat: f64, lng: f64) -> anyhow::Result<()> {
    let providers = parkfind_core::load_providers(&config.providers_path)?;
    let clients =
        ProviderClientResolver::with_default_clients(&HttpSettings::from_app_config(config))?;
    let aggregator = ParkingAggregator::new(
        Arc::new(InMemoryProviderLocator::new(providers)),
        clients,
        Arc::new(HaversineDistanceResolver),
        AggregatorSettings::from_app_config(config),
    );

    let parkings = aggregator.find_nearby_parkings(lat, lng).await?;
    println!("{}", render_parkings(parkings)?);
    Ok(())
}

/// Pretty JSON in the same wire shape the HTTP API serves.
fn render_parkings(parkings: Vec<ParkingRecord>) -> serde_json::Result<String> {
    let items: Vec<ParkingItem> = parkings.into_iter().map(ParkingItem::from).collect();
    serde_json::to_string_pretty(&items)
}

fn run_providers(config: &AppConfig) -> anyhow::Result<()> {
    let providers = parkfind_core::load_providers(&config.providers_path)?;
    if providers.is_empty() {
        println!("No providers configured in {}.", config.providers_path.display());
        return Ok(());
    }

    println!("{:<4} {:<16} {:>10} {:>10} {:>9}  API", "ID", "NAME", "LAT", "LNG", "RANGE_KM");
    for p in &providers {
        println!(
            "{:<4} {:<16} {:>10.4} {:>10.4} {:>9.1}  {}",
            p.id,
            p.name.to_string(),
            p.center.lat,
            p.center.lng,
            p.range_km,
            p.api_url
        );
    }
    Ok(())
}
