//! Shared domain types and configuration for parkfind.

pub mod app_config;
pub mod config;
pub mod geo;
pub mod parking;
pub mod providers;

pub use app_config::{AppConfig, Environment, FailurePolicy};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use geo::{BoundingBox, Coordinates};
pub use parking::{ParkingItem, ParkingRecord};
pub use providers::{
    load_providers, ProviderConfig, ProviderDescriptor, ProviderName, ProvidersFile,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read providers file {path}: {source}")]
    ProvidersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse providers file: {0}")]
    ProvidersFileParse(#[from] serde_yaml::Error),

    #[error("invalid provider configuration: {0}")]
    Validation(String),
}
