use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, Coordinates};
use crate::ConfigError;

/// Every parking data source the service knows how to talk to.
///
/// A closed set: adding a provider means adding a variant here and
/// registering a client for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderName {
    GrandPoitiers,
}

impl std::fmt::Display for ProviderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderName::GrandPoitiers => write!(f, "grand_poitiers"),
        }
    }
}

/// One entry of `providers.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: i64,
    pub name: ProviderName,
    pub api_url: String,
    pub lat: f64,
    pub lng: f64,
    pub range_km: f64,
}

#[derive(Debug, Deserialize)]
pub struct ProvidersFile {
    pub providers: Vec<ProviderConfig>,
}

/// A parking data source together with the area it serves.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDescriptor {
    pub id: i64,
    pub name: ProviderName,
    /// Endpoint returning the provider's raw parking inventory.
    pub api_url: String,
    /// Center of the service area.
    pub center: Coordinates,
    /// Radius of the service area in kilometers.
    pub range_km: f64,
    /// Precomputed box around the service area.
    pub bounding_box: BoundingBox,
}

impl ProviderDescriptor {
    #[must_use]
    pub fn new(
        id: i64,
        name: ProviderName,
        api_url: impl Into<String>,
        center: Coordinates,
        range_km: f64,
    ) -> Self {
        Self {
            id,
            name,
            api_url: api_url.into(),
            center,
            range_km,
            bounding_box: BoundingBox::around(center, range_km),
        }
    }

    /// Returns `true` when `point` lies inside the service area.
    #[must_use]
    pub fn covers(&self, point: &Coordinates) -> bool {
        self.bounding_box.contains(point)
            && self.center.haversine_meters(point) <= self.range_km * 1000.0
    }
}

impl From<&ProviderConfig> for ProviderDescriptor {
    fn from(cfg: &ProviderConfig) -> Self {
        Self::new(
            cfg.id,
            cfg.name,
            cfg.api_url.clone(),
            Coordinates::new(cfg.lat, cfg.lng),
            cfg.range_km,
        )
    }
}

/// Load and validate the provider registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_providers(path: &Path) -> Result<Vec<ProviderDescriptor>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProvidersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let providers_file: ProvidersFile = serde_yaml::from_str(&content)?;

    validate_providers(&providers_file)?;

    Ok(providers_file
        .providers
        .iter()
        .map(ProviderDescriptor::from)
        .collect())
}

fn validate_providers(providers_file: &ProvidersFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_ids = HashSet::new();

    for provider in &providers_file.providers {
        let url = provider.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "provider '{}' has invalid api_url '{}'; must be an http(s) URL",
                provider.name, provider.api_url
            )));
        }

        if !Coordinates::new(provider.lat, provider.lng).is_valid() {
            return Err(ConfigError::Validation(format!(
                "provider '{}' has invalid center ({}, {})",
                provider.name, provider.lat, provider.lng
            )));
        }

        if !provider.range_km.is_finite() || provider.range_km <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "provider '{}' has invalid range_km {}; must be positive",
                provider.name, provider.range_km
            )));
        }

        if !seen_names.insert(provider.name) {
            return Err(ConfigError::Validation(format!(
                "duplicate provider name: '{}'",
                provider.name
            )));
        }

        if !seen_ids.insert(provider.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate provider id: {} (from provider '{}')",
                provider.id, provider.name
            )));
        }
    }

    Ok(())
}
