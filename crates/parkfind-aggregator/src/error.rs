use parkfind_core::ProviderName;
use parkfind_providers::ProviderError;
use thiserror::Error;

use crate::locator::LocatorError;

/// Request-level failures of the aggregation pipeline.
///
/// Per-record distance failures never appear here; those records are
/// dropped instead.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("provider lookup failed: {0}")]
    Locator(#[from] LocatorError),

    #[error("no parking provider covers ({lat}, {lng})")]
    NoProvider { lat: f64, lng: f64 },

    #[error("no client registered for provider {provider}")]
    NoClient { provider: ProviderName },

    #[error("fetching parkings from {provider} failed: {source}")]
    Fetch {
        provider: ProviderName,
        #[source]
        source: ProviderError,
    },
}
