//! Client for the Grand Poitiers real-time parking dataset.

mod normalize;
pub mod types;

use async_trait::async_trait;
use parkfind_core::{ParkingRecord, ProviderDescriptor, ProviderName};
use reqwest::Client;

use crate::client::{HttpSettings, ParkingProviderClient};
use crate::error::ProviderError;
use crate::fetch::fetch_body;
use crate::retry::RetryPolicy;

use normalize::normalize_response;
use types::GrandPoitiersResponse;

pub struct GrandPoitiersClient {
    client: Client,
    retry: RetryPolicy,
}

impl GrandPoitiersClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(settings: &HttpSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: settings.build_client()?,
            retry: RetryPolicy::from_settings(settings),
        })
    }
}

#[async_trait]
impl ParkingProviderClient for GrandPoitiersClient {
    fn provider_name(&self) -> &'static str {
        "grand_poitiers"
    }

    fn supports(&self, provider: &ProviderDescriptor) -> bool {
        provider.name == ProviderName::GrandPoitiers
    }

    async fn fetch_parkings(
        &self,
        provider: &ProviderDescriptor,
    ) -> Result<Vec<ParkingRecord>, ProviderError> {
        let url = provider.api_url.as_str();
        let body = self
            .retry
            .run(url, || fetch_body(&self.client, url))
            .await
            .inspect_err(|e| tracing::warn!(url, error = %e, "error fetching parkings"))?;

        let response = parse_body(&body, url)?;
        let parkings = normalize_response(&response);

        tracing::debug!(
            url,
            total = ?response.total,
            received = response.results.as_ref().map_or(0, Vec::len),
            kept = parkings.len(),
            "fetched Grand Poitiers parkings"
        );

        Ok(parkings)
    }
}

/// Decode a response body; an empty body or a JSON `null` is an empty response.
fn parse_body(body: &str, url: &str) -> Result<GrandPoitiersResponse, ProviderError> {
    if body.trim().is_empty() {
        return Ok(GrandPoitiersResponse::default());
    }

    let parsed: Option<GrandPoitiersResponse> =
        serde_json::from_str(body).map_err(|e| ProviderError::Deserialize {
            context: format!("Grand Poitiers response from {url}"),
            source: e,
        })?;

    Ok(parsed.unwrap_or_default())
}
