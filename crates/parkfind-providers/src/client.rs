//! The capability every parking data source implements.

use std::time::Duration;

use async_trait::async_trait;
use parkfind_core::{AppConfig, ParkingRecord, ProviderDescriptor};
use reqwest::Client;

use crate::error::ProviderError;

/// Fetches one provider's live inventory and normalizes it.
///
/// Implementations are registered with a
/// [`ProviderClientResolver`](crate::ProviderClientResolver); they must be
/// cheap to share across concurrent requests.
#[async_trait]
pub trait ParkingProviderClient: Send + Sync {
    /// Short identifier used in logs (e.g. `"grand_poitiers"`).
    fn provider_name(&self) -> &'static str;

    /// Returns `true` if this client understands `provider`'s wire format.
    fn supports(&self, provider: &ProviderDescriptor) -> bool;

    /// Downloads `provider`'s current inventory from its endpoint and maps
    /// each native record to a [`ParkingRecord`].
    ///
    /// Records without usable coordinates are dropped. An empty body or a
    /// missing result list yields an empty `Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport failure, non-2xx status, or a
    /// body that cannot be decoded.
    async fn fetch_parkings(
        &self,
        provider: &ProviderDescriptor,
    ) -> Result<Vec<ParkingRecord>, ProviderError>;
}

/// Outbound HTTP settings shared by the provider clients.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for transient errors.
    pub max_retries: u32,
    /// Base delay for exponential back-off between retries.
    pub backoff_base_ms: u64,
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.provider_timeout_secs,
            user_agent: config.provider_user_agent.clone(),
            max_retries: config.provider_max_retries,
            backoff_base_ms: config.provider_retry_backoff_ms,
        }
    }

    /// Builds a `reqwest::Client` with the configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the client cannot be constructed
    /// (e.g. invalid TLS config).
    pub fn build_client(&self) -> Result<Client, ProviderError> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.timeout_secs.min(10)))
            .user_agent(self.user_agent.as_str())
            .build()?)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "parkfind/0.1 (parking-aggregator)".to_string(),
            max_retries: 2,
            backoff_base_ms: 250,
        }
    }
}
