//! Selection of the provider client for a descriptor.

use std::sync::Arc;

use parkfind_core::ProviderDescriptor;

use crate::client::{HttpSettings, ParkingProviderClient};
use crate::error::ProviderError;
use crate::grand_poitiers::GrandPoitiersClient;

/// Ordered registry of provider clients.
///
/// Resolution returns the first registered client whose
/// [`supports`](ParkingProviderClient::supports) is true. New providers are
/// added by registering another client; the resolver itself never changes.
#[derive(Clone, Default)]
pub struct ProviderClientResolver {
    clients: Vec<Arc<dyn ParkingProviderClient>>,
}

impl ProviderClientResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if an HTTP client cannot be built.
    pub fn with_default_clients(settings: &HttpSettings) -> Result<Self, ProviderError> {
        Ok(Self::new().register(Arc::new(GrandPoitiersClient::new(settings)?)))
    }

    #[must_use]
    pub fn register(mut self, client: Arc<dyn ParkingProviderClient>) -> Self {
        self.clients.push(client);
        self
    }

    #[must_use]
    pub fn resolve(&self, provider: &ProviderDescriptor) -> Option<Arc<dyn ParkingProviderClient>> {
        self.clients
            .iter()
            .find(|client| client.supports(provider))
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for ProviderClientResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.clients.iter().map(|c| c.provider_name()))
            .finish()
    }
}
