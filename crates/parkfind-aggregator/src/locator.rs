//! Lookup of the provider serving a coordinate.

use std::sync::Arc;

use async_trait::async_trait;
use parkfind_core::{Coordinates, ProviderDescriptor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocatorError {
    /// The backing store could not be queried.
    #[error("provider store unavailable: {0}")]
    Backend(String),
}

/// Resolves the provider whose service area covers a point.
///
/// `Ok(None)` means no provider covers the point; `Err` is reserved for
/// failures of the lookup itself.
#[async_trait]
pub trait ProviderLocator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`LocatorError`] if the provider store cannot be queried.
    async fn nearest_provider(
        &self,
        point: Coordinates,
    ) -> Result<Option<ProviderDescriptor>, LocatorError>;
}

/// Locator over a fixed, in-memory provider list loaded at startup.
///
/// Candidates are filtered by bounding box first, then by great-circle
/// distance to the center against the provider radius. Among covering
/// providers the one with the nearest center wins.
#[derive(Debug, Clone)]
pub struct InMemoryProviderLocator {
    providers: Arc<[ProviderDescriptor]>,
}

impl InMemoryProviderLocator {
    #[must_use]
    pub fn new(providers: Vec<ProviderDescriptor>) -> Self {
        Self {
            providers: providers.into(),
        }
    }

    #[must_use]
    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    fn nearest_covering(&self, point: &Coordinates) -> Option<&ProviderDescriptor> {
        self.providers
            .iter()
            .filter(|p| p.covers(point))
            .min_by(|a, b| {
                a.center
                    .haversine_meters(point)
                    .total_cmp(&b.center.haversine_meters(point))
            })
    }
}

#[async_trait]
impl ProviderLocator for InMemoryProviderLocator {
    async fn nearest_provider(
        &self,
        point: Coordinates,
    ) -> Result<Option<ProviderDescriptor>, LocatorError> {
        Ok(self.nearest_covering(&point).cloned())
    }
}
