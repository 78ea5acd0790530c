//! Distance between the query point and a parking.

use async_trait::async_trait;
use parkfind_core::Coordinates;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DistanceError {
    #[error("distance backend failed: {0}")]
    Backend(String),

    #[error("cannot compute distance between ({from_lat}, {from_lng}) and ({to_lat}, {to_lng})")]
    InvalidInput {
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    },
}

/// Computes a travel distance in meters between two points.
///
/// One call per parking; a failure affects only that parking.
#[async_trait]
pub trait DistanceResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns [`DistanceError`] if the distance cannot be computed.
    async fn distance_in_meters(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> Result<u32, DistanceError>;
}

/// Straight-line (great-circle) distance, rounded to the nearest meter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistanceResolver;

#[async_trait]
impl DistanceResolver for HaversineDistanceResolver {
    async fn distance_in_meters(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> Result<u32, DistanceError> {
        if !from.is_valid() || !to.is_valid() {
            return Err(DistanceError::InvalidInput {
                from_lat: from.lat,
                from_lng: from.lng,
                to_lat: to.lat,
                to_lng: to.lng,
            });
        }

        // At most half the Earth's circumference, well inside u32.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meters = from.haversine_meters(&to).round() as u32;
        Ok(meters)
    }
}
