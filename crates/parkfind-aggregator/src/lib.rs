//! Nearby-parking aggregation.
//!
//! Locates the provider serving a point, fetches its inventory through the
//! matching provider client, enriches every parking with a distance from the
//! point (concurrently, tolerating per-record failures), and returns the
//! parkings sorted by distance.

pub mod distance;
pub mod error;
pub mod locator;
pub mod pipeline;

pub use distance::{DistanceError, DistanceResolver, HaversineDistanceResolver};
pub use error::AggregateError;
pub use locator::{InMemoryProviderLocator, LocatorError, ProviderLocator};
pub use pipeline::{AggregatorSettings, ParkingAggregator};
