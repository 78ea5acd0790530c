//! Provider clients: fetch a parking provider's live inventory and normalize
//! it into [`ParkingRecord`](parkfind_core::ParkingRecord)s.
//!
//! Each data source implements [`ParkingProviderClient`]. The
//! [`ProviderClientResolver`] picks the client for a given
//! [`ProviderDescriptor`](parkfind_core::ProviderDescriptor).

pub mod client;
pub mod error;
pub mod grand_poitiers;
pub mod resolver;

mod fetch;
mod retry;

pub use client::{HttpSettings, ParkingProviderClient};
pub use error::ProviderError;
pub use grand_poitiers::GrandPoitiersClient;
pub use resolver::ProviderClientResolver;
