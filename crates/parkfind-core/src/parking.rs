use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// One parking facility, normalized from whatever format its provider uses.
///
/// `distance_m` stays `None` until the aggregation pipeline assigns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingRecord {
    /// Provider-local identifier; unique within one provider's result set only.
    pub id: i64,
    pub lat: f64,
    pub lng: f64,
    /// Free places right now; `None` when the provider does not report it.
    pub available_places: Option<i32>,
    /// Total places; `None` when the provider does not report it.
    pub capacity: Option<i32>,
    pub name: String,
    /// Travel distance from the query point, in meters.
    pub distance_m: Option<u32>,
}

impl ParkingRecord {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    #[must_use]
    pub fn with_distance(mut self, distance_m: u32) -> Self {
        self.distance_m = Some(distance_m);
        self
    }
}

/// Public wire shape of a parking, shared by every outward-facing surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingItem {
    pub id: i64,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "availablePlaces")]
    pub available_places: Option<i32>,
    pub capacity: Option<i32>,
    pub distance_m: Option<u32>,
    pub name: String,
}

impl From<ParkingRecord> for ParkingItem {
    fn from(record: ParkingRecord) -> Self {
        Self {
            id: record.id,
            lat: record.lat,
            lng: record.lng,
            available_places: record.available_places,
            capacity: record.capacity,
            distance_m: record.distance_m,
            name: record.name,
        }
    }
}
