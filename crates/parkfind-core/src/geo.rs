//! Coordinates and the small amount of spherical geometry the service needs.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` when both components are finite and inside the
    /// latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to `other` in meters (haversine formula).
    #[must_use]
    pub fn haversine_meters(&self, other: &Coordinates) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

/// Axis-aligned lat/lng box used as a cheap prefilter before the exact
/// radius check.
///
/// When the area crosses the antimeridian, `min_lng` is below -180 or
/// `max_lng` above 180; [`contains`](Self::contains) accounts for the wrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Smallest box enclosing the spherical cap of `range_km` around `center`,
    /// measured on the same sphere as [`Coordinates::haversine_meters`].
    ///
    /// A cap that reaches a pole spans every longitude.
    #[must_use]
    pub fn around(center: Coordinates, range_km: f64) -> Self {
        // Angular radius of the cap.
        let r = range_km * 1000.0 / EARTH_RADIUS_M;
        let d_lat = r.to_degrees();
        let min_lat = center.lat - d_lat;
        let max_lat = center.lat + d_lat;

        let lng_ratio = r.sin() / center.lat.to_radians().cos();
        if max_lat >= 90.0 || min_lat <= -90.0 || !(0.0..1.0).contains(&lng_ratio) {
            return Self {
                min_lat: min_lat.max(-90.0),
                min_lng: -180.0,
                max_lat: max_lat.min(90.0),
                max_lng: 180.0,
            };
        }

        // Widest longitude reached by the cap (tangent meridians), padded by
        // a hair so points on the boundary survive rounding.
        let d_lng = lng_ratio.asin().to_degrees() + 1e-9;
        Self {
            min_lat,
            min_lng: center.lng - d_lng,
            max_lat,
            max_lng: center.lng + d_lng,
        }
    }

    #[must_use]
    pub fn contains(&self, point: &Coordinates) -> bool {
        if !(self.min_lat..=self.max_lat).contains(&point.lat) {
            return false;
        }
        let lng_range = self.min_lng..=self.max_lng;
        lng_range.contains(&point.lng)
            || lng_range.contains(&(point.lng + 360.0))
            || lng_range.contains(&(point.lng - 360.0))
    }
}
