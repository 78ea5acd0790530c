//! Mapping from Grand Poitiers wire records to [`ParkingRecord`]s.

use parkfind_core::{Coordinates, ParkingRecord};

use super::types::{GrandPoitiersRecord, GrandPoitiersResponse};

/// Parse a `"lat, lng"` string.
///
/// Returns `None` unless the string has exactly two comma-separated
/// components that both parse as numbers and form valid coordinates.
pub(crate) fn parse_geopoint(raw: &str) -> Option<Coordinates> {
    let mut parts = raw.split(',');
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let lng = parts.next()?.trim().parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let point = Coordinates::new(lat, lng);
    point.is_valid().then_some(point)
}

/// Convert one wire record, or `None` if it lacks an id or usable coordinates.
pub(crate) fn normalize_record(record: &GrandPoitiersRecord) -> Option<ParkingRecord> {
    let Some(id) = record.id else {
        tracing::debug!(name = ?record.name, "dropping parking without Id");
        return None;
    };

    let Some(point) = record.geopoint.as_deref().and_then(parse_geopoint) else {
        tracing::debug!(
            parking_id = id,
            geopoint = ?record.geopoint,
            "dropping parking without usable _geopoint"
        );
        return None;
    };

    Some(ParkingRecord {
        id,
        lat: point.lat,
        lng: point.lng,
        available_places: record.available_places,
        capacity: record.capacity,
        name: record.name.clone().unwrap_or_default(),
        distance_m: None,
    })
}

/// Normalize a whole response, preserving the provider's record order.
pub(crate) fn normalize_response(response: &GrandPoitiersResponse) -> Vec<ParkingRecord> {
    response
        .results
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(normalize_record)
        .collect()
}
